use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};


/// Interpreter limits and presentation settings.
///
/// Missing fields fall back to [`Config::default`], so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deepest nesting of user function calls before evaluation gives up.
    pub max_call_depth: usize,
    /// Most values `io` or `to` may produce before evaluation gives up.
    pub max_range_length: usize,
    /// User functions present before the first line is evaluated, name to body.
    pub predefined: IndexMap<String, Vec<String>>,
    /// Builtins left out of the `cmds` listing.
    pub hidden_commands: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_range_length: 1_000_000,
            predefined: IndexMap::new(),
            hidden_commands: vec!["(".to_owned(), "magic8".to_owned()],
        }
    }
}

impl Config {
    pub fn from_json_str(source: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let source = std::fs::read(path)?;
        Ok(serde_json::from_slice(&source)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults() -> anyhow::Result<()> {
        let config = Config::from_json_str(r#"{ "max_call_depth": 8 }"#)?;
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.hidden_commands, Config::default().hidden_commands);
        assert_eq!(config.max_range_length, 1_000_000);
        assert!(config.predefined.is_empty());
        Ok(())
    }

    #[test]
    fn predefined_functions_keep_file_order() -> anyhow::Result<()> {
        let config = Config::from_json_str(r#"{
            "predefined": { "cube": ["dup", "dup", "x", "x"], "area": ["113.04"] }
        }"#)?;
        assert_eq!(config.predefined.keys().map(String::as_str).collect::<Vec<_>>(), vec!["cube", "area"]);
        assert_eq!(config.predefined["area"], vec!["113.04"]);
        Ok(())
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(Config::from_json_str(r#"{ "max_call_depth": "deep" }"#).is_err());
    }
}
