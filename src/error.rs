use thiserror::Error;


#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpnError {
    #[error("unrecognised input at byte {offset}")]
    Syntax { offset: usize },

    #[error("'{op}' needs {needed} value(s) but the stack holds {found}")]
    StackUnderflow { op: String, needed: usize, found: usize },

    #[error("definition of {} was never closed", .name.as_deref().unwrap_or("<unnamed>"))]
    UnterminatedDefinition { name: Option<String> },

    #[error("call depth exceeded {limit} while running '{name}'")]
    RecursionLimit { name: String, limit: usize },

    #[error("'{op}' gave up without terminating at length {length}")]
    NonTerminatingReduction { op: String, length: usize },

    #[error("function '{0}' is not defined")]
    UndefinedFunction(String),
}

impl RpnError {
    /// Stable kind name, used by the fixture files under `test_outputs/`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "Syntax",
            Self::StackUnderflow { .. } => "StackUnderflow",
            Self::UnterminatedDefinition { .. } => "UnterminatedDefinition",
            Self::RecursionLimit { .. } => "RecursionLimit",
            Self::NonTerminatingReduction { .. } => "NonTerminatingReduction",
            Self::UndefinedFunction(_) => "UndefinedFunction",
        }
    }
}
