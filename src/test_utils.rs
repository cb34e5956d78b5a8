use std::{io::BufRead, path::{Path, PathBuf}};

use anyhow::bail;
use itertools::Itertools;
use serde::{de::{Error, Visitor}, Deserialize, Serialize};

use crate::number::parse_float;

const ERROR_KINDS: [&str; 6] = [
    "Syntax",
    "StackUnderflow",
    "UnterminatedDefinition",
    "RecursionLimit",
    "NonTerminatingReduction",
    "UndefinedFunction",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestToken {
    Number(f64), // Compared numerically, within a small tolerance
    Text(String),
}

impl TestToken {
    pub fn matches(&self, token: &str) -> bool {
        match self {
            Self::Number(expected) => {
                let actual = parse_float(token);
                (actual - expected).abs() < 1.0e-9
            },
            Self::Text(expected) => expected == token,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestEvaluationResult(Result<Vec<TestToken>, String>);

impl From<TestEvaluationResult> for Result<Vec<TestToken>, String> {
    fn from(value: TestEvaluationResult) -> Self {
        value.0
    }
}

struct TestEvaluationResultVisitor {}

impl<'de> Deserialize<'de> for TestEvaluationResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de> {

        deserializer.deserialize_map(TestEvaluationResultVisitor {})
    }
}

impl<'de> Visitor<'de> for TestEvaluationResultVisitor {
    type Value = TestEvaluationResult;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A structure containing the boolean key 'ok'. If it's okay, contains the key 'output', otherwise the key 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>, {

        if map.next_key::<String>()? != Some("ok".to_owned()) {
            return Err(A::Error::custom("First key should be 'ok'"))
        }

        let ok: bool = map.next_value()?;
        let result = if ok {
            if map.next_key::<String>()?.as_ref()
                .ok_or(A::Error::custom("Must have two keys"))? != "output"
            {
                return Err(A::Error::custom("Second ok key should be 'output'"))
            }

            let stack: Vec<TestToken> = map.next_value()?;
            TestEvaluationResult(Ok(stack))
        } else {
            if map.next_key::<String>()?.as_ref()
                .ok_or(A::Error::custom("Must have two keys"))? != "type"
            {
                return Err(A::Error::custom("Second ok key should be 'type'"))
            }

            let kind = map.next_value::<String>()?;
            if !ERROR_KINDS.contains(&kind.as_str()) {
                return Err(A::Error::custom(format!("Unrecognized error kind: {}", kind)))
            }
            TestEvaluationResult(Err(kind))
        };

        if map.next_key::<String>()?.is_some() {
            return Err(A::Error::custom("Only two keys should be present"));
        }

        Ok(result)
    }
}

fn load_input_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read(path)?;
    Ok(source.lines().collect::<Result<Vec<String>, _>>()?)
}

fn load_output_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<TestEvaluationResult>> {
    let source = std::fs::read(path)?;
    let result: Vec<TestEvaluationResult> = serde_json::from_slice(&source)?;
    Ok(result)
}

pub fn load_test_pair(testcase: usize) -> anyhow::Result<Vec<(String, TestEvaluationResult)>> {
    if !all_testcases().any(|case| case == testcase) { bail!("Testcase out of bounds"); }

    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let input = load_input_file(base_path.join("test_inputs").join(format!("{}.rpn", testcase)))?;
    let output = load_output_file(base_path.join("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() { bail!("Input and output of testcase does not match"); }
    Ok(input.into_iter().zip(output).collect_vec())
}

pub fn all_testcases() -> impl Iterator<Item = usize> {
    1..=5
}
