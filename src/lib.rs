
mod builtin;
mod config;
mod context;
mod error;
mod interpreter;
mod number;
mod parser;
mod recorder;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use context::Session;
pub use error::RpnError;
pub use interpreter::{Evaluation, Interpreter, Ops, Stack, ANONYMOUS};
pub use number::{format_number, parse_float};
pub use parser::tokenize;
pub use recorder::{DEFINE_END, DEFINE_START};
