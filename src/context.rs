use crate::{config::Config, error::RpnError, interpreter::{Evaluation, Interpreter, Stack}, parser::tokenize};


/// An interpreter together with the stack it is working on.
///
/// Each line is evaluated against the current stack. A line that fails leaves
/// the stack as it was, though definitions made earlier on that line remain.
#[derive(Debug, Default)]
pub struct Session {
    interpreter: Interpreter,
    stack: Stack,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            interpreter: Interpreter::with_config(config),
            stack: Stack::new(),
        }
    }

    pub fn run_line(&mut self, input: &str) -> Result<Evaluation, RpnError> {
        let ops = tokenize(input)?;
        let evaluation = self.interpreter.evaluate_with_messages(&ops, self.stack.clone())?;
        self.stack.clone_from(&evaluation.stack);
        Ok(evaluation)
    }

    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}
