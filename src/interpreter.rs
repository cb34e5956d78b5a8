use core::fmt;
use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::{builtin::{builtin_table, Builtin}, config::Config, error::RpnError, parser::tokenize, recorder::{Recorder, Step}};

/// The working memory of the interpreter, top of stack last.
pub type Stack = Vec<String>;

/// A token sequence, either parsed input or a recorded function body.
pub type Ops = Vec<String>;

pub(crate) type EvaluationResult = Result<Stack, RpnError>;

/// Name of the function slot applied by `map` and `fold`.
pub const ANONYMOUS: &str = "_";

/// The stack left by an evaluation together with the messages emitted on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub stack: Stack,
    pub messages: Vec<String>,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.stack.iter().join(", "))
    }
}

/// A postfix command interpreter.
///
/// Tokens are reduced left to right against a stack. Each one is, in order of
/// priority: captured by an open definition, run as a builtin, run as a
/// recorded user function, or pushed as a literal. Unknown names are never an
/// error; they simply land on the stack.
pub struct Interpreter {
    builtins: HashMap<&'static str, Builtin>,
    functions: IndexMap<String, Ops>,
    recorder: Recorder,
    sink: Option<Box<dyn FnMut(&str)>>,
    messages: Vec<String>,
    config: Config,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("functions", &self.functions)
            .field("recorder", &self.recorder)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let functions: IndexMap<String, Ops> = config.predefined.iter()
            .map(|(name, body)| (name.to_lowercase(), body.iter().map(|op| op.to_lowercase()).collect()))
            .collect();

        Self {
            builtins: builtin_table(),
            functions,
            recorder: Recorder::Idle,
            sink: None,
            messages: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers the callback that receives messages from `cmds`, `magic8`
    /// and `help`, replacing any previous one.
    pub fn set_sink<F: FnMut(&str) + 'static>(&mut self, sink: F) {
        self.sink = Some(Box::new(sink));
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// Names of the user functions in the order they were first defined.
    /// The anonymous slot is left out.
    pub fn user_function_names(&self) -> Vec<&str> {
        self.functions.keys()
            .map(String::as_str)
            .filter(|name| *name != ANONYMOUS)
            .collect()
    }

    pub fn user_function(&self, name: &str) -> Option<&[String]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    /// Every builtin symbol, sorted.
    pub fn builtin_names(&self) -> Vec<&'static str> {
        self.builtins.keys().copied().sorted().collect()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn evaluate(&mut self, ops: &[String], stack: Stack) -> Result<Stack, RpnError> {
        self.evaluate_with_messages(ops, stack)
            .map(|evaluation| evaluation.stack)
    }

    /// Evaluates `ops` against `stack`.
    ///
    /// Side effects of tokens that ran before a failure (definitions, `store`)
    /// are kept; only the stack is discarded. A definition still open when the
    /// input runs out is abandoned and reported, so recording never carries
    /// over into the next call.
    pub fn evaluate_with_messages(&mut self, ops: &[String], stack: Stack) -> Result<Evaluation, RpnError> {
        self.messages.clear();

        let result = self.evaluate_ops(ops, stack, 0);
        let unterminated = self.recorder.finish();
        let messages = std::mem::take(&mut self.messages);

        let stack = result?;
        unterminated?;
        Ok(Evaluation { stack, messages })
    }

    pub fn evaluate_str(&mut self, input: &str, stack: Stack) -> Result<Stack, RpnError> {
        let ops = tokenize(input)?;
        self.evaluate(&ops, stack)
    }

    pub(crate) fn evaluate_ops(&mut self, ops: &[String], stack: Stack, depth: usize) -> EvaluationResult {
        ops.iter().try_fold(stack, |stack, op| self.dispatch(op, stack, depth))
    }

    fn dispatch(&mut self, op: &str, mut stack: Stack, depth: usize) -> EvaluationResult {
        trace!(op, depth, len = stack.len(), "dispatch");

        if self.recorder.is_active() {
            self.record(op);
            return Ok(stack);
        }

        if let Some(builtin) = self.builtins.get(op).copied() {
            let needed = builtin.arity();
            if stack.len() < needed {
                return Err(RpnError::StackUnderflow { op: op.to_owned(), needed, found: stack.len() });
            }
            return builtin.apply(op, self, stack, depth);
        }

        if let Some(body) = self.functions.get(op) {
            let body = body.clone();
            return self.call(op, &body, stack, depth);
        }

        stack.push(op.to_owned());
        Ok(stack)
    }

    fn record(&mut self, op: &str) {
        match self.recorder.feed(op) {
            Step::Named => {
                debug!(name = op, "recording definition");
                self.functions.insert(op.to_owned(), Vec::new());
            },
            Step::Append => {
                if let Some(body) = self.recorder.name().and_then(|name| self.functions.get_mut(name)) {
                    body.push(op.to_owned());
                }
            },
            Step::Closed(name) => {
                debug!(name = name.as_str(), body = ?self.functions.get(&name), "definition recorded");
            },
            Step::Marker | Step::Ignored => {}
        }
    }

    /// Runs a recorded body against the whole ambient stack.
    pub(crate) fn call(&mut self, name: &str, body: &[String], stack: Stack, depth: usize) -> EvaluationResult {
        if depth >= self.config.max_call_depth {
            warn!(name, limit = self.config.max_call_depth, "call depth limit reached");
            return Err(RpnError::RecursionLimit { name: name.to_owned(), limit: self.config.max_call_depth });
        }

        debug!(name, depth, "calling user function");
        self.evaluate_ops(body, stack, depth + 1)
    }

    pub(crate) fn open_definition(&mut self) {
        self.recorder.open();
    }

    pub(crate) fn define(&mut self, name: String, body: Ops) {
        debug!(name = name.as_str(), ?body, "storing function");
        self.functions.insert(name, body);
    }

    pub(crate) fn anonymous_body(&self) -> Result<Ops, RpnError> {
        self.functions.get(ANONYMOUS)
            .cloned()
            .ok_or_else(|| RpnError::UndefinedFunction(ANONYMOUS.to_owned()))
    }

    pub(crate) fn emit(&mut self, message: String) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&message);
        }
        self.messages.push(message);
    }
}
