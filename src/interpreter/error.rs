//! Runtime errors (spec.md §7 "Runtime errors").

use crate::diagnostic::Diagnostic;
use std::fmt::{self, Display};

/// An error raised while executing a parsed program: unknown tag, a
/// reference argument to a variable that doesn't exist, an invalid `$O`
/// direction, all-false `$S`, an overlapping `merge`, or an operator with no
/// defined semantics (defensive; should be unreachable from valid ASTs).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl From<RuntimeError> for Diagnostic {
    fn from(e: RuntimeError) -> Self {
        Diagnostic::error(e.message, e.line, e.column)
    }
}

/// What a failed execution step carries upward: either a genuine error (to
/// be diagnosed and reported) or a plain `halt` (spec.md §4.3.1 — "`Halt`
/// propagates through every enclosing construct"). Modeling `Halt` as an
/// `Err` variant lets every executing function propagate it with a plain
/// `?`, the same way the teacher's own fallible methods propagate errors —
/// rather than threading a three-way `ControlFlow::Halt` through every
/// return type in the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeSignal {
    Error(RuntimeError),
    Halt,
}

impl From<RuntimeError> for RuntimeSignal {
    fn from(e: RuntimeError) -> Self {
        RuntimeSignal::Error(e)
    }
}

pub type RunResult<T> = Result<T, RuntimeSignal>;

/// Shorthand for building a [`RuntimeSignal::Error`] at a source position.
pub fn rt_err(message: impl Into<String>, position: (usize, usize)) -> RuntimeSignal {
    RuntimeSignal::Error(RuntimeError::new(message, position.0, position.1))
}
