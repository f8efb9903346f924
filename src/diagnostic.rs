//! Shared diagnostic type returned by both the parser and the interpreter.

use serde::Serialize;
use std::fmt::{self, Display};

/// How serious a [`Diagnostic`] is. Today only [`Severity::Error`] is ever
/// produced, but the field exists so a future lexical-error producer (or a
/// host) can add warnings without changing the `evaluate` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// A single diagnostic, 0-indexed per spec.md §6.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(default)]
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Error,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}
