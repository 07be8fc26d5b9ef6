//! Ambient Error Handling for the monk CLI
//!
//! Covers failures outside the language itself — reading a script file from
//! disk, an unreadable path given on the command line. In-language failures
//! (type mismatches, unbound identifiers, and the like) are not modeled
//! here: those are values (`Value::Error`) produced by the evaluator and
//! printed like any other result, not host exceptions.

use std::fmt;
use std::error::Error;

/// Error type for everything around the language, not in it.
#[derive(Debug, Clone)]
pub enum MonkError {
    /// Failure reading a script file or a REPL input line.
    IOError(String),
}

impl fmt::Display for MonkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MonkError::IOError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl Error for MonkError {}

impl From<std::io::Error> for MonkError {
    fn from(err: std::io::Error) -> Self {
        MonkError::IOError(err.to_string())
    }
}

/// Convenience alias for results that can fail with a `MonkError`.
pub type Result<T> = std::result::Result<T, MonkError>;
