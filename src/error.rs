// ABOUTME: Structured error types for every pipeline stage, plus an accumulator

use crate::token::Token;
use thiserror::Error;

fn at_suffix(at: &str) -> String {
    if at.is_empty() {
        String::new()
    } else {
        format!(" at {}", at)
    }
}

/// The five-variant error taxonomy from the interpreter's error model: one
/// variant per pipeline stage that can fail, plus an internal-bug catch-all.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoxError {
    #[error("[line {line}] Error: {message}")]
    Scan { line: usize, message: String },

    #[error("[line {line}] Error{}: {message}", at_suffix(.at))]
    Parse {
        line: usize,
        at: String,
        message: String,
    },

    #[error("[line {line}] Error{}: {message}", at_suffix(.at))]
    Static {
        line: usize,
        at: String,
        message: String,
    },

    #[error("[line {line}] Error{}: {message}", at_suffix(.at))]
    Runtime {
        line: usize,
        at: String,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoxError {
    pub fn scan(line: usize, message: impl Into<String>) -> Self {
        LoxError::Scan {
            line,
            message: message.into(),
        }
    }

    pub fn parse(token: &Token, message: impl Into<String>) -> Self {
        LoxError::Parse {
            line: token.line,
            at: token.error_location(),
            message: message.into(),
        }
    }

    pub fn static_err(token: &Token, message: impl Into<String>) -> Self {
        LoxError::Static {
            line: token.line,
            at: token.error_location(),
            message: message.into(),
        }
    }

    pub fn runtime(token: &Token, message: impl Into<String>) -> Self {
        LoxError::Runtime {
            line: token.line,
            at: token.error_location(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        LoxError::Internal(message.into())
    }
}

/// Accumulates errors from a single pass (scan, parse, or resolve) so a run
/// can report as many problems as possible instead of stopping at the first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ErrorList {
    errors: Vec<LoxError>,
}

impl ErrorList {
    pub fn new() -> Self {
        ErrorList::default()
    }

    pub fn push(&mut self, error: LoxError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoxError> {
        self.errors.iter()
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.errors.extend(other.errors);
    }

    pub fn into_vec(self) -> Vec<LoxError> {
        self.errors
    }
}

impl IntoIterator for ErrorList {
    type Item = LoxError;
    type IntoIter = std::vec::IntoIter<LoxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn scan_error_format() {
        let e = LoxError::scan(3, "Unexpected character.");
        assert_eq!(e.to_string(), "[line 3] Error: Unexpected character.");
    }

    #[test]
    fn parse_error_at_token() {
        let t = Token::new(TokenKind::Identifier, "foo", None, 5);
        let e = LoxError::parse(&t, "Expected ';'.");
        assert_eq!(e.to_string(), "[line 5] Error at 'foo': Expected ';'.");
    }

    #[test]
    fn parse_error_at_eof() {
        let t = Token::new(TokenKind::Eof, "", None, 9);
        let e = LoxError::parse(&t, "Expected expression.");
        assert_eq!(e.to_string(), "[line 9] Error at end: Expected expression.");
    }

    #[test]
    fn internal_error_format() {
        let e = LoxError::internal("scanner invoked past EOF");
        assert_eq!(e.to_string(), "Internal error: scanner invoked past EOF");
    }

    #[test]
    fn error_list_accumulates() {
        let mut list = ErrorList::new();
        assert!(list.is_empty());
        list.push(LoxError::scan(1, "bad"));
        list.push(LoxError::scan(2, "worse"));
        assert_eq!(list.len(), 2);
    }
}
