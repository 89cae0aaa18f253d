//! Parser for the embedded expression language
//!
//! Expressions appear inside `#{}` / `!{}` interpolations, after `=` sigils,
//! in attribute values and in `:each` / `:if` headers. Raw-code lines (`-`)
//! additionally accept statements such as `for`, `if` and `let`.

pub mod ast;
mod grammar;
pub mod lexer;

use thiserror::Error;

pub use ast::*;
pub use grammar::{parse_expr, parse_statement};

/// A syntax error in an embedded expression
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ExprError {
    pub message: String,
    /// Byte range within the expression text
    pub span: Span,
    pub expected: Vec<String>,
}

impl ExprError {
    /// Message with the expected alternatives appended, if any
    pub fn detailed(&self) -> String {
        if self.expected.is_empty() {
            self.message.clone()
        } else {
            format!("{} (expected {})", self.message, self.expected.join(", "))
        }
    }
}
