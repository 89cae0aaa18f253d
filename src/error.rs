//! Error types for template compilation

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ExprError;

/// Byte range in template source
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("line {line}: malformed attribute block")]
    MalformedAttributeBlock { line: usize, span: Span },

    #[error("line {line}: indentation mixes tabs and spaces inconsistently")]
    MixedIndentation { line: usize, span: Span },

    #[error("line {line}: invalid expression: {error}")]
    Expression {
        line: usize,
        span: Span,
        error: ExprError,
    },

    #[error("line {line}: else without a preceding if")]
    DanglingElse { line: usize, span: Span },

    #[error("line {line}: unknown doctype '{keyword}'")]
    UnknownDoctype {
        line: usize,
        span: Span,
        keyword: String,
    },

    #[error("unknown escape function '{name}'")]
    UnknownEscapeFunction { name: String },
}

impl CompileError {
    /// 1-based line number of the offending line, if there is one
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::MalformedAttributeBlock { line, .. }
            | CompileError::MixedIndentation { line, .. }
            | CompileError::Expression { line, .. }
            | CompileError::DanglingElse { line, .. }
            | CompileError::UnknownDoctype { line, .. } => Some(*line),
            CompileError::UnknownEscapeFunction { .. } => None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::MalformedAttributeBlock { span, .. }
            | CompileError::MixedIndentation { span, .. }
            | CompileError::Expression { span, .. }
            | CompileError::DanglingElse { span, .. }
            | CompileError::UnknownDoctype { span, .. } => Some(span.clone()),
            CompileError::UnknownEscapeFunction { .. } => None,
        }
    }

    fn label(&self) -> String {
        match self {
            CompileError::MalformedAttributeBlock { .. } => {
                "attribute block is never closed".to_string()
            }
            CompileError::MixedIndentation { .. } => {
                "indentation does not match the enclosing block".to_string()
            }
            CompileError::Expression { error, .. } => error.detailed(),
            CompileError::DanglingElse { .. } => {
                "no :if or - if directly above at this level".to_string()
            }
            CompileError::UnknownDoctype { keyword, .. } => {
                format!("'{}' is not a known doctype", keyword)
            }
            CompileError::UnknownEscapeFunction { name } => {
                format!("'{}' is not a one-argument built-in", name)
            }
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        self.format_with(source, filename, true)
    }

    /// Like [`format`](Self::format) but without ANSI colors
    pub fn format_plain(&self, source: &str, filename: &str) -> String {
        self.format_with(source, filename, false)
    }

    fn format_with(&self, source: &str, filename: &str, color: bool) -> String {
        let Some(span) = self.span() else {
            return format!("Error: {}\n", self);
        };
        // ariadne counts characters, spans count bytes
        let to_char = |byte: usize| source[..byte.min(source.len())].chars().count();
        let span = to_char(span.start)..to_char(span.end);

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_config(Config::default().with_color(color))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.label())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("Error: {}\n", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_span() {
        let err = CompileError::DanglingElse {
            line: 3,
            span: 10..15,
        };
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.span(), Some(10..15));
        assert_eq!(err.to_string(), "line 3: else without a preceding if");

        let err = CompileError::UnknownEscapeFunction {
            name: "nope".to_string(),
        };
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_format_includes_source_context() {
        let source = "%p\n%a{href: \"x\"";
        let err = CompileError::MalformedAttributeBlock {
            line: 2,
            span: 3..15,
        };
        let report = err.format_plain(source, "page.haml");
        assert!(report.contains("malformed attribute block"));
        assert!(report.contains("page.haml"));
        assert!(report.contains("attribute block is never closed"));
    }

    #[test]
    fn test_format_without_span() {
        let err = CompileError::UnknownEscapeFunction {
            name: "nope".to_string(),
        };
        assert_eq!(err.format("", "t.haml"), "Error: unknown escape function 'nope'\n");
    }
}
