//! `#{...}` / `!{...}` interpolation in literal text

use crate::error::{CompileError, Span};
use crate::parser::{parse_expr, Expr};
use crate::runtime::html_escape;

use super::source::SourceLine;
use super::tree::Node;

/// A piece of interpolated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Literal(String),
    /// Source of an embedded expression; `escape` is true for `#{}`
    Expression { source: String, escape: bool },
}

/// Split text at its interpolation markers, in order of appearance.
///
/// An expression runs to the first `}` after its marker. A marker with no
/// closing brace is left as literal text. Empty literals are dropped.
pub fn split(text: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut rest = text;

    while let Some((start, escape)) = find_marker(rest) {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        push_literal(&mut fragments, &rest[..start]);
        fragments.push(Fragment::Expression {
            source: rest[start + 2..start + 2 + len].to_string(),
            escape,
        });
        rest = &rest[start + 2 + len + 1..];
    }
    push_literal(&mut fragments, rest);
    fragments
}

/// Whether `text` contains at least one complete marker
pub fn has_markers(text: &str) -> bool {
    split(text)
        .iter()
        .any(|f| matches!(f, Fragment::Expression { .. }))
}

fn find_marker(text: &str) -> Option<(usize, bool)> {
    let hash = text.find("#{");
    let bang = text.find("!{");
    match (hash, bang) {
        (Some(h), Some(b)) if b < h => Some((b, false)),
        (Some(h), _) => Some((h, true)),
        (None, Some(b)) => Some((b, false)),
        (None, None) => None,
    }
}

fn push_literal(fragments: &mut Vec<Fragment>, text: &str) {
    if !text.is_empty() {
        fragments.push(Fragment::Literal(text.to_string()));
    }
}

/// Compile interpolated text to nodes
pub fn interpolate(text: &str, line: &SourceLine) -> Result<Vec<Node>, CompileError> {
    compile_fragments(text, line, |literal| literal.to_string())
}

/// Compile interpolated text whose literal parts must be HTML-escaped, as in
/// attribute values
pub fn interpolate_escaped(text: &str, line: &SourceLine) -> Result<Vec<Node>, CompileError> {
    compile_fragments(text, line, html_escape)
}

fn compile_fragments(
    text: &str,
    line: &SourceLine,
    literal: impl Fn(&str) -> String,
) -> Result<Vec<Node>, CompileError> {
    split(text)
        .into_iter()
        .map(|fragment| match fragment {
            Fragment::Literal(s) => Ok(Node::Literal(literal(&s))),
            Fragment::Expression { source, escape } => {
                let expr = parse_in_line(&source, line)?;
                Ok(Node::Expression { expr, escape })
            }
        })
        .collect()
}

/// Parse an expression written on `line`, reporting errors against it
pub fn parse_in_line(source: &str, line: &SourceLine) -> Result<Expr, CompileError> {
    parse_expr(source).map_err(|error| CompileError::Expression {
        line: line.number,
        span: relocate(&error.span, source, line),
        error,
    })
}

/// Map a span within `fragment` to a span in the template source
pub fn relocate(span: &Span, fragment: &str, line: &SourceLine) -> Span {
    match line.text.find(fragment) {
        Some(pos) if !fragment.is_empty() => {
            let base = line.offset + pos;
            let start = base + span.start.min(fragment.len());
            let end = base + span.end.min(fragment.len());
            start..end.max(start)
        }
        _ => line.span(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Fragment {
        Fragment::Literal(s.to_string())
    }

    fn code(s: &str, escape: bool) -> Fragment {
        Fragment::Expression {
            source: s.to_string(),
            escape,
        }
    }

    #[test]
    fn test_split_hello_name() {
        assert_eq!(
            split("Hello #{name}!"),
            vec![lit("Hello "), code("name", true), lit("!")]
        );
    }

    #[test]
    fn test_split_raw_and_adjacent_markers() {
        assert_eq!(
            split("!{a}#{b}"),
            vec![code("a", false), code("b", true)]
        );
    }

    #[test]
    fn test_split_without_markers() {
        assert_eq!(split("plain text"), vec![lit("plain text")]);
        assert!(split("").is_empty());
        assert!(!has_markers("a # { b"));
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        assert_eq!(split("a #{b"), vec![lit("a #{b")]);
        assert_eq!(
            split("#{x} then #{y"),
            vec![code("x", true), lit(" then #{y")]
        );
    }

    #[test]
    fn test_interpolate_escaped_literals() {
        let line = SourceLine::new(1, 0, "x");
        let nodes = interpolate_escaped("<#{v}>", &line).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::literal("&lt;"),
                Node::Expression {
                    expr: Expr::Var("v".to_string()),
                    escape: true
                },
                Node::literal("&gt;"),
            ]
        );
    }

    #[test]
    fn test_interpolate_reports_line() {
        let line = SourceLine::new(7, 40, "%p Hi #{1 +}");
        let err = interpolate("Hi #{1 +}", &line).unwrap_err();
        assert!(matches!(err, CompileError::Expression { line: 7, .. }));
        let span = err.span().unwrap();
        assert!(span.start >= 46 && span.end <= 52);
    }
}
