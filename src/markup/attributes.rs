//! Tag attribute blocks
//!
//! Two forms are accepted after a tag's shorthand cluster:
//!
//! ```text
//! %a{href: url, "data-id": 3}    braces: `,` separates, `:` joins
//! %a(href=url data-id=3)         parens: ` ` separates, `=` joins
//! ```
//!
//! Values are kept as expression source here and compiled once the
//! shorthand classes and ids have been merged in.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::error::CompileError;
use crate::parser::Expr;
use crate::runtime::html_escape;
use crate::runtime::value::stringify;

use super::interpolation::{has_markers, interpolate_escaped, parse_in_line};
use super::source::SourceLine;
use super::tree::Node;

/// Attributes of one tag, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    /// Attribute name to unparsed value expression
    pub attrs: IndexMap<String, String>,
    /// Inline content following the attribute block
    pub content: String,
}

/// Attribute block reached the end of the line before its closer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("attribute block is never closed")]
pub struct UnclosedBlock;

/// Byte indices of the pair being scanned
#[derive(Default)]
struct Pair {
    start: Option<usize>,
    middle: Option<usize>,
}

/// Split the text after a tag's shorthand into attributes and content.
///
/// Without a leading `{` or `(` there are no attributes and the content is
/// the text minus one leading space.
pub fn parse_attributes(rest: &str) -> Result<AttributeMap, UnclosedBlock> {
    let (open, close, joiner, separator) = match rest.chars().next() {
        Some('{') => ('{', '}', ':', ','),
        Some('(') => ('(', ')', '=', ' '),
        _ => {
            return Ok(AttributeMap {
                attrs: IndexMap::new(),
                content: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
            })
        }
    };

    let mut attrs = IndexMap::new();
    let mut depth = 1;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pair = Pair {
        start: Some(open.len_utf8()),
        middle: None,
    };

    let mut chars = rest.char_indices().skip(1);
    let end = loop {
        let Some((i, c)) = chars.next() else {
            return Err(UnclosedBlock);
        };

        if escaped {
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c == '"' || c == '\'' {
            quote = Some(c);
            continue;
        }

        if depth == 1 {
            if c == joiner && pair.middle.is_none() {
                pair.middle = Some(i);
            }
            if c == separator || c == close {
                if let (Some(start), Some(middle)) = (pair.start, pair.middle) {
                    let key = unquote(rest[start..middle].trim());
                    let value = rest[middle + joiner.len_utf8()..i].trim();
                    if !key.is_empty() {
                        attrs.insert(key.to_string(), value.to_string());
                    }
                }
                pair = Pair {
                    start: Some(i + c.len_utf8()),
                    middle: None,
                };
            }
        }

        match c {
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' if depth > 1 => depth -= 1,
            _ if c == close => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            break i + c.len_utf8();
        }
    };

    Ok(AttributeMap {
        attrs,
        content: rest[end..].to_string(),
    })
}

fn unquote(key: &str) -> &str {
    for q in ['"', '\''] {
        if key.len() >= 2 && key.starts_with(q) && key.ends_with(q) {
            return &key[1..key.len() - 1];
        }
    }
    key
}

/// Compile attribute values, merging in shorthand classes and ids
pub fn attribute_nodes(
    attrs: &IndexMap<String, String>,
    classes: &[String],
    ids: &[String],
    line: &SourceLine,
) -> Result<Vec<Node>, CompileError> {
    let mut values: IndexMap<String, Expr> = IndexMap::new();
    for (name, source) in attrs {
        values.insert(name.clone(), parse_in_line(source, line)?);
    }

    merge_shorthand(&mut values, "class", classes);
    merge_shorthand(&mut values, "id", ids);

    let mut nodes = Vec::new();
    for (name, value) in values {
        render_attribute(&mut nodes, name, value, line)?;
    }
    Ok(nodes)
}

/// Prefix `key`'s value with the shorthand names, space separated.
///
/// A constant explicit value folds into one string; anything else becomes a
/// concatenation evaluated at render time.
fn merge_shorthand(values: &mut IndexMap<String, Expr>, key: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    let shorthand = names.join(" ");
    let merged = match values.get(key) {
        None => Expr::Str(shorthand),
        Some(explicit) => match explicit.as_constant() {
            Some(constant) => {
                let explicit = stringify(&constant);
                if explicit.is_empty() {
                    Expr::Str(shorthand)
                } else {
                    Expr::Str(format!("{} {}", shorthand, explicit))
                }
            }
            None => Expr::concat(Expr::Str(format!("{} ", shorthand)), explicit.clone()),
        },
    };
    values.insert(key.to_string(), merged);
}

fn render_attribute(
    nodes: &mut Vec<Node>,
    name: String,
    value: Expr,
    line: &SourceLine,
) -> Result<(), CompileError> {
    let Some(constant) = value.as_constant() else {
        nodes.push(Node::Attribute { name, value });
        return Ok(());
    };

    match constant {
        Value::Null | Value::Bool(false) => {}
        Value::String(s) if s.is_empty() => {}
        Value::Bool(true) => nodes.push(Node::Literal(format!(" {}=\"{}\"", name, name))),
        Value::String(s) if has_markers(&s) => {
            nodes.push(Node::Literal(format!(" {}=\"", name)));
            nodes.extend(interpolate_escaped(&s, line)?);
            nodes.push(Node::literal("\""));
        }
        other => nodes.push(Node::Literal(format!(
            " {}=\"{}\"",
            name,
            html_escape(&stringify(&other))
        ))),
    }
    Ok(())
}
