//! Compiled expression tree
//!
//! A template compiles to an [`ExpressionTree`]: an ordered sequence of nodes
//! whose rendered outputs are concatenated. Loops and conditionals carry
//! nested trees for their bodies.

use std::fmt;

use crate::parser::Expr;

/// The compiled form of a template or of a block body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpressionTree {
    pub nodes: Vec<Node>,
}

/// One piece of compiled output
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Text emitted verbatim
    Literal(String),

    /// Expression evaluated and stringified, optionally passed through the
    /// escape function
    Expression { expr: Expr, escape: bool },

    /// Attribute whose value is only known at render time.
    ///
    /// Renders ` name="value"`, ` name="name"` for `true`, and nothing for
    /// `false` or `null`.
    Attribute { name: String, value: Expr },

    /// Iteration over a collection, rendering `body` once per element
    Loop {
        key: Option<String>,
        value: String,
        collection: Expr,
        body: ExpressionTree,
    },

    /// `if` / `else if` chain with an optional `else`
    Conditional {
        branches: Vec<(Expr, ExpressionTree)>,
        otherwise: Option<ExpressionTree>,
    },

    /// `let name = value` / `name = value` from a raw-code line
    Assign {
        name: String,
        value: Expr,
        declare: bool,
    },

    /// Expression from a raw-code line, evaluated and discarded
    Effect(Expr),
}

impl ExpressionTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// A tree rendering the empty string
    pub fn empty_literal() -> Self {
        Self {
            nodes: vec![Node::Literal(String::new())],
        }
    }

    /// True when the tree renders nothing regardless of locals
    pub fn is_blank(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| matches!(node, Node::Literal(s) if s.is_empty()))
    }

    /// True when every node is literal text
    pub fn is_literal(&self) -> bool {
        self.nodes.iter().all(|node| matches!(node, Node::Literal(_)))
    }
}

impl Node {
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(text.into())
    }
}

impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, self, 0)
    }
}

fn write_tree(f: &mut fmt::Formatter<'_>, tree: &ExpressionTree, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    for node in &tree.nodes {
        match node {
            Node::Literal(s) => writeln!(f, "{}literal {:?}", indent, s)?,
            Node::Expression { expr, escape } => {
                let kind = if *escape { "escaped" } else { "raw" };
                writeln!(f, "{}{} {:?}", indent, kind, expr)?
            }
            Node::Attribute { name, value } => {
                writeln!(f, "{}attribute {} = {:?}", indent, name, value)?
            }
            Node::Loop {
                key,
                value,
                collection,
                body,
            } => {
                match key {
                    Some(key) => writeln!(f, "{}for {}, {} in {:?}", indent, key, value, collection)?,
                    None => writeln!(f, "{}for {} in {:?}", indent, value, collection)?,
                }
                write_tree(f, body, depth + 1)?;
            }
            Node::Conditional {
                branches,
                otherwise,
            } => {
                for (i, (condition, body)) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "else if" };
                    writeln!(f, "{}{} {:?}", indent, keyword, condition)?;
                    write_tree(f, body, depth + 1)?;
                }
                if let Some(body) = otherwise {
                    writeln!(f, "{}else", indent)?;
                    write_tree(f, body, depth + 1)?;
                }
            }
            Node::Assign {
                name,
                value,
                declare,
            } => {
                let keyword = if *declare { "let " } else { "" };
                writeln!(f, "{}{}{} = {:?}", indent, keyword, name, value)?
            }
            Node::Effect(expr) => writeln!(f, "{}effect {:?}", indent, expr)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tree() {
        assert!(ExpressionTree::empty_literal().is_blank());
        assert!(ExpressionTree::default().is_blank());
        assert!(!ExpressionTree::new(vec![Node::literal("x")]).is_blank());
    }

    #[test]
    fn test_display_nested() {
        let tree = ExpressionTree::new(vec![Node::Loop {
            key: None,
            value: "item".to_string(),
            collection: Expr::Var("items".to_string()),
            body: ExpressionTree::new(vec![Node::literal("<li>")]),
        }]);
        let text = tree.to_string();
        assert!(text.starts_with("for item in Var(\"items\")\n"));
        assert!(text.contains("  literal \"<li>\""));
    }
}
