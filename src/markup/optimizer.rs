//! Literal folding

use super::tree::{ExpressionTree, Node};

/// Fold each run of adjacent literals into one and drop empty literals.
///
/// Applied at every nesting level. Never reorders nodes or merges across a
/// non-literal, so rendering is unchanged. An empty result is a single empty
/// literal.
pub fn optimize(tree: ExpressionTree) -> ExpressionTree {
    let mut nodes: Vec<Node> = Vec::with_capacity(tree.nodes.len());
    for node in tree.nodes {
        match optimize_node(node) {
            Node::Literal(s) if s.is_empty() => {}
            Node::Literal(s) => match nodes.last_mut() {
                Some(Node::Literal(prev)) => prev.push_str(&s),
                _ => nodes.push(Node::Literal(s)),
            },
            other => nodes.push(other),
        }
    }
    if nodes.is_empty() {
        return ExpressionTree::empty_literal();
    }
    ExpressionTree::new(nodes)
}

fn optimize_node(node: Node) -> Node {
    match node {
        Node::Loop {
            key,
            value,
            collection,
            body,
        } => Node::Loop {
            key,
            value,
            collection,
            body: optimize(body),
        },
        Node::Conditional {
            branches,
            otherwise,
        } => Node::Conditional {
            branches: branches
                .into_iter()
                .map(|(condition, body)| (condition, optimize(body)))
                .collect(),
            otherwise: otherwise.map(optimize),
        },
        other => other,
    }
}
