//! Reusable compiled template

use serde_json::Value;

use crate::config::TemplateConfig;
use crate::error::CompileError;
use crate::markup::ExpressionTree;

use super::error::EvalError;
use super::eval::Evaluator;
use super::functions::{self, Function};
use super::locals::Locals;

/// An optimized expression tree bound to its escape function.
///
/// Rendering never mutates the template, so one instance can serve any
/// number of renders, concurrently if needed.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    tree: ExpressionTree,
    escaper: &'static Function,
}

impl CompiledTemplate {
    /// Bind a tree to the escape function named by the configuration
    pub fn new(tree: ExpressionTree, config: &TemplateConfig) -> Result<Self, CompileError> {
        let escaper = match config.custom_escape.as_deref() {
            None => functions::lookup("html_escape"),
            Some(name) => functions::lookup(name).filter(|f| f.is_unary()),
        };
        let escaper = escaper.ok_or_else(|| CompileError::UnknownEscapeFunction {
            name: config.custom_escape.clone().unwrap_or_default(),
        })?;
        Ok(Self { tree, escaper })
    }

    /// Render against `locals`, containing failures inline
    pub fn render(&self, locals: &dyn Locals) -> String {
        self.render_with_diagnostics(locals).0
    }

    /// Render and also return every failure that was contained, in order
    pub fn render_with_diagnostics(&self, locals: &dyn Locals) -> (String, Vec<EvalError>) {
        let mut evaluator = Evaluator::new(locals, self.escaper);
        let output = evaluator.render(&self.tree);
        (output, evaluator.into_errors())
    }

    /// Render a JSON object of locals
    pub fn render_json(&self, locals: &Value) -> String {
        self.render(locals)
    }

    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    pub fn escape_function(&self) -> &'static str {
        self.escaper.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Node;
    use crate::parser::Expr;
    use serde_json::json;

    fn escaped(name: &str) -> Node {
        Node::Expression {
            expr: Expr::Var(name.to_string()),
            escape: true,
        }
    }

    #[test]
    fn test_template_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledTemplate>();
    }

    #[test]
    fn test_render_is_repeatable() {
        let tree = ExpressionTree::new(vec![Node::literal("<p>"), escaped("x"), Node::literal("</p>")]);
        let template = CompiledTemplate::new(tree, &TemplateConfig::default()).unwrap();
        assert_eq!(template.render_json(&json!({"x": "<b>"})), "<p>&lt;b&gt;</p>");
        assert_eq!(template.render_json(&json!({"x": 2})), "<p>2</p>");
    }

    #[test]
    fn test_custom_escape_function() {
        let tree = ExpressionTree::new(vec![escaped("x")]);
        let config = TemplateConfig::default().with_custom_escape("upcase");
        let template = CompiledTemplate::new(tree, &config).unwrap();
        assert_eq!(template.escape_function(), "upcase");
        assert_eq!(template.render_json(&json!({"x": "abc"})), "ABC");
    }

    #[test]
    fn test_unknown_escape_function() {
        let config = TemplateConfig::default().with_custom_escape("range_of_motion");
        let err = CompiledTemplate::new(ExpressionTree::default(), &config).unwrap_err();
        assert!(matches!(err, CompileError::UnknownEscapeFunction { name } if name == "range_of_motion"));
    }

    #[test]
    fn test_diagnostics_collected_in_order() {
        let tree = ExpressionTree::new(vec![escaped("a"), Node::literal("|"), escaped("b")]);
        let template = CompiledTemplate::new(tree, &TemplateConfig::default()).unwrap();
        let (output, errors) = template.render_with_diagnostics(&json!({}));
        assert_eq!(errors, vec![EvalError::undefined("a"), EvalError::undefined("b")]);
        assert!(output.contains("|"));
        assert_eq!(output.matches("<pre class='error'>").count(), 2);
    }
}
