//! Hamlet - an indentation-sensitive markup template compiler
//!
//! This library compiles HAML-style templates into a [`CompiledTemplate`]
//! that renders HTML from a set of named locals.
//!
//! # Example
//!
//! ```rust
//! use hamlet::render;
//! use serde_json::json;
//!
//! let html = render("%p.greeting Hello #{name}!", &json!({"name": "World"})).unwrap();
//! assert_eq!(html, r#"<p class="greeting">Hello World!</p>"#);
//! ```

pub mod config;
pub mod error;
pub mod markup;
pub mod parser;
pub mod runtime;

pub use config::{ConfigError, SelfClosingPolicy, TemplateConfig};
pub use error::CompileError;
pub use markup::{compile, optimize, source_lines, ExpressionTree, Node, SourceLine};
pub use runtime::{CompiledTemplate, EmptyLocals, EvalError, Locals};

/// Compile template source into a reusable template
///
/// # Example
///
/// ```rust
/// use hamlet::{build, TemplateConfig};
/// use serde_json::json;
///
/// let template = build("%ul\n  :each item in items\n    %li= item", &TemplateConfig::default()).unwrap();
/// let html = template.render(&json!({"items": ["a", "b"]}));
/// assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
/// ```
pub fn build(source: &str, config: &TemplateConfig) -> Result<CompiledTemplate, CompileError> {
    let lines = source_lines(source);
    let mut tree = compile(&lines, config)?;
    if config.optimize {
        tree = optimize(tree);
    }
    log::debug!(
        "compiled {} line(s) into {} top-level node(s)",
        lines.len(),
        tree.nodes.len()
    );
    CompiledTemplate::new(tree, config)
}

/// Compile with the default configuration and render once
pub fn render(source: &str, locals: &dyn Locals) -> Result<String, CompileError> {
    Ok(build(source, &TemplateConfig::default())?.render(locals))
}
