//! Markup compilation
//!
//! Template source is split into [`SourceLine`]s, each line is classified by
//! the [`matcher`] registry, and the [`compiler`] groups indented lines into
//! blocks and builds an [`ExpressionTree`]. [`optimize`] then folds adjacent
//! literal text.

pub mod attributes;
pub mod compiler;
pub mod doctype;
pub mod interpolation;
pub mod matcher;
mod optimizer;
pub mod source;
mod tree;

pub use attributes::{parse_attributes, AttributeMap};
pub use compiler::compile;
pub use interpolation::{split, Fragment};
pub use matcher::{classify, LineForm, LineMatch};
pub use optimizer::optimize;
pub use source::{source_lines, SourceLine};
pub use tree::{ExpressionTree, Node};
