//! Render-time evaluation of compiled templates
//!
//! Values are `serde_json::Value`s. Locals are borrowed through the
//! [`Locals`] trait, and each render gets its own [`Evaluator`] so a
//! [`CompiledTemplate`] can be shared between threads.

mod error;
mod eval;
pub mod functions;
mod locals;
mod template;
pub mod value;

pub use error::EvalError;
pub use eval::{error_block, Evaluator};
pub use functions::{html_escape, Function};
pub use locals::{EmptyLocals, Locals};
pub use template::CompiledTemplate;
