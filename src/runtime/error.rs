//! Error types for template evaluation

use thiserror::Error;

/// Failures while evaluating embedded expressions at render time.
///
/// These never abort a render: the executor replaces the failing node's
/// output with an inline error block and carries on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Identifier not bound by any scope or by the locals
    #[error("{name} is not defined")]
    UndefinedVariable { name: String },

    /// Call to a function missing from the built-in table
    #[error("{name} is not a function")]
    UnknownFunction { name: String },

    /// Built-in called with the wrong number of arguments
    #[error("{name} expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Operator applied to operands of the wrong type
    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },

    /// Built-in received an argument of the wrong type
    #[error("{name} expects {expected}, got {found}")]
    InvalidArgument {
        name: String,
        expected: String,
        found: String,
    },

    /// Loop over something that is not a collection
    #[error("cannot iterate over {found}")]
    NotIterable { found: String },

    /// Member access or indexing on an unsupported value
    #[error("cannot read {property} of {found}")]
    InvalidAccess { property: String, found: String },

    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic produced NaN or infinity
    #[error("arithmetic result is not a finite number")]
    NonFiniteNumber,
}

impl EvalError {
    pub fn undefined(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into() }
    }

    pub fn mismatch(op: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::TypeMismatch {
            op: op.into(),
            left: left.into(),
            right: right.into(),
        }
    }
}
