//! Built-in functions callable from embedded expressions
//!
//! The table is fixed at compile time. A template's custom escape function is
//! chosen from here by name.

use serde_json::Value;

use super::error::EvalError;
use super::value::{number, stringify, type_name};

type Body = fn(&[Value]) -> Result<Value, EvalError>;

/// A named built-in with its accepted argument count
#[derive(Clone, Copy)]
pub struct Function {
    pub name: &'static str,
    min_args: usize,
    max_args: usize,
    body: Body,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

impl Function {
    /// Invoke after checking the argument count
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        if args.len() < self.min_args || args.len() > self.max_args {
            return Err(EvalError::Arity {
                name: self.name.to_string(),
                expected: self.min_args,
                found: args.len(),
            });
        }
        (self.body)(args)
    }

    /// Whether the function can be applied to a single value
    pub fn is_unary(&self) -> bool {
        self.min_args <= 1 && self.max_args >= 1
    }
}

const FUNCTIONS: &[Function] = &[
    Function {
        name: "html_escape",
        min_args: 1,
        max_args: 1,
        body: html_escape_fn,
    },
    Function {
        name: "upcase",
        min_args: 1,
        max_args: 1,
        body: upcase,
    },
    Function {
        name: "downcase",
        min_args: 1,
        max_args: 1,
        body: downcase,
    },
    Function {
        name: "capitalize",
        min_args: 1,
        max_args: 1,
        body: capitalize,
    },
    Function {
        name: "trim",
        min_args: 1,
        max_args: 1,
        body: trim,
    },
    Function {
        name: "length",
        min_args: 1,
        max_args: 1,
        body: length,
    },
    Function {
        name: "join",
        min_args: 1,
        max_args: 2,
        body: join,
    },
    Function {
        name: "json",
        min_args: 1,
        max_args: 1,
        body: json,
    },
    Function {
        name: "keys",
        min_args: 1,
        max_args: 1,
        body: keys,
    },
    Function {
        name: "range",
        min_args: 1,
        max_args: 2,
        body: range,
    },
];

/// Find a built-in by name
pub fn lookup(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Escape text for HTML element content and double-quoted attributes
pub fn html_escape(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

fn html_escape_fn(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(html_escape(&stringify(&args[0]))))
}

fn upcase(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(stringify(&args[0]).to_uppercase()))
}

fn downcase(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(stringify(&args[0]).to_lowercase()))
}

fn capitalize(args: &[Value]) -> Result<Value, EvalError> {
    let text = stringify(&args[0]);
    let mut chars = text.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::String(capitalized))
}

fn trim(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(stringify(&args[0]).trim().to_string()))
}

fn length(args: &[Value]) -> Result<Value, EvalError> {
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => return Err(invalid("length", "a string, array or object", other)),
    };
    Ok(Value::from(len))
}

fn join(args: &[Value]) -> Result<Value, EvalError> {
    let separator = args.get(1).map(stringify).unwrap_or_else(|| ",".to_string());
    match &args[0] {
        Value::Array(items) => Ok(Value::String(
            items.iter().map(stringify).collect::<Vec<_>>().join(&separator),
        )),
        other => Err(invalid("join", "an array", other)),
    }
}

fn json(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(args[0].to_string()))
}

fn keys(args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Object(map) => Ok(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        other => Err(invalid("keys", "an object", other)),
    }
}

fn range(args: &[Value]) -> Result<Value, EvalError> {
    let bound = |value: &Value| {
        value
            .as_i64()
            .ok_or_else(|| invalid("range", "an integer", value))
    };
    let (start, end) = match args {
        [end] => (0, bound(end)?),
        [start, end] => (bound(start)?, bound(end)?),
        _ => unreachable!("arity is checked before the body runs"),
    };
    (start..end).map(|i| number(i as f64)).collect::<Result<Vec<_>, _>>().map(Value::Array)
}

fn invalid(name: &str, expected: &str, found: &Value) -> EvalError {
    EvalError::InvalidArgument {
        name: name.to_string(),
        expected: expected.to_string(),
        found: type_name(found).to_string(),
    }
}
