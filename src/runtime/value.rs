//! Conversions and predicates over runtime values
//!
//! Locals and intermediate results are plain [`serde_json::Value`]s.

use serde_json::{Number, Value};

use super::error::EvalError;

/// Human-readable type name for diagnostics
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Truthiness used by conditionals and logical operators
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text a value contributes to the output
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

/// Build a number value, keeping whole numbers integral
pub fn number(f: f64) -> Result<Value, EvalError> {
    if !f.is_finite() {
        return Err(EvalError::NonFiniteNumber);
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return Ok(Value::from(f as i64));
    }
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or(EvalError::NonFiniteNumber)
}

/// Structural equality, comparing numbers by value
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("a")), "a");
        assert_eq!(stringify(&json!(3)), "3");
        assert_eq!(stringify(&json!(2.5)), "2.5");
        assert_eq!(stringify(&json!(4.0)), "4");
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!([1, "b"])), "1,b");
        assert_eq!(stringify(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([0])));
        assert!(is_truthy(&json!(-1.5)));
    }

    #[test]
    fn test_number_normalization() {
        assert_eq!(number(6.0).unwrap(), json!(6));
        assert_eq!(number(0.5).unwrap(), json!(0.5));
        assert_eq!(number(f64::INFINITY), Err(EvalError::NonFiniteNumber));
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(!loose_eq(&json!(1), &json!("1")));
    }
}
