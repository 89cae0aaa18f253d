//! Abstract Syntax Tree for embedded expressions and raw-code statements

use serde_json::Value;

/// Byte range in expression text
pub type Span = std::ops::Range<usize>;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Source spelling, used in error messages
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// An embedded expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Expr>),
    Var(String),
    /// `object.name`
    Member(Box<Expr>, String),
    /// `object[index]`
    Index(Box<Expr>, Box<Expr>),
    /// `name(args...)`, resolved against the built-in function table
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// `condition ? then : otherwise`
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Shorthand for `lhs + rhs`
    pub fn concat(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(Box::new(lhs), BinOp::Add, Box::new(rhs))
    }

    /// The value of a literal scalar, if this expression is one.
    ///
    /// Arrays and anything that touches a variable are not constants.
    pub fn as_constant(&self) -> Option<Value> {
        match self {
            Expr::Null => Some(Value::Null),
            Expr::Bool(b) => Some(Value::Bool(*b)),
            Expr::Number(n) => serde_json::Number::from_f64(*n).map(|num| {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Value::from(*n as i64)
                } else {
                    Value::Number(num)
                }
            }),
            Expr::Str(s) => Some(Value::String(s.clone())),
            _ => None,
        }
    }
}

/// A statement on a raw-code (`-`) line
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `for [key,] value in collection`
    For {
        key: Option<String>,
        value: String,
        collection: Expr,
    },
    /// `if condition`
    If(Expr),
    /// `else if condition`
    ElseIf(Expr),
    /// `else`
    Else,
    /// `let name = value` (declare = true) or `name = value`
    Assign {
        name: String,
        value: Expr,
        declare: bool,
    },
    /// Expression evaluated for its side effects only
    Expr(Expr),
}

impl Statement {
    /// Whether this statement takes the indented lines below it as a body
    pub fn opens_body(&self) -> bool {
        matches!(
            self,
            Statement::For { .. } | Statement::If(_) | Statement::ElseIf(_) | Statement::Else
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(Expr::Number(1.0).as_constant(), Some(Value::from(1)));
        assert_eq!(Expr::Number(1.5).as_constant(), Some(Value::from(1.5)));
        assert_eq!(
            Expr::Str("x".to_string()).as_constant(),
            Some(Value::String("x".to_string()))
        );
        assert_eq!(Expr::Var("x".to_string()).as_constant(), None);
        assert_eq!(Expr::Array(vec![]).as_constant(), None);
    }

    #[test]
    fn test_opens_body() {
        assert!(Statement::Else.opens_body());
        assert!(!Statement::Expr(Expr::Null).opens_body());
    }
}
