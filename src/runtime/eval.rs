//! Tree-walking evaluator for compiled templates

use std::collections::HashMap;

use serde_json::Value;

use crate::markup::{ExpressionTree, Node};
use crate::parser::{BinOp, Expr, UnaryOp};

use super::error::EvalError;
use super::functions::{self, html_escape, Function};
use super::locals::Locals;
use super::value::{is_truthy, loose_eq, number, stringify, type_name};

/// Markup substituted for a node whose evaluation failed
pub fn error_block(err: &EvalError) -> String {
    format!("\n<pre class='error'>{}</pre>\n", html_escape(&err.to_string()))
}

/// Evaluation state for a single render.
///
/// Loop iterations push a scope of their own; assignments write to the
/// innermost scope. Locals are consulted after every scope.
pub struct Evaluator<'a> {
    locals: &'a dyn Locals,
    scopes: Vec<HashMap<String, Value>>,
    escaper: &'a Function,
    errors: Vec<EvalError>,
}

impl<'a> Evaluator<'a> {
    pub fn new(locals: &'a dyn Locals, escaper: &'a Function) -> Self {
        Self {
            locals,
            scopes: vec![HashMap::new()],
            escaper,
            errors: Vec::new(),
        }
    }

    /// Render a tree, containing failures inline
    pub fn render(&mut self, tree: &ExpressionTree) -> String {
        let mut output = String::new();
        self.render_into(tree, &mut output);
        output
    }

    /// Failures captured so far, in render order
    pub fn into_errors(self) -> Vec<EvalError> {
        self.errors
    }

    fn render_into(&mut self, tree: &ExpressionTree, output: &mut String) {
        for node in &tree.nodes {
            if let Node::Literal(s) = node {
                output.push_str(s);
                continue;
            }
            // Nodes fail before writing anything, so the error block
            // replaces the node's whole contribution
            if let Err(err) = self.render_node(node, output) {
                log::debug!("contained evaluation failure: {}", err);
                output.push_str(&error_block(&err));
                self.errors.push(err);
            }
        }
    }

    fn render_node(&mut self, node: &Node, output: &mut String) -> Result<(), EvalError> {
        match node {
            Node::Literal(s) => output.push_str(s),
            Node::Expression { expr, escape } => {
                let text = stringify(&self.eval(expr)?);
                if *escape {
                    output.push_str(&self.escape(text)?);
                } else {
                    output.push_str(&text);
                }
            }
            Node::Attribute { name, value } => match self.eval(value)? {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) => {
                    output.push_str(&format!(" {}=\"{}\"", name, name));
                }
                other => {
                    let text = self.escape(stringify(&other))?;
                    output.push_str(&format!(" {}=\"{}\"", name, text));
                }
            },
            Node::Loop {
                key,
                value,
                collection,
                body,
            } => {
                let entries = self.iterate(collection)?;
                for (entry_key, entry_value) in entries {
                    self.push_scope();
                    if let Some(key) = key {
                        self.set_local(key.clone(), entry_key);
                    }
                    self.set_local(value.clone(), entry_value);
                    self.render_into(body, output);
                    self.pop_scope();
                }
            }
            Node::Conditional {
                branches,
                otherwise,
            } => {
                let mut chosen = otherwise.as_ref();
                for (condition, body) in branches {
                    if is_truthy(&self.eval(condition)?) {
                        chosen = Some(body);
                        break;
                    }
                }
                if let Some(body) = chosen {
                    self.render_into(body, output);
                }
            }
            Node::Assign {
                name,
                value,
                declare,
            } => {
                let value = self.eval(value)?;
                if *declare {
                    self.set_local(name.clone(), value);
                } else {
                    self.assign(name, value);
                }
            }
            Node::Effect(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    /// Entries visited by a loop: (index, element) for arrays and strings,
    /// (property, value) for objects
    fn iterate(&self, collection: &Expr) -> Result<Vec<(Value, Value)>, EvalError> {
        let entries = match self.eval(collection)? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i), item))
                .collect(),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Value::from(i), Value::String(c.to_string())))
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(EvalError::NotIterable {
                    found: type_name(&other).to_string(),
                })
            }
        };
        Ok(entries)
    }

    fn escape(&self, text: String) -> Result<String, EvalError> {
        self.escaper
            .call(&[Value::String(text)])
            .map(|escaped| stringify(&escaped))
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(val) = scope.get(name) {
                return Some(val.clone());
            }
        }
        self.locals.lookup(name).cloned()
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn set_local(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    /// Update the innermost binding of `name`, declaring it if none exists
    fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.set_local(name.to_string(), value);
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => number(*n),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Var(name) => self.lookup(name).ok_or_else(|| EvalError::undefined(name)),
            Expr::Member(object, property) => {
                let object = self.eval(object)?;
                member(object, property)
            }
            Expr::Index(object, index) => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                lookup_index(object, index)
            }
            Expr::Call(name, args) => self.call(name, args),
            Expr::Unary(op, operand) => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&operand))),
                    UnaryOp::Neg => match operand.as_f64() {
                        Some(n) => number(-n),
                        None => Err(EvalError::mismatch("-", "nothing", type_name(&operand))),
                    },
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                let left = self.eval(lhs)?;
                // Logical operators short-circuit and yield an operand, not a boolean
                match op {
                    BinOp::And if !is_truthy(&left) => return Ok(left),
                    BinOp::Or if is_truthy(&left) => return Ok(left),
                    BinOp::And | BinOp::Or => return self.eval(rhs),
                    _ => {}
                }
                let right = self.eval(rhs)?;
                binary(*op, left, right)
            }
            Expr::Ternary(condition, then, otherwise) => {
                if is_truthy(&self.eval(condition)?) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
        // `defined` inspects its argument instead of evaluating it
        if name == "defined" {
            return match args {
                [Expr::Var(var)] => Ok(Value::Bool(self.lookup(var).is_some())),
                [other] => Ok(Value::Bool(self.eval(other).is_ok())),
                _ => Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: 1,
                    found: args.len(),
                }),
            };
        }
        let function = functions::lookup(name).ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;
        function.call(&args)
    }
}

fn member(object: Value, property: &str) -> Result<Value, EvalError> {
    match object {
        Value::Object(mut map) => Ok(map.remove(property).unwrap_or(Value::Null)),
        Value::Array(items) if property == "length" => Ok(Value::from(items.len())),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        Value::Null => Err(EvalError::InvalidAccess {
            property: format!("'{}'", property),
            found: "null".to_string(),
        }),
        _ => Ok(Value::Null),
    }
}

fn lookup_index(object: Value, index: Value) -> Result<Value, EvalError> {
    match (object, index) {
        (Value::Array(mut items), Value::Number(n)) => Ok(n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < items.len())
            .map(|i| items.swap_remove(i))
            .unwrap_or(Value::Null)),
        (Value::Object(mut map), key @ (Value::String(_) | Value::Number(_))) => {
            Ok(map.remove(&stringify(&key)).unwrap_or(Value::Null))
        }
        (Value::String(s), Value::Number(n)) => Ok(n
            .as_u64()
            .and_then(|i| s.chars().nth(i as usize))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        (object, index) => Err(EvalError::InvalidAccess {
            property: format!("[{}]", stringify(&index)),
            found: type_name(&object).to_string(),
        }),
    }
}

fn binary(op: BinOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let mismatch = |left: &Value, right: &Value| {
        EvalError::mismatch(op.symbol(), type_name(left), type_name(right))
    };
    match op {
        BinOp::Eq => Ok(Value::Bool(loose_eq(&left, &right))),
        BinOp::NotEq => Ok(Value::Bool(!loose_eq(&left, &right))),
        BinOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => number(a + b),
                _ => Err(mismatch(&left, &right)),
            },
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(stringify(&left) + &stringify(&right)))
            }
            _ => Err(mismatch(&left, &right)),
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
            let (a, b) = match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(mismatch(&left, &right)),
            };
            match op {
                BinOp::Sub => number(a - b),
                BinOp::Mul => number(a * b),
                BinOp::Div | BinOp::Rem if b == 0.0 => Err(EvalError::DivisionByZero),
                BinOp::Div => number(a / b),
                _ => number(a % b),
            }
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let ordering = ordering.ok_or_else(|| mismatch(&left, &right))?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        // Handled with short-circuiting by the caller
        BinOp::And | BinOp::Or => Ok(right),
    }
}
