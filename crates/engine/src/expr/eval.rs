//! Expression evaluation against a scoped document.

use serde_json::Value;

use crate::error::TransformError;
use crate::path::{self, Path};
use crate::value::{as_f64, compare_values, number_value, truthy, values_equal};

use super::{BinaryOp, CompiledExpr, Expr, UnaryOp};

/// Evaluation scope: the source document plus a stack of per-item frames.
///
/// Paths beginning `$.item` resolve against the innermost frame; every other
/// path resolves against the root document. Frames are pushed once per item
/// by the nested-template and aggregation machinery.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    root: &'a Value,
    frames: Vec<&'a Value>,
}

impl<'a> Scope<'a> {
    /// A scope over the source document with no item bound.
    pub fn new(root: &'a Value) -> Self {
        Self { root, frames: Vec::new() }
    }

    /// A child scope with `item` bound as the innermost `$.item` frame. The
    /// child's lifetime shrinks to the item's, which lets callers bind items
    /// they resolved and own locally.
    pub fn with_item<'b>(&self, item: &'b Value) -> Scope<'b>
    where
        'a: 'b,
    {
        let mut frames: Vec<&'b Value> = self.frames.clone();
        frames.push(item);
        Scope { root: self.root, frames }
    }

    /// The source document this scope reads from.
    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// Resolves a path to the single-value rule, honouring the `$.item`
    /// binding. Missing paths yield `None`.
    pub fn resolve(&self, path: &Path) -> Option<Value> {
        match (path.strip_item_prefix(), self.frames.last()) {
            (Some(relative), Some(&item)) => {
                if relative.is_root() {
                    Some(item.clone())
                } else {
                    path::resolve_single(&relative, item)
                }
            }
            _ => path::resolve_single(path, self.root),
        }
    }

    /// Resolves a path as an item list: a single match that is an array
    /// flattens into its elements, a single non-array match becomes a
    /// one-element list, several matches are the list itself.
    pub fn resolve_list(&self, path: &Path) -> Vec<Value> {
        let matches = match (path.strip_item_prefix(), self.frames.last()) {
            (Some(relative), Some(&item)) => {
                if relative.is_root() {
                    return match item {
                        Value::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    };
                }
                path::resolve(&relative, item)
            }
            _ => path::resolve(path, self.root),
        };

        match matches.as_slice() {
            [single] => match single.value {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            },
            _ => matches.into_iter().map(|entry| entry.value.clone()).collect(),
        }
    }
}

/// Evaluates a compiled expression. Type errors surface as
/// `InvalidConditionError` in strict mode and evaluate to `null` otherwise;
/// missing paths always evaluate to `null`.
pub fn evaluate(compiled: &CompiledExpr, scope: &Scope<'_>, strict: bool) -> Result<Value, TransformError> {
    eval(&compiled.root, scope, strict).map_err(|message| TransformError::InvalidCondition {
        expression: compiled.text.clone(),
        message,
    })
}

/// Evaluates a compiled expression and coerces the result to a boolean.
pub fn evaluate_predicate(compiled: &CompiledExpr, scope: &Scope<'_>, strict: bool) -> Result<bool, TransformError> {
    Ok(truthy(&evaluate(compiled, scope, strict)?))
}

fn eval(expr: &Expr, scope: &Scope<'_>, strict: bool) -> Result<Value, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => Ok(scope.resolve(path).unwrap_or(Value::Null)),
        Expr::Unary { op, operand } => {
            let value = eval(operand, scope, strict)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => match as_f64(&value) {
                    Some(number) => Ok(number_value(-number)),
                    None => type_error(strict, format!("cannot negate {}", kind_name(&value))),
                },
            }
        }
        Expr::Binary { op: BinaryOp::And, left, right } => {
            if !truthy(&eval(left, scope, strict)?) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&eval(right, scope, strict)?)))
        }
        Expr::Binary { op: BinaryOp::Or, left, right } => {
            if truthy(&eval(left, scope, strict)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&eval(right, scope, strict)?)))
        }
        Expr::Binary { op, left, right } => {
            let left = eval(left, scope, strict)?;
            let right = eval(right, scope, strict)?;
            apply_binary(*op, left, right, strict)
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value, strict: bool) -> Result<Value, String> {
    match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Add | BinaryOp::Sub => {
            let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
                return type_error(
                    strict,
                    format!(
                        "arithmetic requires numbers, found {} and {}",
                        kind_name(&left),
                        kind_name(&right)
                    ),
                );
            };
            let result = match op {
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                _ => unreachable!("arithmetic operator"),
            };
            Ok(number_value(result))
        }
        BinaryOp::Eq => {
            let (left, right) = (unwrap_single(left), unwrap_single(right));
            Ok(Value::Bool(values_equal(&left, &right)))
        }
        BinaryOp::Ne => {
            let (left, right) = (unwrap_single(left), unwrap_single(right));
            Ok(Value::Bool(!values_equal(&left, &right)))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let (left, right) = (unwrap_single(left), unwrap_single(right));
            // Ordered comparisons against null are false.
            let Some(ordering) = compare_values(&left, &right) else {
                return Ok(Value::Bool(false));
            };
            let outcome = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                BinaryOp::Ge => ordering.is_ge(),
                _ => unreachable!("ordered operator"),
            };
            Ok(Value::Bool(outcome))
        }
        BinaryOp::Contains => Ok(Value::Bool(contains(&left, &right))),
        BinaryOp::StartsWith => Ok(Value::Bool(string_affix(left, right, |text, probe| text.starts_with(probe)))),
        BinaryOp::EndsWith => Ok(Value::Bool(string_affix(left, right, |text, probe| text.ends_with(probe)))),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled above"),
    }
}

/// Comparisons treat a one-element match list as that element.
fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

/// `contains` is membership on arrays and case-insensitive substring search
/// on strings; anything else is false.
fn contains(left: &Value, right: &Value) -> bool {
    match left {
        Value::Array(items) => items.iter().any(|item| match (item, right) {
            (Value::String(a), Value::String(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => values_equal(item, right),
        }),
        Value::String(text) => match right {
            Value::String(probe) => text.to_lowercase().contains(&probe.to_lowercase()),
            _ => false,
        },
        _ => false,
    }
}

fn string_affix(left: Value, right: Value, check: fn(&str, &str) -> bool) -> bool {
    let (left, right) = (unwrap_single(left), unwrap_single(right));
    match (&left, &right) {
        (Value::String(text), Value::String(probe)) => check(&text.to_lowercase(), &probe.to_lowercase()),
        _ => false,
    }
}

fn type_error(strict: bool, message: String) -> Result<Value, String> {
    if strict { Err(message) } else { Ok(Value::Null) }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
