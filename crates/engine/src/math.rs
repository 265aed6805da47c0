//! # Math Evaluator
//!
//! Applies an n-ary arithmetic operation to operands resolved in order:
//! numeric literals are taken as-is, strings are resolved as paths against
//! the evaluation scope and converted to doubles.

use serde_json::Value;

use crate::error::TransformError;
use crate::expr::Scope;
use crate::path::Path;
use crate::value::{as_f64, number_value};

/// Math operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Sqrt,
    Abs,
    Round,
    Min,
    Max,
    Mod,
}

impl MathOp {
    /// Parses an operation name; unknown names fail with `MathOperationError`.
    pub fn parse(name: &str) -> Result<Self, TransformError> {
        match name {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "divide" => Ok(Self::Divide),
            "power" => Ok(Self::Power),
            "sqrt" => Ok(Self::Sqrt),
            "abs" => Ok(Self::Abs),
            "round" => Ok(Self::Round),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mod" => Ok(Self::Mod),
            other => Err(TransformError::MathOperation {
                operation: other.to_string(),
                message: "unknown math operation".to_string(),
            }),
        }
    }

    /// Canonical operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Power => "power",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Round => "round",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mod => "mod",
        }
    }
}

/// A compiled operand: literals are fixed, strings become paths.
#[derive(Debug, Clone)]
pub enum MathOperand {
    /// A numeric literal from the template.
    Literal(f64),
    /// A path resolved against the source at evaluation time.
    Path(Path),
    /// Anything else; fails in strict mode and counts as zero otherwise.
    Invalid(Value),
}

impl MathOperand {
    /// Compiles one operand value from the template.
    pub fn compile(operand: &Value) -> Result<Self, TransformError> {
        match operand {
            Value::Number(number) => Ok(Self::Literal(number.as_f64().unwrap_or(0.0))),
            Value::String(text) => Ok(Self::Path(Path::parse(text)?)),
            other => Ok(Self::Invalid(other.clone())),
        }
    }
}

/// A compiled math rule.
#[derive(Debug, Clone)]
pub struct MathRule {
    op: MathOp,
    operands: Vec<MathOperand>,
    precision: u32,
}

impl MathRule {
    pub fn new(op: MathOp, operands: Vec<MathOperand>, precision: Option<u32>) -> Self {
        Self {
            op,
            operands,
            precision: precision.unwrap_or(0),
        }
    }

    /// Resolves the operands and applies the operation. Division (and `mod`)
    /// by zero fails with `MathOperationError` in strict mode and evaluates
    /// to null otherwise.
    pub fn apply(&self, scope: &Scope<'_>, strict: bool) -> Result<Value, TransformError> {
        let mut numbers = Vec::with_capacity(self.operands.len());
        for operand in &self.operands {
            numbers.push(self.resolve_operand(operand, scope, strict)?);
        }

        let Some(&first) = numbers.first() else {
            return Err(self.error("requires at least one operand"));
        };

        let result = match self.op {
            MathOp::Add => numbers.iter().sum::<f64>(),
            MathOp::Subtract => numbers[1..].iter().fold(first, |acc, n| acc - n),
            MathOp::Multiply => numbers.iter().product::<f64>(),
            MathOp::Divide => {
                let mut acc = first;
                for &divisor in &numbers[1..] {
                    if divisor == 0.0 {
                        return self.division_by_zero(strict);
                    }
                    acc /= divisor;
                }
                acc
            }
            MathOp::Power => numbers[1..].iter().fold(first, |acc, n| acc.powf(*n)),
            MathOp::Sqrt => {
                if first < 0.0 {
                    return if strict {
                        Err(self.error("square root of a negative number"))
                    } else {
                        Ok(Value::Null)
                    };
                }
                first.sqrt()
            }
            MathOp::Abs => first.abs(),
            MathOp::Round => {
                let factor = 10f64.powi(self.precision as i32);
                (first * factor).round() / factor
            }
            MathOp::Min => numbers.iter().copied().fold(first, f64::min),
            MathOp::Max => numbers.iter().copied().fold(first, f64::max),
            MathOp::Mod => {
                let Some(&divisor) = numbers.get(1) else {
                    return Err(self.error("requires two operands"));
                };
                if divisor == 0.0 {
                    return self.division_by_zero(strict);
                }
                first % divisor
            }
        };

        Ok(number_value(result))
    }

    fn resolve_operand(&self, operand: &MathOperand, scope: &Scope<'_>, strict: bool) -> Result<f64, TransformError> {
        match operand {
            MathOperand::Literal(number) => Ok(*number),
            MathOperand::Path(path) => {
                let resolved = scope.resolve(path);
                match resolved.as_ref().and_then(as_f64) {
                    Some(number) => Ok(number),
                    None if strict => Err(self.error(format!("operand '{path}' is not numeric"))),
                    None => Ok(0.0),
                }
            }
            MathOperand::Invalid(value) if strict => Err(self.error(format!("operand {value} is not numeric"))),
            MathOperand::Invalid(_) => Ok(0.0),
        }
    }

    fn division_by_zero(&self, strict: bool) -> Result<Value, TransformError> {
        if strict {
            Err(self.error("division by zero"))
        } else {
            Ok(Value::Null)
        }
    }

    fn error(&self, message: impl Into<String>) -> TransformError {
        TransformError::MathOperation {
            operation: self.op.name().to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MathOp, MathOperand, MathRule};
    use crate::expr::Scope;
    use serde_json::{Value, json};

    fn rule(op: MathOp, operands: Value, precision: Option<u32>) -> MathRule {
        let operands = operands
            .as_array()
            .expect("array fixture")
            .iter()
            .map(|operand| MathOperand::compile(operand).expect("compile"))
            .collect();
        MathRule::new(op, operands, precision)
    }

    fn apply(op: MathOp, operands: Value) -> Value {
        let doc = json!({ "price": 19.99, "qty": 3 });
        rule(op, operands, None).apply(&Scope::new(&doc), false).expect("apply")
    }

    #[test]
    fn nary_operations_fold_left() {
        assert_eq!(apply(MathOp::Add, json!([1, 2, 3])), json!(6));
        assert_eq!(apply(MathOp::Subtract, json!([10, 3, 2])), json!(5));
        assert_eq!(apply(MathOp::Multiply, json!([2, 3, 4])), json!(24));
        assert_eq!(apply(MathOp::Divide, json!([24, 2, 3])), json!(4));
        assert_eq!(apply(MathOp::Min, json!([4, 2, 9])), json!(2));
        assert_eq!(apply(MathOp::Max, json!([4, 2, 9])), json!(9));
        assert_eq!(apply(MathOp::Mod, json!([10, 3])), json!(1));
    }

    #[test]
    fn paths_resolve_against_the_scope() {
        assert_eq!(apply(MathOp::Multiply, json!(["$.price", "$.qty"])), json!(59.97));
    }

    #[test]
    fn unary_operations_use_the_first_operand() {
        assert_eq!(apply(MathOp::Sqrt, json!([16])), json!(4));
        assert_eq!(apply(MathOp::Abs, json!([-2.5])), json!(2.5));
        assert_eq!(apply(MathOp::Power, json!([2, 10])), json!(1024));
    }

    #[test]
    fn round_honours_precision() {
        let doc = json!({});
        let rounded = rule(MathOp::Round, json!([2.34567]), Some(2)).apply(&Scope::new(&doc), false).expect("apply");
        assert_eq!(rounded, json!(2.35));
        let rounded = rule(MathOp::Round, json!([2.5]), None).apply(&Scope::new(&doc), false).expect("apply");
        assert_eq!(rounded, json!(3));
    }

    #[test]
    fn division_by_zero_follows_strict_mode() {
        let doc = json!({});
        let division = rule(MathOp::Divide, json!([1, 0]), None);
        assert_eq!(division.apply(&Scope::new(&doc), false).expect("lax"), json!(null));
        let error = division.apply(&Scope::new(&doc), true).expect_err("strict");
        assert_eq!(error.kind(), "MathOperationError");
    }

    #[test]
    fn missing_paths_follow_strict_mode() {
        let doc = json!({});
        let sum = rule(MathOp::Add, json!([1, "$.absent"]), None);
        assert_eq!(sum.apply(&Scope::new(&doc), false).expect("lax"), json!(1));
        let error = sum.apply(&Scope::new(&doc), true).expect_err("strict");
        assert_eq!(error.kind(), "MathOperationError");
    }

    #[test]
    fn unknown_operations_are_rejected() {
        let error = MathOp::parse("cbrt").expect_err("unknown");
        assert_eq!(error.kind(), "MathOperationError");
    }
}
