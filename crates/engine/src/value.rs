//! Shared JSON value coercions.
//!
//! The expression evaluator, aggregator, math evaluator, and string templater
//! all agree on truthiness, numeric coercion, comparison, and stringification
//! through these helpers so the rules cannot drift between components.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Largest integer magnitude a double can represent exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Boolean coercion: `null`, `false`, `0`, `""`, and the empty array are
/// falsy; everything else (including the empty object) is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Numeric view of a value. Integers are widened to doubles; everything that
/// is not a JSON number yields `None`.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

/// Builds a JSON number from a double, preferring the integer representation
/// when the value is integral and exactly representable. Non-finite doubles
/// have no JSON spelling and collapse to `null`.
pub fn number_value(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// Structural equality with numeric widening: `1` and `1.0` compare equal,
/// everything else uses `serde_json`'s structural rules.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_f64(left), as_f64(right)) {
        return a == b;
    }
    left == right
}

/// Ordering between two values when one exists: numbers compare numerically,
/// strings lexicographically, booleans false-before-true. Mixed or
/// non-comparable kinds yield `None`.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => {
            let (a, b) = (as_f64(left)?, as_f64(right)?);
            a.partial_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Renders a value the way placeholders and `join` expect it: strings as-is,
/// booleans lower-case, numbers in their shortest round-trip form, `null` as
/// the empty string, containers as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_documented_coercion() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(truthy(&json!({})));
        assert!(truthy(&json!("no")));
        assert!(truthy(&json!(-1)));
    }

    #[test]
    fn number_value_prefers_integers() {
        assert_eq!(number_value(350.0), json!(350));
        assert_eq!(number_value(-3.0), json!(-3));
        assert_eq!(number_value(125.25), json!(125.25));
        assert_eq!(number_value(f64::NAN), json!(null));
        assert_eq!(number_value(f64::INFINITY), json!(null));
    }

    #[test]
    fn equality_widens_integers() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(values_equal(&json!({"a": 1}), &json!({"a": 1})));
    }

    #[test]
    fn comparisons_stay_within_one_kind() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
        assert_eq!(compare_values(&json!(null), &json!(1)), None);
    }

    #[test]
    fn stringify_matches_placeholder_rules() {
        assert_eq!(stringify(&json!("plain")), "plain");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(12.5)), "12.5");
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!([1, 2])), "[1,2]");
    }
}
