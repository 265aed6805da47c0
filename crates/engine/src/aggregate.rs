//! # Aggregator
//!
//! Folds an ordered item list to a single value. The pipeline is: filter by
//! the optional predicate (with the item bound to `$.item`), extract the
//! optional per-item field, then apply the fold.

use serde_json::Value;

use crate::error::TransformError;
use crate::expr::{CompiledExpr, Scope, evaluate_predicate};
use crate::path::{self, Path};
use crate::value::{as_f64, compare_values, number_value, stringify};

/// Aggregation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    First,
    Last,
    Join,
}

impl AggregateOp {
    /// Parses an operation name; unknown names fail with `AggregationError`.
    pub fn parse(name: &str) -> Result<Self, TransformError> {
        match name {
            "sum" => Ok(Self::Sum),
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "count" => Ok(Self::Count),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "join" => Ok(Self::Join),
            other => Err(TransformError::Aggregation {
                operation: other.to_string(),
                message: "unknown aggregation operation".to_string(),
            }),
        }
    }

    /// Canonical operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
            Self::Join => "join",
        }
    }
}

/// A compiled aggregation: operation, optional per-item field, optional
/// filter predicate, and the `join` separator.
#[derive(Debug, Clone)]
pub struct Aggregation {
    op: AggregateOp,
    field: Option<Path>,
    predicate: Option<CompiledExpr>,
    separator: String,
}

impl Aggregation {
    pub fn new(op: AggregateOp, field: Option<Path>, predicate: Option<CompiledExpr>, separator: Option<String>) -> Self {
        Self {
            op,
            field,
            predicate,
            separator: separator.unwrap_or_else(|| ",".to_string()),
        }
    }

    /// Short form: just the operation, no filter or extraction.
    pub fn bare(op: AggregateOp) -> Self {
        Self::new(op, None, None, None)
    }

    /// Runs the filter → extract → fold pipeline over `items`.
    pub fn apply(&self, items: &[Value], scope: &Scope<'_>, strict: bool) -> Result<Value, TransformError> {
        let mut surviving = Vec::with_capacity(items.len());
        for item in items {
            if let Some(predicate) = &self.predicate
                && !evaluate_predicate(predicate, &scope.with_item(item), strict)?
            {
                continue;
            }
            surviving.push(match &self.field {
                Some(field) => extract_field(field, item),
                None => item.clone(),
            });
        }

        Ok(fold(self.op, surviving, &self.separator))
    }
}

/// Field paths are relative to the item; an explicit `$.item` prefix is
/// normalised away at compile time, so plain resolution applies here.
fn extract_field(field: &Path, item: &Value) -> Value {
    path::resolve_single(field, item).unwrap_or(Value::Null)
}

fn fold(op: AggregateOp, items: Vec<Value>, separator: &str) -> Value {
    match op {
        AggregateOp::Sum => number_value(numerics(&items).sum()),
        AggregateOp::Avg => {
            let numbers: Vec<f64> = numerics(&items).collect();
            if numbers.is_empty() {
                return Value::from(0);
            }
            number_value(numbers.iter().sum::<f64>() / numbers.len() as f64)
        }
        AggregateOp::Min => extremum(&items, std::cmp::Ordering::Less),
        AggregateOp::Max => extremum(&items, std::cmp::Ordering::Greater),
        AggregateOp::Count => Value::from(items.len() as i64),
        AggregateOp::First => items.into_iter().next().unwrap_or(Value::Null),
        AggregateOp::Last => items.into_iter().next_back().unwrap_or(Value::Null),
        AggregateOp::Join => Value::String(items.iter().map(stringify).collect::<Vec<_>>().join(separator)),
    }
}

fn numerics<'a>(items: &'a [Value]) -> impl Iterator<Item = f64> + 'a {
    items.iter().filter_map(as_f64)
}

/// Numeric entries win when any exist; otherwise strings compare
/// lexicographically. Empty input yields null.
fn extremum(items: &[Value], keep: std::cmp::Ordering) -> Value {
    let numbers: Vec<f64> = numerics(items).collect();
    if !numbers.is_empty() {
        let best = numbers
            .into_iter()
            .reduce(|best, candidate| if candidate.partial_cmp(&best) == Some(keep) { candidate } else { best });
        return best.map(number_value).unwrap_or(Value::Null);
    }

    let mut strings = items.iter().filter(|item| item.is_string());
    let first = strings.next().cloned();
    strings.fold(first, |best, candidate| {
        let best = best?;
        if compare_values(candidate, &best) == Some(keep) {
            Some(candidate.clone())
        } else {
            Some(best)
        }
    })
    .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::{AggregateOp, Aggregation};
    use crate::expr::{CompiledExpr, Scope};
    use crate::path::Path;
    use serde_json::{Value, json};

    fn items(values: Value) -> Vec<Value> {
        values.as_array().expect("array fixture").clone()
    }

    fn apply(aggregation: &Aggregation, values: Value) -> Value {
        let doc = json!({});
        aggregation.apply(&items(values), &Scope::new(&doc), false).expect("apply")
    }

    #[test]
    fn sum_and_avg_ignore_non_numeric_entries() {
        let sum = Aggregation::bare(AggregateOp::Sum);
        assert_eq!(apply(&sum, json!([100.5, "x", 75.25, null, 200.0])), json!(375.75));

        let avg = Aggregation::bare(AggregateOp::Avg);
        assert_eq!(apply(&avg, json!([100.5, 75.25, 200.0, "skip"])), json!(125.25));
    }

    #[test]
    fn avg_of_empty_input_is_zero() {
        let avg = Aggregation::bare(AggregateOp::Avg);
        assert_eq!(apply(&avg, json!([])), json!(0));
    }

    #[test]
    fn min_max_cover_numbers_and_strings() {
        let min = Aggregation::bare(AggregateOp::Min);
        let max = Aggregation::bare(AggregateOp::Max);
        assert_eq!(apply(&min, json!([3, 1, 2])), json!(1));
        assert_eq!(apply(&max, json!([3, 1, 2])), json!(3));
        assert_eq!(apply(&min, json!(["pear", "apple", "plum"])), json!("apple"));
        assert_eq!(apply(&max, json!(["pear", "apple", "plum"])), json!("plum"));
        assert_eq!(apply(&min, json!([])), json!(null));
    }

    #[test]
    fn count_first_last_are_positional() {
        assert_eq!(apply(&Aggregation::bare(AggregateOp::Count), json!(["a", "b", "c"])), json!(3));
        assert_eq!(apply(&Aggregation::bare(AggregateOp::First), json!([10, 20])), json!(10));
        assert_eq!(apply(&Aggregation::bare(AggregateOp::Last), json!([10, 20])), json!(20));
        assert_eq!(apply(&Aggregation::bare(AggregateOp::First), json!([])), json!(null));
    }

    #[test]
    fn join_stringifies_with_the_separator() {
        let joined = Aggregation::new(AggregateOp::Join, None, None, Some(" | ".into()));
        assert_eq!(apply(&joined, json!(["a", 1, true])), json!("a | 1 | true"));

        let default_sep = Aggregation::bare(AggregateOp::Join);
        assert_eq!(apply(&default_sep, json!(["a", "b"])), json!("a,b"));
    }

    #[test]
    fn predicate_filters_with_item_binding() {
        let doc = json!({});
        let predicate = CompiledExpr::compile("$.item.amount > 100").expect("compile");
        let field = Path::parse("amount").expect("parse");
        let aggregation = Aggregation::new(AggregateOp::Sum, Some(field), Some(predicate), None);

        let transactions = items(json!([
            { "amount": 50.5 }, { "amount": 150 }, { "amount": 75 }, { "amount": 200 }, { "amount": 25 }
        ]));
        let total = aggregation.apply(&transactions, &Scope::new(&doc), false).expect("apply");
        assert_eq!(total, json!(350));
    }

    #[test]
    fn predicate_sees_the_outer_document() {
        let doc = json!({ "cutoff": 100 });
        let predicate = CompiledExpr::compile("$.item.amount > $.cutoff").expect("compile");
        let aggregation = Aggregation::new(AggregateOp::Count, None, Some(predicate), None);

        let transactions = items(json!([{ "amount": 150 }, { "amount": 50 }]));
        let count = aggregation.apply(&transactions, &Scope::new(&doc), false).expect("apply");
        assert_eq!(count, json!(1));
    }

    #[test]
    fn unknown_operations_are_rejected() {
        let error = AggregateOp::parse("median").expect_err("unknown");
        assert_eq!(error.kind(), "AggregationError");
    }
}
