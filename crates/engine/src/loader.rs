//! # Template Loader & Validator
//!
//! Parses template JSON into the typed model, validates it, and compiles it
//! into the pre-parsed form the executor walks: every path and every
//! condition string is parsed exactly once, so evaluation per mapping is pure
//! tree-walking.
//!
//! Validation reports all problems as a list without short-circuiting;
//! `transform` re-validates on entry and raises the first fatal error.

use std::fmt;

use serde_json::Value;

use crate::aggregate::{AggregateOp, Aggregation};
use crate::condition::{Branch, BranchBody, CompiledCondition};
use crate::error::TransformError;
use crate::expr::CompiledExpr;
use crate::interpolate::ConcatTemplate;
use crate::math::{MathOp, MathOperand, MathRule};
use crate::model::{Condition, Mapping, TransformSettings, TransformTemplate};
use crate::path::Path;

/// Validation finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The template cannot be executed.
    Error,
    /// Suspicious but executable; precedence or defaults resolve it.
    Warning,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// A template compiled for execution.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub(crate) settings: TransformSettings,
    pub(crate) mappings: Vec<CompiledMapping>,
    /// True when every mapping's `to` carried the `$` root in the template
    /// text. Nested templates use this to pick the per-item merge shape.
    pub(crate) all_rooted: bool,
}

/// A mapping compiled for execution.
#[derive(Debug, Clone)]
pub struct CompiledMapping {
    pub(crate) to: Path,
    /// Original `to` text, kept for diagnostics and trace events.
    pub(crate) label: String,
    pub(crate) from: Option<Path>,
    pub(crate) producer: Producer,
    pub(crate) default: Option<Value>,
    pub(crate) enabled: bool,
}

/// The mechanism a mapping uses to yield its value, chosen by fixed
/// precedence when several are specified.
#[derive(Debug, Clone)]
pub enum Producer {
    Conditions(Vec<CompiledCondition>),
    Template(Box<CompiledTemplate>),
    Aggregation(Aggregation),
    Math(MathRule),
    Concat(ConcatTemplate),
    Value(Value),
    From,
}

impl Producer {
    /// Producer name used in warnings and trace events.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Conditions(_) => "conditions",
            Self::Template(_) => "template",
            Self::Aggregation(_) => "aggregation",
            Self::Math(_) => "math",
            Self::Concat(_) => "concat",
            Self::Value(_) => "value",
            Self::From => "from",
        }
    }
}

impl CompiledTemplate {
    /// Validates and compiles a template model. The first fatal validation
    /// finding aborts with a `TemplateError`.
    pub fn compile(template: &TransformTemplate) -> Result<Self, TransformError> {
        let mut issues = Vec::new();
        let compiled = compile_template(template, true, "", &mut issues);
        if let Some(first_error) = issues.iter().find(|issue| issue.severity == Severity::Error) {
            return Err(TransformError::template(first_error.message.clone()));
        }
        Ok(compiled)
    }
}

/// Validates a template model, reporting every finding.
pub fn validate(template: &TransformTemplate) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    compile_template(template, true, "", &mut issues);
    issues
}

/// Compiles a template, pushing findings instead of failing fast. Pieces
/// that fail to compile are replaced by inert placeholders so the walk can
/// continue collecting findings.
fn compile_template(template: &TransformTemplate, top_level: bool, prefix: &str, issues: &mut Vec<ValidationIssue>) -> CompiledTemplate {
    let settings = template.settings.unwrap_or_default();
    if !top_level && template.settings.is_some() {
        warning(issues, format!("{prefix}settings: nested template settings are ignored; the top-level settings govern"));
    }
    if top_level && settings.max_depth < 1 {
        error(issues, format!("{prefix}settings.maxDepth: must be at least 1"));
    }

    let mut all_rooted = true;
    let mappings = template
        .mappings
        .iter()
        .enumerate()
        .map(|(index, mapping)| {
            let at = format!("{prefix}mappings[{index}]");
            if !mapping.to.trim_start().starts_with('$') {
                all_rooted = false;
            }
            compile_mapping(mapping, &at, issues)
        })
        .collect();

    CompiledTemplate {
        settings,
        mappings,
        all_rooted,
    }
}

fn compile_mapping(mapping: &Mapping, at: &str, issues: &mut Vec<ValidationIssue>) -> CompiledMapping {
    let to = if mapping.to.trim().is_empty() {
        error(issues, format!("{at}.to: required and must be non-empty"));
        Path::parse("$").expect("root path parses")
    } else {
        match Path::parse_write(&mapping.to) {
            Ok(path) => path,
            Err(problem) => {
                error(issues, format!("{at}.to: {problem}"));
                Path::parse("$").expect("root path parses")
            }
        }
    };

    let from = mapping.from.as_ref().and_then(|text| match Path::parse(text) {
        Ok(path) => Some(path),
        Err(problem) => {
            error(issues, format!("{at}.from: {problem}"));
            None
        }
    });

    let producer = compile_producer(mapping, at, issues);

    CompiledMapping {
        to,
        label: mapping.to.clone(),
        from,
        producer,
        default: mapping.default.clone(),
        enabled: mapping.enabled,
    }
}

/// Picks the producer by fixed precedence, warning when several coexist.
fn compile_producer(mapping: &Mapping, at: &str, issues: &mut Vec<ValidationIssue>) -> Producer {
    let mut present: Vec<&'static str> = Vec::new();
    if mapping.conditions.is_some() {
        present.push("conditions");
    }
    if mapping.template.is_some() {
        present.push("template");
    }
    if mapping.aggregation.is_some() || mapping.aggregate.is_some() {
        present.push("aggregation");
    }
    if mapping.math.is_some() {
        present.push("math");
    }
    if mapping.concat.is_some() {
        present.push("concat");
    }
    if mapping.value.is_some() {
        present.push("value");
    }
    if present.len() > 1 {
        warning(
            issues,
            format!("{at}: multiple producers specified ({}); '{}' wins by precedence", present.join(", "), present[0]),
        );
    }

    if let Some(conditions) = &mapping.conditions {
        return Producer::Conditions(compile_chain(conditions, &format!("{at}.conditions"), issues));
    }
    if let Some(nested) = &mapping.template {
        if mapping.from.is_none() {
            warning(issues, format!("{at}.template: no 'from' array; the nested template will produce nothing"));
        }
        let compiled = compile_template(nested, false, &format!("{at}.template."), issues);
        return Producer::Template(Box::new(compiled));
    }
    if let Some(spec) = &mapping.aggregation {
        if mapping.aggregate.is_some() {
            warning(issues, format!("{at}: both 'aggregation' and 'aggregate' specified; the long form wins"));
        }
        return compile_aggregation_long(spec, at, issues);
    }
    if let Some(name) = &mapping.aggregate {
        return match AggregateOp::parse(name) {
            Ok(op) => Producer::Aggregation(Aggregation::bare(op)),
            Err(problem) => {
                error(issues, format!("{at}.aggregate: {problem}"));
                Producer::From
            }
        };
    }
    if let Some(spec) = &mapping.math {
        let op = match MathOp::parse(&spec.operation) {
            Ok(op) => op,
            Err(problem) => {
                error(issues, format!("{at}.math.operation: {problem}"));
                return Producer::From;
            }
        };
        if spec.operands.is_empty() {
            error(issues, format!("{at}.math.operands: at least one operand is required"));
        }
        let mut operands = Vec::with_capacity(spec.operands.len());
        for (index, operand) in spec.operands.iter().enumerate() {
            match MathOperand::compile(operand) {
                Ok(compiled) => operands.push(compiled),
                Err(problem) => error(issues, format!("{at}.math.operands[{index}]: {problem}")),
            }
        }
        return Producer::Math(MathRule::new(op, operands, spec.precision));
    }
    if let Some(text) = &mapping.concat {
        return match ConcatTemplate::compile(text) {
            Ok(compiled) => Producer::Concat(compiled),
            Err(problem) => {
                error(issues, format!("{at}.concat: {problem}"));
                Producer::From
            }
        };
    }
    if let Some(value) = &mapping.value {
        return Producer::Value(value.clone());
    }
    Producer::From
}

fn compile_aggregation_long(spec: &crate::model::AggregationSpec, at: &str, issues: &mut Vec<ValidationIssue>) -> Producer {
    let op = match AggregateOp::parse(&spec.r#type) {
        Ok(op) => op,
        Err(problem) => {
            error(issues, format!("{at}.aggregation.type: {problem}"));
            return Producer::From;
        }
    };

    let field = spec.field.as_ref().and_then(|text| match compile_item_field(text) {
        Ok(path) => Some(path),
        Err(problem) => {
            error(issues, format!("{at}.aggregation.field: {problem}"));
            None
        }
    });

    let predicate = spec.condition.as_ref().and_then(|text| match CompiledExpr::compile(text) {
        Ok(compiled) => Some(compiled),
        Err(problem) => {
            error(issues, format!("{at}.aggregation.condition: {problem}"));
            None
        }
    });

    Producer::Aggregation(Aggregation::new(op, field, predicate, spec.separator.clone()))
}

/// Field paths are relative to each item; an explicit `$.item` prefix is
/// normalised away so `"amount"` and `"$.item.amount"` mean the same thing.
fn compile_item_field(text: &str) -> Result<Path, TransformError> {
    let path = Path::parse(text)?;
    Ok(path.strip_item_prefix().unwrap_or(path))
}

/// Compiles a condition chain, one entry at a time.
fn compile_chain(conditions: &[Condition], at: &str, issues: &mut Vec<ValidationIssue>) -> Vec<CompiledCondition> {
    conditions
        .iter()
        .enumerate()
        .map(|(index, condition)| compile_condition(condition, &format!("{at}[{index}]"), issues))
        .collect()
}

fn compile_condition(condition: &Condition, at: &str, issues: &mut Vec<ValidationIssue>) -> CompiledCondition {
    let test = condition.r#if.as_ref().and_then(|text| match CompiledExpr::compile(text) {
        Ok(compiled) => Some(compiled),
        Err(problem) => {
            error(issues, format!("{at}.if: {problem}"));
            None
        }
    });

    let catch_all = matches!(condition.r#else, Some(Value::Bool(true)));
    if condition.r#if.is_none() && !catch_all && condition.then.is_none() {
        warning(issues, format!("{at}: has neither 'if' nor 'then'; the entry never produces a value"));
    }

    let then = condition.then.as_ref().map(|value| compile_branch(value, &format!("{at}.then"), issues));
    let elseif = condition
        .elseif
        .as_ref()
        .map(|chain| compile_chain(chain, &format!("{at}.elseif"), issues))
        .unwrap_or_default();
    let else_branch = match &condition.r#else {
        Some(Value::Bool(true)) | None => None,
        Some(value) => Some(compile_branch(value, &format!("{at}.else"), issues)),
    };

    CompiledCondition {
        test,
        then,
        elseif,
        else_branch,
        catch_all,
    }
}

/// Branch values: `$`-rooted strings are path references, objects with an
/// `if` key are nested conditions, objects with producer keys are evaluated
/// as that producer, everything else is a literal.
fn compile_branch(value: &Value, at: &str, issues: &mut Vec<ValidationIssue>) -> Branch {
    match value {
        Value::String(text) if text.starts_with('$') => match Path::parse(text) {
            Ok(path) => Branch::Path(path),
            Err(problem) => {
                error(issues, format!("{at}: {problem}"));
                Branch::Literal(Value::Null)
            }
        },
        Value::Object(map) if map.contains_key("if") || map.contains_key("else") => {
            match serde_json::from_value::<Condition>(value.clone()) {
                Ok(condition) => Branch::Nested(Box::new(compile_condition(&condition, at, issues))),
                Err(problem) => {
                    error(issues, format!("{at}: not a valid condition object: {problem}"));
                    Branch::Literal(Value::Null)
                }
            }
        }
        Value::Object(map) if PRODUCER_KEYS.iter().any(|key| map.contains_key(*key)) => {
            match serde_json::from_value::<Mapping>(value.clone()) {
                Ok(body) => {
                    let from = body.from.as_ref().and_then(|text| match Path::parse(text) {
                        Ok(path) => Some(path),
                        Err(problem) => {
                            error(issues, format!("{at}.from: {problem}"));
                            None
                        }
                    });
                    let producer = compile_producer(&body, at, issues);
                    Branch::Body(Box::new(BranchBody { from, producer }))
                }
                Err(problem) => {
                    error(issues, format!("{at}: not a valid producer body: {problem}"));
                    Branch::Literal(Value::Null)
                }
            }
        }
        other => Branch::Literal(other.clone()),
    }
}

const PRODUCER_KEYS: &[&str] = &["conditions", "template", "aggregation", "aggregate", "math", "concat", "value", "from"];

fn error(issues: &mut Vec<ValidationIssue>, message: String) {
    issues.push(ValidationIssue {
        severity: Severity::Error,
        message,
    });
}

fn warning(issues: &mut Vec<ValidationIssue>, message: String) {
    issues.push(ValidationIssue {
        severity: Severity::Warning,
        message,
    });
}
