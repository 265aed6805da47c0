//! # Mapping Executor
//!
//! Walks the compiled mapping list in template order, dispatches each rule to
//! its producer, and writes the produced value into the output tree. Reads
//! always see the original source document; writes never feed back into
//! subsequent reads. The only intra-template feedback is the `$.item` binding
//! inside nested templates.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::condition;
use crate::error::TransformError;
use crate::expr::Scope;
use crate::loader::{CompiledMapping, CompiledTemplate, Producer};
use crate::model::{TransformSettings, TransformTemplate};
use crate::path::{self, Path};
use crate::trace::TraceEvent;

/// A compiled, reusable transformer.
///
/// Construction parses and validates the template once; afterwards the
/// instance carries no mutable state, so it can be shared freely across
/// threads and used for any number of concurrent transformations.
#[derive(Debug, Clone)]
pub struct JsonTransformer {
    compiled: CompiledTemplate,
}

/// Per-transformation state threaded through the producers.
pub(crate) struct ExecCtx {
    pub(crate) settings: TransformSettings,
    /// Timestamp for the reserved `now` token, computed once per
    /// transformation so repeated tokens agree.
    pub(crate) now: String,
    trace: Vec<TraceEvent>,
}

impl ExecCtx {
    fn new(settings: TransformSettings) -> Self {
        Self {
            settings,
            now: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            trace: Vec::new(),
        }
    }

    fn record(&mut self, target: &str, detail: impl Into<String>) {
        if self.settings.enable_tracing {
            self.trace.push(TraceEvent::new(target, detail));
        }
    }
}

impl JsonTransformer {
    /// Compiles a typed template. The first fatal validation finding aborts.
    pub fn new(template: &TransformTemplate) -> Result<Self, TransformError> {
        Ok(Self {
            compiled: CompiledTemplate::compile(template)?,
        })
    }

    /// Compiles a template from its JSON text.
    pub fn from_json(template: &str) -> Result<Self, TransformError> {
        let template: TransformTemplate = serde_json::from_str(template)?;
        Self::new(&template)
    }

    /// Compiles a template from an already-parsed JSON value.
    pub fn from_value(template: &Value) -> Result<Self, TransformError> {
        let template: TransformTemplate = serde_json::from_value(template.clone())?;
        Self::new(&template)
    }

    /// Transforms JSON text to JSON text. Output is compact; pretty-printing
    /// is a caller concern.
    pub fn transform(&self, source: &str) -> Result<String, TransformError> {
        let source: Value = serde_json::from_str(source)?;
        let output = self.transform_value(&source)?;
        Ok(output.to_string())
    }

    /// Transforms a parsed source document.
    pub fn transform_value(&self, source: &Value) -> Result<Value, TransformError> {
        self.run(source).map(|(output, _)| output)
    }

    /// Transforms a parsed source document and returns the collected trace.
    /// The trace is empty unless the template sets `enableTracing`.
    pub fn transform_with_trace(&self, source: &Value) -> Result<(Value, Vec<TraceEvent>), TransformError> {
        self.run(source)
    }

    fn run(&self, source: &Value) -> Result<(Value, Vec<TraceEvent>), TransformError> {
        let mut ctx = ExecCtx::new(self.compiled.settings);
        let scope = Scope::new(source);
        debug!(mappings = self.compiled.mappings.len(), "transformation started");
        let output = run_template(&self.compiled, &scope, &mut ctx, 0)?;
        debug!("transformation finished");
        Ok((output, ctx.trace))
    }
}

/// Runs one template's mapping list against a scope, producing a fresh tree.
fn run_template(template: &CompiledTemplate, scope: &Scope<'_>, ctx: &mut ExecCtx, depth: usize) -> Result<Value, TransformError> {
    let mut output = Value::Object(Map::new());

    for mapping in &template.mappings {
        if !mapping.enabled {
            debug!(to = %mapping.label, "mapping disabled; skipped");
            ctx.record(&mapping.label, "skipped: disabled");
            continue;
        }

        let produced = match evaluate_producer(mapping.from.as_ref(), &mapping.producer, scope, ctx, depth) {
            Ok(produced) => produced,
            Err(problem) if problem.is_fatal() || ctx.settings.strict_mode => return Err(problem),
            Err(problem) => {
                warn!(to = %mapping.label, error = %problem, "mapping failed; recovered");
                ctx.record(&mapping.label, format!("recovered: {problem}"));
                continue;
            }
        };

        let value = match resolve_default(produced, mapping) {
            Some(value) => value,
            None => {
                debug!(to = %mapping.label, "producer yielded nothing; skipped");
                ctx.record(&mapping.label, "skipped: producer yielded nothing");
                continue;
            }
        };

        if value.is_null() && !ctx.settings.preserve_nulls {
            ctx.record(&mapping.label, "skipped: null suppressed");
            continue;
        }

        match path::write(&mut output, &mapping.to, value, ctx.settings.create_paths) {
            Ok(()) => ctx.record(&mapping.label, format!("wrote via {}", mapping.producer.name())),
            Err(problem) if problem.is_fatal() || ctx.settings.strict_mode => return Err(problem),
            Err(problem) => {
                warn!(to = %mapping.label, error = %problem, "write failed; recovered");
                ctx.record(&mapping.label, format!("recovered: {problem}"));
            }
        }
    }

    Ok(output)
}

/// Applies the default-value rule: a missing or null producer result falls
/// back to the mapping's `default`. A mapping that produced nothing and has
/// no default is skipped; a produced null survives for `preserveNulls`.
fn resolve_default(produced: Option<Value>, mapping: &CompiledMapping) -> Option<Value> {
    match produced {
        Some(value) if !value.is_null() => Some(value),
        Some(Value::Null) => Some(mapping.default.clone().unwrap_or(Value::Null)),
        _ => mapping.default.clone(),
    }
}

/// Evaluates one producer to its value. `Ok(None)` means the producer had
/// nothing to say and the mapping's default applies.
pub(crate) fn evaluate_producer(
    from: Option<&Path>,
    producer: &Producer,
    scope: &Scope<'_>,
    ctx: &mut ExecCtx,
    depth: usize,
) -> Result<Option<Value>, TransformError> {
    match producer {
        // An unmatched chain produces null (not "missing"), so the default
        // and then preserveNulls govern what happens to the mapping.
        Producer::Conditions(chain) => Ok(Some(condition::evaluate_chain(chain, scope, ctx, depth)?.unwrap_or(Value::Null))),
        Producer::Template(nested) => apply_nested_template(from, nested, scope, ctx, depth),
        Producer::Aggregation(aggregation) => {
            let Some(from) = from else {
                return Ok(None);
            };
            let items = scope.resolve_list(from);
            aggregation.apply(&items, scope, ctx.settings.strict_mode).map(Some)
        }
        Producer::Math(rule) => rule.apply(scope, ctx.settings.strict_mode).map(Some),
        Producer::Concat(template) => Ok(Some(Value::String(template.expand(scope, &ctx.now)))),
        Producer::Value(value) => Ok(Some(resolve_reserved_literal(value, ctx))),
        Producer::From => {
            let Some(path) = from else {
                return Ok(None);
            };
            match scope.resolve(path) {
                Some(value) => Ok(Some(value)),
                None if ctx.settings.strict_mode => Err(TransformError::PathNotFound { path: path.to_string() }),
                None => Ok(None),
            }
        }
    }
}

/// The literal string `"now"` is reserved for the shared UTC timestamp.
fn resolve_reserved_literal(value: &Value, ctx: &ExecCtx) -> Value {
    match value {
        Value::String(text) if text == "now" => Value::String(ctx.now.clone()),
        other => other.clone(),
    }
}

/// Applies a nested template once per item of the array `from` yields, with
/// the item bound to `$.item`. Per-item results are collected into an array,
/// or merged into an object keyed by item index when every nested `to` was
/// `$`-rooted in the template text.
fn apply_nested_template(
    from: Option<&Path>,
    nested: &CompiledTemplate,
    scope: &Scope<'_>,
    ctx: &mut ExecCtx,
    depth: usize,
) -> Result<Option<Value>, TransformError> {
    let Some(from) = from else {
        return Ok(None);
    };

    let items = match scope.resolve(from) {
        None if ctx.settings.strict_mode => {
            return Err(TransformError::PathNotFound { path: from.to_string() });
        }
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        // A single non-array match counts as a one-element list.
        Some(single) => vec![single],
    };

    if depth + 1 > ctx.settings.max_depth {
        return Err(TransformError::DepthExceeded {
            max_depth: ctx.settings.max_depth,
        });
    }

    if nested.all_rooted {
        let mut merged = Map::new();
        for (index, item) in items.iter().enumerate() {
            let item_scope = scope.with_item(item);
            merged.insert(index.to_string(), run_template(nested, &item_scope, ctx, depth + 1)?);
        }
        Ok(Some(Value::Object(merged)))
    } else {
        let mut collected = Vec::with_capacity(items.len());
        for item in &items {
            let item_scope = scope.with_item(item);
            collected.push(run_template(nested, &item_scope, ctx, depth + 1)?);
        }
        Ok(Some(Value::Array(collected)))
    }
}
