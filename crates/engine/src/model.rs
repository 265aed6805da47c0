//! # Template Model Definitions
//!
//! Serde-typed structures for transformation templates: the template itself,
//! its ordered mapping rules, condition chains, aggregation and math
//! specifications, and the engine settings. These deserialize directly from
//! the template JSON; the loader compiles them into the pre-parsed form the
//! executor walks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete transformation template: an ordered list of mapping rules plus
/// engine settings and optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransformTemplate {
    /// Mapping rules, processed in order.
    #[serde(default)]
    pub mappings: Vec<Mapping>,

    /// Engine settings; every field has a documented default. Only the
    /// top-level template's settings govern a transformation; a settings
    /// block on a nested template draws a validation warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<TransformSettings>,

    /// Optional template format version, e.g. `"1.0"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single rule: one producer yielding one value, written at one target path.
///
/// Exactly one producer is expected per mapping. When several are present the
/// executor picks by fixed precedence (`conditions`, then `template`, then
/// `aggregation`/`aggregate`, `math`, `concat`, `value`, `from`) and the
/// validator emits a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    /// Write path for the produced value. Required and non-empty; a path
    /// without the `$` root is accepted and treated as `$.`-prefixed.
    #[serde(default)]
    pub to: String,

    /// Read path into the source document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Literal value. The string `"now"` is reserved and expands to the
    /// current UTC timestamp in ISO-8601 with millisecond precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Template string with `{path}` placeholders and the `{now}` token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concat: Option<String>,

    /// Ordered condition chain; the first matching branch wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,

    /// Short-form aggregation: just the operation name, applied to `from`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,

    /// Long-form aggregation with field extraction and a filter predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationSpec>,

    /// N-ary arithmetic over resolved operands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math: Option<MathSpec>,

    /// Nested template applied once per item of the array `from` yields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Box<TransformTemplate>>,

    /// Fallback when the producer resolves to null or nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Disabled mappings are skipped entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One entry of a condition chain.
///
/// `"else": true` marks a terminal catch-all whose `then` is chosen
/// unconditionally when reached. An `else` object carrying `if`/`then`/`else`
/// keys is a nested chain of its own.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Condition {
    /// Predicate expression; absent on catch-all entries.
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub r#if: Option<String>,

    /// Branch value chosen when the predicate holds: a literal, a `$`-rooted
    /// path reference, a nested `{if, then, else}` object, or a producer body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Value>,

    /// Nested chain evaluated when `if` is false, before `else`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elseif: Option<Vec<Condition>>,

    /// Fallback branch: a value, a nested `{if, then, else}` object, or the
    /// literal `true` marking this entry as a catch-all.
    #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
    pub r#else: Option<Value>,
}

/// Long-form aggregation specification.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AggregationSpec {
    /// Operation name: `sum`, `avg`, `min`, `max`, `count`, `first`, `last`,
    /// or `join`.
    #[serde(rename = "type")]
    pub r#type: String,

    /// Field extracted from each surviving item before the fold, relative to
    /// the item (`"amount"`, `"price.net"`, or the explicit `"$.item.amount"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Filter predicate over `$.item`; outer-document paths stay resolvable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Separator for `join`. Defaults to `","`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// N-ary arithmetic specification.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MathSpec {
    /// Operation name: `add`, `subtract`, `multiply`, `divide`, `power`,
    /// `sqrt`, `abs`, `round`, `min`, `max`, or `mod`.
    pub operation: String,

    /// Operands in order: numeric literals are taken as-is, strings are
    /// resolved as paths against the source document.
    #[serde(default)]
    pub operands: Vec<Value>,

    /// Decimal places for `round`. Defaults to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// Engine settings with their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformSettings {
    /// Missing source paths and type errors fail instead of being skipped.
    pub strict_mode: bool,

    /// Null producer results are written instead of being dropped.
    pub preserve_nulls: bool,

    /// Writes create missing intermediate containers instead of failing.
    pub create_paths: bool,

    /// Recursion cap for nested templates.
    pub max_depth: usize,

    /// Emit diagnostic trace events while transforming.
    pub enable_tracing: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            strict_mode: false,
            preserve_nulls: true,
            create_paths: true,
            max_depth: 10,
            enable_tracing: false,
        }
    }
}

fn default_true() -> bool {
    true
}
