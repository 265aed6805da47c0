//! # Reshape Engine
//!
//! A declarative JSON-to-JSON transformation engine. Given a source document
//! and a template describing an ordered list of mapping rules, it produces a
//! new target document by extracting values via path expressions,
//! transforming them through conditions, aggregations, arithmetic, and string
//! templates, and writing them at designated target paths.
//!
//! ## Key Features
//!
//! - **Path resolution**: a JSONPath-like selector subset for reads (with
//!   wildcards and recursive descent) and deterministic writes that create
//!   intermediate containers on demand
//! - **Expression DSL**: boolean, comparison, string, and arithmetic
//!   operators with short-circuit `&&`/`||`, compiled once per template
//! - **Mapping strategies**: field maps, constants, concat templates,
//!   if/elseif/else chains, filtered aggregations, math, and nested per-item
//!   sub-templates
//! - **Recovery policy**: per-mapping runtime errors are skipped outside
//!   strict mode and surfaced under it; structural template errors and depth
//!   overruns are always fatal
//!
//! ## Usage
//!
//! ```rust
//! let template = r#"{
//!     "mappings": [
//!         { "from": "$.user.name", "to": "$.customer.fullName" }
//!     ]
//! }"#;
//!
//! let source = r#"{ "user": { "name": "John Doe" } }"#;
//! let output = reshape_engine::transform(source, template)?;
//! assert_eq!(output, r#"{"customer":{"fullName":"John Doe"}}"#);
//! # Ok::<(), reshape_engine::TransformError>(())
//! ```
//!
//! A template can also be compiled once via [`JsonTransformer`] and reused
//! across any number of documents; the compiled form is immutable and safe to
//! share between threads.
//!
//! ## Architecture
//!
//! - **`path`**: read/write path grammar, match lists, and the tree writer
//! - **`expr`**: the predicate/arithmetic DSL (lexer, parser, evaluator)
//! - **`model`** and **`loader`**: the serde template model and its compiled,
//!   validated form
//! - **`executor`**: the per-mapping dispatch loop and nested templates
//! - **`aggregate`**, **`math`**, **`interpolate`**, **`condition`**: the
//!   individual producer strategies

pub mod aggregate;
pub mod condition;
pub mod error;
pub mod expr;
pub mod interpolate;
pub mod loader;
pub mod math;
pub mod model;
pub mod path;
pub mod trace;
pub mod value;

mod executor;

pub use error::TransformError;
pub use executor::JsonTransformer;
pub use loader::{Severity, ValidationIssue};
pub use model::{AggregationSpec, Condition, Mapping, MathSpec, TransformSettings, TransformTemplate};
pub use trace::TraceEvent;

/// Transforms a source document with a template, JSON text in and out.
///
/// The template is validated on entry; the first fatal problem aborts with a
/// [`TransformError`]. Output is compact JSON.
pub fn transform(source: &str, template: &str) -> Result<String, TransformError> {
    JsonTransformer::from_json(template)?.transform(source)
}

/// Deferred-completion form of [`transform`].
///
/// This simply wraps the blocking work for callers whose own I/O is deferred;
/// it adds no parallelism and contains no suspension points of its own.
pub async fn transform_async(source: &str, template: &str) -> Result<String, TransformError> {
    transform(source, template)
}

/// Validates a template without executing it, reporting every finding as a
/// rendered `error: ...` / `warning: ...` line. A template that does not
/// parse as JSON at all yields a single entry.
pub fn validate_template(template: &str) -> Vec<String> {
    let template: TransformTemplate = match serde_json::from_str(template) {
        Ok(template) => template,
        Err(problem) => return vec![format!("error: invalid JSON: {problem}")],
    };
    loader::validate(&template).iter().map(ToString::to_string).collect()
}
