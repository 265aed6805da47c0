//! Typed errors surfaced by the transformation engine.
//!
//! Every failure carries a stable `kind` discriminant plus the payload fields
//! relevant to that kind (`path`, `expression`, `operation`), so callers can
//! render the `{ kind, message, ... }` error shape without string matching.

use serde_json::{Value, json};
use thiserror::Error;

/// Error raised by template loading, validation, or transformation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Structural problem in the template document itself.
    #[error("template error: {message}")]
    Template {
        /// Human-readable description of the structural problem.
        message: String,
    },

    /// A path string did not match the path grammar.
    #[error("path syntax error in '{path}': {message}")]
    PathSyntax {
        /// The offending path text.
        path: String,
        /// Description of the syntax problem.
        message: String,
    },

    /// A path could not be resolved and the settings forbid skipping it.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that failed to resolve.
        path: String,
    },

    /// A write ran into an existing value of an incompatible shape.
    #[error("path conflict at '{path}': {message}")]
    PathConflict {
        /// The path at which the conflict occurred.
        path: String,
        /// Description of the conflicting shapes.
        message: String,
    },

    /// A condition or predicate string failed to parse or evaluate.
    #[error("invalid condition '{expression}': {message}")]
    InvalidCondition {
        /// The original expression text.
        expression: String,
        /// Description of the parse or evaluation problem.
        message: String,
    },

    /// An aggregation could not be carried out.
    #[error("aggregation '{operation}' failed: {message}")]
    Aggregation {
        /// The requested aggregation operation.
        operation: String,
        /// Description of the failure.
        message: String,
    },

    /// A math operation could not be carried out.
    #[error("math operation '{operation}' failed: {message}")]
    MathOperation {
        /// The requested math operation.
        operation: String,
        /// Description of the failure.
        message: String,
    },

    /// Nested templates recursed past the configured `maxDepth`.
    #[error("maximum template depth {max_depth} exceeded")]
    DepthExceeded {
        /// The depth limit that was exceeded.
        max_depth: usize,
    },
}

impl TransformError {
    /// Stable machine-readable discriminant for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Template { .. } => "TemplateError",
            Self::PathSyntax { .. } => "PathSyntaxError",
            Self::PathNotFound { .. } => "PathNotFoundError",
            Self::PathConflict { .. } => "PathConflictError",
            Self::InvalidCondition { .. } => "InvalidConditionError",
            Self::Aggregation { .. } => "AggregationError",
            Self::MathOperation { .. } => "MathOperationError",
            Self::DepthExceeded { .. } => "DepthExceededError",
        }
    }

    /// Returns true when the error must abort the whole transformation even
    /// outside strict mode.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Template { .. } | Self::DepthExceeded { .. })
    }

    /// Renders the error in its wire shape:
    /// `{ kind, message, path?, expression?, operation? }`.
    pub fn to_value(&self) -> Value {
        let mut rendered = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        let map = rendered.as_object_mut().expect("object literal");
        match self {
            Self::PathSyntax { path, .. } | Self::PathNotFound { path } | Self::PathConflict { path, .. } => {
                map.insert("path".to_string(), Value::String(path.clone()));
            }
            Self::InvalidCondition { expression, .. } => {
                map.insert("expression".to_string(), Value::String(expression.clone()));
            }
            Self::Aggregation { operation, .. } | Self::MathOperation { operation, .. } => {
                map.insert("operation".to_string(), Value::String(operation.clone()));
            }
            Self::Template { .. } | Self::DepthExceeded { .. } => {}
        }
        rendered
    }

    pub(crate) fn template(message: impl Into<String>) -> Self {
        Self::Template { message: message.into() }
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(error: serde_json::Error) -> Self {
        Self::Template {
            message: format!("invalid JSON: {error}"),
        }
    }
}
