//! Diagnostic trace events collected when `enableTracing` is set.

use std::fmt;

/// One diagnostic record emitted while transforming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// The mapping's target path text.
    pub target: String,
    /// What happened at that mapping.
    pub detail: String,
}

impl TraceEvent {
    pub(crate) fn new(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.detail)
    }
}
