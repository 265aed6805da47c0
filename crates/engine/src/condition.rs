//! # Condition Engine
//!
//! Walks a compiled condition chain in order and returns the first selected
//! branch value. Each entry is tried as: `if` → nested `elseif` chain →
//! `else`; a catch-all entry (`"else": true`) is selected unconditionally
//! when reached.

use serde_json::Value;

use crate::error::TransformError;
use crate::executor::{ExecCtx, evaluate_producer};
use crate::expr::{CompiledExpr, Scope, evaluate_predicate};
use crate::loader::Producer;
use crate::path::Path;

/// One compiled entry of a condition chain.
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub(crate) test: Option<CompiledExpr>,
    pub(crate) then: Option<Branch>,
    pub(crate) elseif: Vec<CompiledCondition>,
    pub(crate) else_branch: Option<Branch>,
    pub(crate) catch_all: bool,
}

/// A compiled branch value (`then` or `else`).
#[derive(Debug, Clone)]
pub enum Branch {
    /// A literal copied verbatim.
    Literal(Value),
    /// A `$`-rooted path reference resolved against the scope.
    Path(Path),
    /// A nested `{if, then, else}` condition.
    Nested(Box<CompiledCondition>),
    /// A producer body (`concat`, `math`, `aggregation`, ...).
    Body(Box<BranchBody>),
}

/// A producer-shaped branch body.
#[derive(Debug, Clone)]
pub struct BranchBody {
    pub(crate) from: Option<Path>,
    pub(crate) producer: Producer,
}

/// Whether a chain entry selected a branch; a selected branch may still
/// resolve to nothing (a missing path), which ends the walk.
enum Outcome {
    Selected(Option<Value>),
    Pass,
}

/// Walks the chain; `Ok(None)` means no branch matched and the mapping's
/// default applies.
pub(crate) fn evaluate_chain(
    chain: &[CompiledCondition],
    scope: &Scope<'_>,
    ctx: &mut ExecCtx,
    depth: usize,
) -> Result<Option<Value>, TransformError> {
    for condition in chain {
        match evaluate_condition(condition, scope, ctx, depth)? {
            Outcome::Selected(value) => return Ok(value),
            Outcome::Pass => {}
        }
    }
    Ok(None)
}

fn evaluate_condition(
    condition: &CompiledCondition,
    scope: &Scope<'_>,
    ctx: &mut ExecCtx,
    depth: usize,
) -> Result<Outcome, TransformError> {
    if condition.catch_all {
        return Ok(Outcome::Selected(resolve_optional(condition.then.as_ref(), scope, ctx, depth)?));
    }

    let Some(test) = &condition.test else {
        // No predicate and not a catch-all: the `then` is unconditional.
        return Ok(Outcome::Selected(resolve_optional(condition.then.as_ref(), scope, ctx, depth)?));
    };

    if evaluate_predicate(test, scope, ctx.settings.strict_mode)? {
        return Ok(Outcome::Selected(resolve_optional(condition.then.as_ref(), scope, ctx, depth)?));
    }

    // The predicate is false: try the nested elseif chain before the else.
    if !condition.elseif.is_empty()
        && let Some(value) = evaluate_chain(&condition.elseif, scope, ctx, depth)?
    {
        return Ok(Outcome::Selected(Some(value)));
    }

    if let Some(branch) = &condition.else_branch {
        return Ok(Outcome::Selected(resolve_branch(branch, scope, ctx, depth)?));
    }

    Ok(Outcome::Pass)
}

fn resolve_optional(
    branch: Option<&Branch>,
    scope: &Scope<'_>,
    ctx: &mut ExecCtx,
    depth: usize,
) -> Result<Option<Value>, TransformError> {
    match branch {
        Some(branch) => resolve_branch(branch, scope, ctx, depth),
        None => Ok(None),
    }
}

fn resolve_branch(branch: &Branch, scope: &Scope<'_>, ctx: &mut ExecCtx, depth: usize) -> Result<Option<Value>, TransformError> {
    match branch {
        Branch::Literal(value) => Ok(Some(value.clone())),
        Branch::Path(path) => Ok(scope.resolve(path)),
        Branch::Nested(condition) => match evaluate_condition(condition, scope, ctx, depth)? {
            Outcome::Selected(value) => Ok(value),
            Outcome::Pass => Ok(None),
        },
        Branch::Body(body) => evaluate_producer(body.from.as_ref(), &body.producer, scope, ctx, depth),
    }
}
