//! # Expression Evaluator
//!
//! The predicate/arithmetic DSL used inside `if` strings and aggregation
//! filters. Expressions are compiled once into an AST and evaluated by pure
//! tree-walking against the source document (plus the `$.item` frame inside
//! per-item contexts).
//!
//! Operator precedence, tightest first: unary `!` and `-`; `*` `/` `%`;
//! `+` `-`; comparisons `==` `!=` `<` `<=` `>` `>=`; string operators
//! `contains` / `startsWith` / `endsWith`; `&&`; `||`. Parentheses override.

mod eval;
mod lexer;
mod parser;

pub use eval::{Scope, evaluate, evaluate_predicate};

use serde_json::Value;

use crate::error::TransformError;
use crate::path::Path;

/// A compiled expression: the AST plus the original text for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    text: String,
    root: Expr,
}

impl CompiledExpr {
    /// Compiles an expression string. Syntax problems fail with
    /// `InvalidConditionError` carrying the original text.
    pub fn compile(text: &str) -> Result<Self, TransformError> {
        let tokens = lexer::tokenize(text).map_err(|message| invalid(text, message))?;
        let root = parser::parse(tokens).map_err(|message| invalid(text, message))?;
        Ok(Self {
            text: text.to_string(),
            root,
        })
    }

    /// The original expression text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn invalid(text: &str, message: String) -> TransformError {
    TransformError::InvalidCondition {
        expression: text.to_string(),
        message,
    }
}

/// Expression AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal number, string, boolean, or null.
    Literal(Value),
    /// A path reference resolved against the evaluation scope.
    Path(Path),
    /// A prefix operator application.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// An infix operator application.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Boolean negation, `!`.
    Not,
    /// Numeric negation, `-`.
    Neg,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    And,
    Or,
}

#[cfg(test)]
mod tests {
    use super::{BinaryOp, CompiledExpr, Expr};
    use serde_json::json;

    #[test]
    fn compiles_a_comparison() {
        let compiled = CompiledExpr::compile("$.user.age >= 18").expect("compile");
        let Expr::Binary { op, left, right } = &compiled.root else {
            panic!("expected binary node, got {:?}", compiled.root);
        };
        assert_eq!(*op, BinaryOp::Ge);
        assert!(matches!(**left, Expr::Path(_)));
        assert_eq!(**right, Expr::Literal(json!(18)));
    }

    #[test]
    fn precedence_nests_or_loosest() {
        let compiled = CompiledExpr::compile("$.a == 1 && $.b == 2 || $.c == 3").expect("compile");
        let Expr::Binary { op, .. } = &compiled.root else {
            panic!("expected binary node");
        };
        assert_eq!(*op, BinaryOp::Or);
    }

    #[test]
    fn string_operators_bind_looser_than_comparisons() {
        // Parses as ($.a) contains ('x'), not a comparison soup.
        let compiled = CompiledExpr::compile("$.a contains 'x'").expect("compile");
        let Expr::Binary { op, .. } = &compiled.root else {
            panic!("expected binary node");
        };
        assert_eq!(*op, BinaryOp::Contains);
    }

    #[test]
    fn syntax_errors_carry_the_expression_text() {
        let error = CompiledExpr::compile("$.a >=").expect_err("incomplete");
        assert_eq!(error.kind(), "InvalidConditionError");
        assert!(error.to_string().contains("$.a >="), "missing text in: {error}");
    }
}
