//! Precedence-climbing parser over the token stream.

use crate::path::Path;

use super::lexer::Token;
use super::{BinaryOp, Expr, UnaryOp};

/// Parses a token stream into an expression AST.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, String> {
    let mut parser = Parser { tokens, pos: 0 };
    let root = parser.expression(0)?;
    if let Some(token) = parser.peek() {
        return Err(format!("unexpected trailing token {token:?}"));
    }
    Ok(root)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Parses an expression whose operators all bind at least as tightly as
    /// `min_bp`. Classic precedence climbing; all infix operators are
    /// left-associative.
    fn expression(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut left = self.prefix()?;

        while let Some(token) = self.peek() {
            let Some((op, bp)) = infix_binding(token) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.bump();
            let right = self.expression(bp + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr, String> {
        match self.bump() {
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(Token::Path(text)) => {
                let path = Path::parse(&text).map_err(|error| error.to_string())?;
                Ok(Expr::Path(path))
            }
            Some(Token::Bang) => {
                let operand = self.expression(UNARY_BP)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Minus) => {
                let operand = self.expression(UNARY_BP)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some(Token::LeftParen) => {
                let inner = self.expression(0)?;
                match self.bump() {
                    Some(Token::RightParen) => Ok(inner),
                    Some(token) => Err(format!("expected ')', found {token:?}")),
                    None => Err("expected ')', found end of expression".to_string()),
                }
            }
            Some(token) => Err(format!("expected a value, found {token:?}")),
            None => Err("expected a value, found end of expression".to_string()),
        }
    }
}

/// Binding power of prefix operators; tighter than every infix level.
const UNARY_BP: u8 = 13;

/// Infix operator and its left binding power, loosest first.
fn infix_binding(token: &Token) -> Option<(BinaryOp, u8)> {
    let entry = match token {
        Token::OrOr => (BinaryOp::Or, 1),
        Token::AndAnd => (BinaryOp::And, 3),
        Token::Contains => (BinaryOp::Contains, 5),
        Token::StartsWith => (BinaryOp::StartsWith, 5),
        Token::EndsWith => (BinaryOp::EndsWith, 5),
        Token::EqEq => (BinaryOp::Eq, 7),
        Token::NotEq => (BinaryOp::Ne, 7),
        Token::Lt => (BinaryOp::Lt, 7),
        Token::Le => (BinaryOp::Le, 7),
        Token::Gt => (BinaryOp::Gt, 7),
        Token::Ge => (BinaryOp::Ge, 7),
        Token::Plus => (BinaryOp::Add, 9),
        Token::Minus => (BinaryOp::Sub, 9),
        Token::Star => (BinaryOp::Mul, 11),
        Token::Slash => (BinaryOp::Div, 11),
        Token::Percent => (BinaryOp::Mod, 11),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::expr::lexer::tokenize;
    use crate::expr::{BinaryOp, Expr, UnaryOp};
    use serde_json::json;

    fn parse_text(text: &str) -> Expr {
        parse(tokenize(text).expect("tokenize")).expect("parse")
    }

    #[test]
    fn arithmetic_binds_tighter_than_comparison() {
        let Expr::Binary { op, left, .. } = parse_text("$.a + 2 * 3 == 7") else {
            panic!("expected binary root");
        };
        assert_eq!(op, BinaryOp::Eq);
        let Expr::Binary { op: add, right, .. } = *left else {
            panic!("expected addition on the left");
        };
        assert_eq!(add, BinaryOp::Add);
        let Expr::Binary { op: mul, .. } = *right else {
            panic!("expected multiplication under the addition");
        };
        assert_eq!(mul, BinaryOp::Mul);
    }

    #[test]
    fn parentheses_override_precedence() {
        let Expr::Binary { op, left, .. } = parse_text("($.a || $.b) && $.c") else {
            panic!("expected binary root");
        };
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn negation_applies_to_the_nearest_operand() {
        let Expr::Binary { op, left, .. } = parse_text("!$.flag && true") else {
            panic!("expected binary root");
        };
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(*left, Expr::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn unary_minus_parses_literals() {
        let expr = parse_text("-5 + 3");
        let Expr::Binary { op: BinaryOp::Add, left, right } = expr else {
            panic!("expected addition");
        };
        assert!(matches!(*left, Expr::Unary { op: UnaryOp::Neg, .. }));
        assert_eq!(*right, Expr::Literal(json!(3)));
    }

    #[test]
    fn incomplete_expressions_fail() {
        assert!(parse(tokenize("$.a &&").expect("tokenize")).is_err());
        assert!(parse(tokenize("($.a").expect("tokenize")).is_err());
        assert!(parse(tokenize("$.a $.b").expect("tokenize")).is_err());
    }
}
