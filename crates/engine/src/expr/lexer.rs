//! Hand-written lexer for the expression DSL.

use serde_json::Value;

use crate::value::number_value;

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Number, string, boolean, or null literal.
    Literal(Value),
    /// Raw path text starting with `$`, parsed by the path grammar later.
    Path(String),
    Bang,
    Star,
    Slash,
    Percent,
    Plus,
    Minus,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    AndAnd,
    OrOr,
    LeftParen,
    RightParen,
}

/// Splits an expression string into tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let ch = bytes[pos] as char;
        match ch {
            ' ' | '\t' | '\n' | '\r' => pos += 1,
            '(' => {
                tokens.push(Token::LeftParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                pos += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                pos += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                pos += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::NotEq);
                    pos += 2;
                } else {
                    tokens.push(Token::Bang);
                    pos += 1;
                }
            }
            '=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::EqEq);
                    pos += 2;
                } else {
                    return Err("'=' is not an operator; use '=='".to_string());
                }
            }
            '<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    pos += 2;
                } else {
                    tokens.push(Token::Lt);
                    pos += 1;
                }
            }
            '>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    pos += 2;
                } else {
                    tokens.push(Token::Gt);
                    pos += 1;
                }
            }
            '&' => {
                if bytes.get(pos + 1) == Some(&b'&') {
                    tokens.push(Token::AndAnd);
                    pos += 2;
                } else {
                    return Err("'&' is not an operator; use '&&'".to_string());
                }
            }
            '|' => {
                if bytes.get(pos + 1) == Some(&b'|') {
                    tokens.push(Token::OrOr);
                    pos += 2;
                } else {
                    return Err("'|' is not an operator; use '||'".to_string());
                }
            }
            '\'' | '"' => {
                let (literal, consumed) = scan_string(&text[pos..], ch)?;
                tokens.push(Token::Literal(Value::String(literal)));
                pos += consumed;
            }
            '$' => {
                let consumed = scan_path(&text[pos..])?;
                tokens.push(Token::Path(text[pos..pos + consumed].to_string()));
                pos += consumed;
            }
            ch if ch.is_ascii_digit() => {
                let (literal, consumed) = scan_number(&text[pos..])?;
                tokens.push(Token::Literal(literal));
                pos += consumed;
            }
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                let (token, consumed) = scan_word(&text[pos..])?;
                tokens.push(token);
                pos += consumed;
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

/// Scans a quoted string starting at the opening quote; returns the unquoted
/// content and the byte length consumed including both quotes.
fn scan_string(text: &str, quote: char) -> Result<(String, usize), String> {
    let mut content = String::new();
    for (offset, ch) in text.char_indices().skip(1) {
        if ch == quote {
            return Ok((content, offset + quote.len_utf8()));
        }
        content.push(ch);
    }
    Err(format!("unterminated string literal starting with {quote}"))
}

/// Scans a path token starting at `$`. Bracket groups are consumed wholesale
/// so quoted fields may contain operator characters.
fn scan_path(text: &str) -> Result<usize, String> {
    let bytes = text.as_bytes();
    let mut pos = 1usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'.' | b'_' => pos += 1,
            b'[' => {
                let mut in_quote = false;
                pos += 1;
                loop {
                    let Some(&byte) = bytes.get(pos) else {
                        return Err("unterminated bracket in path".to_string());
                    };
                    pos += 1;
                    match byte {
                        b'\'' => in_quote = !in_quote,
                        b']' if !in_quote => break,
                        _ => {}
                    }
                }
            }
            byte if (byte as char).is_ascii_alphanumeric() => pos += 1,
            _ => break,
        }
    }
    Ok(pos)
}

fn scan_number(text: &str) -> Result<(Value, usize), String> {
    let bytes = text.as_bytes();
    let mut pos = 0usize;
    let mut saw_dot = false;
    while pos < bytes.len() {
        match bytes[pos] {
            byte if (byte as char).is_ascii_digit() => pos += 1,
            b'.' if !saw_dot && bytes.get(pos + 1).map(|b| (*b as char).is_ascii_digit()).unwrap_or(false) => {
                saw_dot = true;
                pos += 1;
            }
            _ => break,
        }
    }
    let literal = &text[..pos];
    if saw_dot {
        let value: f64 = literal.parse().map_err(|_| format!("invalid number '{literal}'"))?;
        Ok((number_value(value), pos))
    } else {
        let value: i64 = literal.parse().map_err(|_| format!("invalid number '{literal}'"))?;
        Ok((Value::from(value), pos))
    }
}

fn scan_word(text: &str) -> Result<(Token, usize), String> {
    let end = text
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_alphanumeric() && *ch != '_')
        .map(|(offset, _)| offset)
        .unwrap_or(text.len());
    let word = &text[..end];
    let token = match word {
        "true" => Token::Literal(Value::Bool(true)),
        "false" => Token::Literal(Value::Bool(false)),
        "null" => Token::Literal(Value::Null),
        "contains" => Token::Contains,
        "startsWith" => Token::StartsWith,
        "endsWith" => Token::EndsWith,
        other => return Err(format!("unknown keyword '{other}'")),
    };
    Ok((token, end))
}
