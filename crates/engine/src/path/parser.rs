//! Hand-written parser for the path grammar.

use crate::error::TransformError;

use super::{Path, PathSegment};

/// Parses a path string, accepting the `$`-less short form.
pub fn parse(text: &str) -> Result<Path, TransformError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(syntax(text, "path is empty"));
    }

    let mut scanner = Scanner::new(trimmed);
    let mut segments = vec![PathSegment::Root];

    if scanner.peek() == Some('$') {
        scanner.bump();
    } else {
        // Short form: "user.name" means "$.user.name".
        segments.push(PathSegment::Field(scanner.identifier().map_err(|message| syntax(text, message))?));
    }

    while let Some(ch) = scanner.peek() {
        match ch {
            '.' => {
                scanner.bump();
                if scanner.peek() == Some('.') {
                    scanner.bump();
                    let name = scanner.identifier().map_err(|message| syntax(text, message))?;
                    segments.push(PathSegment::RecursiveDescent(name));
                } else {
                    let name = scanner.identifier().map_err(|message| syntax(text, message))?;
                    segments.push(PathSegment::Field(name));
                }
            }
            '[' => {
                scanner.bump();
                segments.push(scanner.bracket_segment().map_err(|message| syntax(text, message))?);
            }
            other => {
                return Err(syntax(text, format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(Path::from_segments(segments))
}

fn syntax(path: &str, message: impl Into<String>) -> TransformError {
    TransformError::PathSyntax {
        path: path.to_string(),
        message: message.into(),
    }
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn identifier(&mut self) -> Result<String, String> {
        let mut name = String::new();
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                name.push(ch);
                self.bump();
            }
            Some(ch) => return Err(format!("expected identifier, found '{ch}'")),
            None => return Err("expected identifier, found end of path".to_string()),
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        Ok(name)
    }

    /// Parses the remainder of a bracket segment, after the opening `[`.
    fn bracket_segment(&mut self) -> Result<PathSegment, String> {
        match self.peek() {
            Some('*') => {
                self.bump();
                self.expect(']')?;
                Ok(PathSegment::Wildcard)
            }
            Some('\'') => {
                self.bump();
                let mut name = String::new();
                loop {
                    match self.bump() {
                        Some('\'') => break,
                        Some(ch) => name.push(ch),
                        None => return Err("unterminated quoted field".to_string()),
                    }
                }
                if name.is_empty() {
                    return Err("quoted field is empty".to_string());
                }
                self.expect(']')?;
                Ok(PathSegment::Field(name))
            }
            Some(ch) if ch.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(']')?;
                let index: usize = digits.parse().map_err(|_| format!("index '{digits}' out of range"))?;
                Ok(PathSegment::Index(index))
            }
            Some(ch) => Err(format!("expected index, quoted field, or '*', found '{ch}'")),
            None => Err("unterminated bracket segment".to_string()),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(format!("expected '{expected}', found '{ch}'")),
            None => Err(format!("expected '{expected}', found end of path")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::path::PathSegment;

    #[test]
    fn parses_every_segment_kind() {
        let path = parse("$.store['book title'][0][*]..price").expect("parse");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("store".into()),
                PathSegment::Field("book title".into()),
                PathSegment::Index(0),
                PathSegment::Wildcard,
                PathSegment::RecursiveDescent("price".into()),
            ]
        );
    }

    #[test]
    fn rejects_empty_and_dangling_segments() {
        for bad in ["", "$.", "$..", "$.user.", "$[", "$[]", "$['']", "$['a", "$[1", "$.9lives", "$ .a"] {
            assert!(parse(bad).is_err(), "expected '{bad}' to be rejected");
        }
    }

    #[test]
    fn negative_indices_are_rejected() {
        assert!(parse("$.items[-1]").is_err());
    }

    #[test]
    fn bare_root_is_valid() {
        let path = parse("$").expect("parse");
        assert!(path.is_root());
    }
}
