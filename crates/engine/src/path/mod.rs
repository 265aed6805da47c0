//! # Path Resolver
//!
//! Selector expressions rooted at `$` that identify values within a JSON
//! document. Read paths may fan out through wildcards (`[*]`) and recursive
//! descent (`..name`) and evaluate to an ordered match list; write paths are
//! deterministic (`$` plus fields and indices only) and designate a single
//! destination, creating intermediate containers on demand.
//!
//! The supported grammar is a documented subset of JSONPath:
//!
//! ```text
//! path     := '$' segment*
//! segment  := '.' ident | '..' ident | '[' index ']' | '[' '\'' quoted '\'' ']' | '[*]'
//! ident    := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! Paths written without the leading `$` are accepted as a short form and
//! treated as `$.`-prefixed.

mod parser;
mod read;
mod write;

pub use read::{PathMatch, resolve, resolve_single};
pub use write::write;

use std::fmt;

use crate::error::TransformError;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// The leading `$`.
    Root,
    /// Property access: `.name` or `['name']`.
    Field(String),
    /// Array element access: `[3]`.
    Index(usize),
    /// All elements of an array or all fields of an object: `[*]`.
    Wildcard,
    /// Every descendant matching the name, pre-order: `..name`. Read-only.
    RecursiveDescent(String),
}

/// A parsed path: the root plus an ordered segment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Parses a path, accepting the `$`-less short form.
    pub fn parse(text: &str) -> Result<Self, TransformError> {
        parser::parse(text)
    }

    /// Parses a write path: deterministic, fields and indices only.
    pub fn parse_write(text: &str) -> Result<Self, TransformError> {
        let path = parser::parse(text)?;
        if let Some(segment) = path
            .segments
            .iter()
            .find(|segment| matches!(segment, PathSegment::Wildcard | PathSegment::RecursiveDescent(_)))
        {
            return Err(TransformError::PathSyntax {
                path: text.to_string(),
                message: format!("write paths must be deterministic, found '{segment}'"),
            });
        }
        Ok(path)
    }

    pub(crate) fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Segments after the leading root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments[1..]
    }

    /// True when the path is just `$`.
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// True when no segment fans out (no wildcard or recursive descent).
    pub fn is_deterministic(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|segment| matches!(segment, PathSegment::Wildcard | PathSegment::RecursiveDescent(_)))
    }

    /// Splits off the leading `item` field, if any. Per-item evaluation scopes
    /// use this to route `$.item...` references at the innermost frame.
    pub fn strip_item_prefix(&self) -> Option<Path> {
        match self.segments.get(1) {
            Some(PathSegment::Field(name)) if name == "item" => {
                let mut segments = vec![PathSegment::Root];
                segments.extend(self.segments[2..].iter().cloned());
                Some(Path::from_segments(segments))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("$"),
            Self::Field(name) => {
                if is_plain_identifier(name) {
                    write!(f, ".{name}")
                } else {
                    write!(f, "['{name}']")
                }
            }
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Wildcard => f.write_str("[*]"),
            Self::RecursiveDescent(name) => write!(f, "..{name}"),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::{Path, PathSegment};

    #[test]
    fn display_round_trips_plain_paths() {
        for text in ["$", "$.user.name", "$.items[0].id", "$.files[*]", "$..total"] {
            let path = Path::parse(text).expect("parse");
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn short_form_gains_the_root() {
        let path = Path::parse("user.name").expect("parse");
        assert_eq!(path.to_string(), "$.user.name");
    }

    #[test]
    fn quoted_fields_keep_their_quoting() {
        let path = Path::parse("$['first name']").expect("parse");
        assert_eq!(path.segments(), &[PathSegment::Field("first name".into())]);
        assert_eq!(path.to_string(), "$['first name']");
    }

    #[test]
    fn write_paths_reject_fanout() {
        assert!(Path::parse_write("$.a.b[3]").is_ok());
        assert!(Path::parse_write("$.a[*]").is_err());
        assert!(Path::parse_write("$..a").is_err());
    }

    #[test]
    fn item_prefix_is_detected() {
        let path = Path::parse("$.item.amount").expect("parse");
        let stripped = path.strip_item_prefix().expect("item-relative");
        assert_eq!(stripped.to_string(), "$.amount");
        assert!(Path::parse("$.amount").expect("parse").strip_item_prefix().is_none());
    }
}
