//! # String Templater
//!
//! Expands `{path}` placeholders and the literal `{now}` token inside concat
//! strings. Templates are compiled once into a segment list; expansion is a
//! single left-to-right pass with no re-scanning of substituted text.

use serde_json::Value;

use crate::error::TransformError;
use crate::expr::Scope;
use crate::path::Path;
use crate::value::stringify;

/// One piece of a compiled concat template.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Literal text, emitted verbatim.
    Text(String),
    /// A path placeholder; missing paths expand to the empty string.
    Path(Path),
    /// The reserved `{now}` token.
    Now,
}

/// A concat template compiled into its segments.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatTemplate {
    segments: Vec<Segment>,
}

impl ConcatTemplate {
    /// Compiles a template string. `{{` escapes a literal `{`; an unclosed
    /// placeholder is kept as literal text.
    pub fn compile(text: &str) -> Result<Self, TransformError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(start) = rest.find('{') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            if let Some(tail) = after.strip_prefix('{') {
                literal.push('{');
                rest = tail;
                continue;
            }

            let Some(end) = after.find('}') else {
                // No closing brace; keep the remainder as-is.
                literal.push('{');
                literal.push_str(after);
                rest = "";
                break;
            };

            flush(&mut segments, &mut literal);
            let placeholder = after[..end].trim();
            if placeholder == "now" {
                segments.push(Segment::Now);
            } else {
                segments.push(Segment::Path(Path::parse(placeholder)?));
            }
            rest = &after[end + 1..];
        }

        literal.push_str(rest);
        flush(&mut segments, &mut literal);
        Ok(Self { segments })
    }

    /// Expands the template against a scope. `now` is the timestamp computed
    /// once per transformation so repeated tokens agree.
    pub fn expand(&self, scope: &Scope<'_>, now: &str) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Now => output.push_str(now),
                Segment::Path(path) => {
                    let resolved = scope.resolve(path).unwrap_or(Value::Null);
                    output.push_str(&stringify(&resolved));
                }
            }
        }
        output
    }
}

fn flush(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Text(std::mem::take(literal)));
    }
}

#[cfg(test)]
mod tests {
    use super::ConcatTemplate;
    use crate::expr::Scope;
    use serde_json::json;

    fn expand(doc: &serde_json::Value, text: &str) -> String {
        ConcatTemplate::compile(text).expect("compile").expand(&Scope::new(doc), "2026-08-01T00:00:00.000Z")
    }

    #[test]
    fn expands_paths_and_literal_text() {
        let doc = json!({ "user": { "first": "Ada", "last": "Lovelace" } });
        assert_eq!(expand(&doc, "{$.user.first} {$.user.last}"), "Ada Lovelace");
    }

    #[test]
    fn missing_paths_expand_to_nothing() {
        let doc = json!({});
        assert_eq!(expand(&doc, "<{$.absent}>"), "<>");
    }

    #[test]
    fn non_string_values_are_stringified() {
        let doc = json!({ "n": 12.5, "flag": true, "nothing": null });
        assert_eq!(expand(&doc, "{$.n}/{$.flag}/{$.nothing}"), "12.5/true/");
    }

    #[test]
    fn now_token_uses_the_shared_timestamp() {
        let doc = json!({});
        assert_eq!(expand(&doc, "at {now}"), "at 2026-08-01T00:00:00.000Z");
    }

    #[test]
    fn doubled_brace_escapes_a_literal_brace() {
        let doc = json!({ "a": 1 });
        assert_eq!(expand(&doc, "{{literal} {$.a}"), "{literal} 1");
    }

    #[test]
    fn unclosed_placeholder_is_kept_verbatim() {
        let doc = json!({});
        assert_eq!(expand(&doc, "broken {$.a"), "broken {$.a");
    }

    #[test]
    fn relative_placeholder_paths_are_accepted() {
        let doc = json!({ "name": "Ada" });
        assert_eq!(expand(&doc, "hi {name}"), "hi Ada");
    }
}
