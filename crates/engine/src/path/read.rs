//! Read-path evaluation: ordered match lists over a document.

use serde_json::Value;

use super::{Path, PathSegment};

/// One match produced by read-path evaluation: the concrete location plus a
/// reference to the value found there.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch<'a> {
    /// Concrete path to the matched value (fields and indices only).
    pub path: Path,
    /// The matched value.
    pub value: &'a Value,
}

/// Evaluates a read path against a document, returning every match in
/// document order. A non-existent field yields the empty list, not null.
pub fn resolve<'a>(path: &Path, document: &'a Value) -> Vec<PathMatch<'a>> {
    let mut frontier = vec![PathMatch {
        path: Path::from_segments(vec![PathSegment::Root]),
        value: document,
    }];

    for segment in path.segments() {
        let mut next = Vec::new();
        for entry in &frontier {
            match segment {
                PathSegment::Root => {}
                PathSegment::Field(name) => {
                    if let Value::Object(map) = entry.value
                        && let Some(child) = map.get(name)
                    {
                        next.push(extend(entry, PathSegment::Field(name.clone()), child));
                    }
                }
                PathSegment::Index(index) => {
                    if let Value::Array(items) = entry.value
                        && let Some(child) = items.get(*index)
                    {
                        next.push(extend(entry, PathSegment::Index(*index), child));
                    }
                }
                PathSegment::Wildcard => match entry.value {
                    Value::Array(items) => {
                        for (index, child) in items.iter().enumerate() {
                            next.push(extend(entry, PathSegment::Index(index), child));
                        }
                    }
                    Value::Object(map) => {
                        for (key, child) in map {
                            next.push(extend(entry, PathSegment::Field(key.clone()), child));
                        }
                    }
                    _ => {}
                },
                PathSegment::RecursiveDescent(name) => {
                    descend(entry, name, &mut next);
                }
            }
        }
        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    frontier
}

/// Applies the single-value extraction rule to a match list: zero matches is
/// missing (`None`), one match is that value, several matches become an array.
pub fn resolve_single(path: &Path, document: &Value) -> Option<Value> {
    let mut matches = resolve(path, document);
    match matches.len() {
        0 => None,
        1 => Some(matches.remove(0).value.clone()),
        _ => Some(Value::Array(matches.into_iter().map(|entry| entry.value.clone()).collect())),
    }
}

fn extend<'a>(entry: &PathMatch<'a>, segment: PathSegment, value: &'a Value) -> PathMatch<'a> {
    let mut segments: Vec<PathSegment> = Vec::with_capacity(entry.path.segments().len() + 2);
    segments.push(PathSegment::Root);
    segments.extend(entry.path.segments().iter().cloned());
    segments.push(segment);
    PathMatch {
        path: Path::from_segments(segments),
        value,
    }
}

/// Pre-order traversal collecting every descendant field named `name`.
fn descend<'a>(entry: &PathMatch<'a>, name: &str, matches: &mut Vec<PathMatch<'a>>) {
    match entry.value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_entry = extend(entry, PathSegment::Field(key.clone()), child);
                if key == name {
                    matches.push(child_entry.clone());
                }
                descend(&child_entry, name, matches);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let child_entry = extend(entry, PathSegment::Index(index), child);
                descend(&child_entry, name, matches);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve, resolve_single};
    use crate::path::Path;
    use serde_json::json;

    fn doc() -> serde_json::Value {
        json!({
            "user": { "name": "Ada", "tags": ["admin", "ops"] },
            "orders": [
                { "total": 10, "lines": [{ "total": 4 }, { "total": 6 }] },
                { "total": 20, "lines": [] }
            ]
        })
    }

    #[test]
    fn field_and_index_chains_resolve() {
        let document = doc();
        let matches = resolve(&Path::parse("$.orders[1].total").expect("parse"), &document);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, &json!(20));
        assert_eq!(matches[0].path.to_string(), "$.orders[1].total");
    }

    #[test]
    fn wildcard_preserves_order() {
        let document = doc();
        let matches = resolve(&Path::parse("$.orders[*].total").expect("parse"), &document);
        let values: Vec<_> = matches.iter().map(|entry| entry.value).collect();
        assert_eq!(values, vec![&json!(10), &json!(20)]);
    }

    #[test]
    fn wildcard_walks_object_fields_in_insertion_order() {
        let document = json!({ "b": 1, "a": 2 });
        let matches = resolve(&Path::parse("$[*]").expect("parse"), &document);
        let paths: Vec<_> = matches.iter().map(|entry| entry.path.to_string()).collect();
        assert_eq!(paths, vec!["$.b", "$.a"]);
    }

    #[test]
    fn recursive_descent_is_preorder() {
        let document = doc();
        let matches = resolve(&Path::parse("$..total").expect("parse"), &document);
        let values: Vec<_> = matches.iter().map(|entry| entry.value).collect();
        assert_eq!(values, vec![&json!(10), &json!(4), &json!(6), &json!(20)]);
    }

    #[test]
    fn missing_fields_yield_the_empty_list() {
        let document = doc();
        assert!(resolve(&Path::parse("$.user.missing.deep").expect("parse"), &document).is_empty());
    }

    #[test]
    fn single_value_extraction_rule() {
        let document = doc();
        assert_eq!(resolve_single(&Path::parse("$.user.name").expect("parse"), &document), Some(json!("Ada")));
        assert_eq!(resolve_single(&Path::parse("$.user.nope").expect("parse"), &document), None);
        assert_eq!(
            resolve_single(&Path::parse("$.orders[*].total").expect("parse"), &document),
            Some(json!([10, 20]))
        );
    }

    #[test]
    fn root_resolves_to_the_document() {
        let document = doc();
        let matches = resolve(&Path::parse("$").expect("parse"), &document);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, &document);
    }
}
