//! Write-path evaluation: placing a value at a deterministic location,
//! creating intermediate containers on demand.

use serde_json::{Map, Value};

use crate::error::TransformError;

use super::{Path, PathSegment};

/// Writes `value` at `path` inside `target`.
///
/// Intermediate objects are created for field segments and arrays for index
/// segments when `create_paths` is set; arrays are padded with nulls up to the
/// requested index. The final assignment replaces whatever is at the leaf.
///
/// With `create_paths` unset, a missing container or out-of-range index fails
/// with `PathNotFoundError` and a shape mismatch (writing through a field of a
/// non-object, or an index of a non-array) fails with `PathConflictError`.
pub fn write(target: &mut Value, path: &Path, value: Value, create_paths: bool) -> Result<(), TransformError> {
    let segments = path.segments();
    if segments.is_empty() {
        *target = value;
        return Ok(());
    }

    let mut current = target;
    for (position, segment) in segments.iter().enumerate() {
        let is_leaf = position + 1 == segments.len();
        match segment {
            PathSegment::Field(name) => {
                if !current.is_object() {
                    if !create_paths {
                        return Err(conflict(path, position, "expected an object"));
                    }
                    *current = Value::Object(Map::new());
                }
                let map = current.as_object_mut().expect("object ensured above");
                if is_leaf {
                    map.insert(name.clone(), value);
                    return Ok(());
                }
                if !map.contains_key(name) {
                    if !create_paths {
                        return Err(TransformError::PathNotFound { path: path.to_string() });
                    }
                    map.insert(name.clone(), Value::Null);
                }
                current = map.get_mut(name).expect("inserted above");
            }
            PathSegment::Index(index) => {
                if !current.is_array() {
                    if !create_paths {
                        return Err(conflict(path, position, "expected an array"));
                    }
                    *current = Value::Array(Vec::new());
                }
                let items = current.as_array_mut().expect("array ensured above");
                if *index >= items.len() {
                    if !create_paths {
                        return Err(TransformError::PathNotFound { path: path.to_string() });
                    }
                    items.resize(*index + 1, Value::Null);
                }
                if is_leaf {
                    items[*index] = value;
                    return Ok(());
                }
                current = &mut items[*index];
            }
            PathSegment::Root | PathSegment::Wildcard | PathSegment::RecursiveDescent(_) => {
                return Err(TransformError::PathSyntax {
                    path: path.to_string(),
                    message: "write paths must contain only fields and indices".to_string(),
                });
            }
        }
    }

    Ok(())
}

fn conflict(path: &Path, position: usize, expected: &str) -> TransformError {
    let mut prefix = String::from("$");
    for segment in path.segments().iter().take(position) {
        prefix.push_str(&segment.to_string());
    }
    TransformError::PathConflict {
        path: path.to_string(),
        message: format!("{expected} at '{prefix}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::write;
    use crate::error::TransformError;
    use crate::path::Path;
    use serde_json::{Value, json};

    fn write_at(target: &mut Value, path: &str, value: Value, create_paths: bool) -> Result<(), TransformError> {
        write(target, &Path::parse_write(path).expect("parse"), value, create_paths)
    }

    #[test]
    fn creates_intermediate_objects() {
        let mut target = json!({});
        write_at(&mut target, "$.customer.contact.email", json!("a@b.c"), true).expect("write");
        assert_eq!(target, json!({ "customer": { "contact": { "email": "a@b.c" } } }));
    }

    #[test]
    fn absent_array_is_padded_with_nulls() {
        let mut target = json!({});
        write_at(&mut target, "$.a[3]", json!("x"), true).expect("write");
        assert_eq!(target, json!({ "a": [null, null, null, "x"] }));
    }

    #[test]
    fn rewrites_overwrite_in_place() {
        let mut target = json!({});
        write_at(&mut target, "$.k", json!(1), true).expect("write");
        write_at(&mut target, "$.k", json!(2), true).expect("write");
        assert_eq!(target, json!({ "k": 2 }));
    }

    #[test]
    fn key_order_reflects_first_write() {
        let mut target = json!({});
        write_at(&mut target, "$.b", json!(1), true).expect("write");
        write_at(&mut target, "$.a", json!(2), true).expect("write");
        write_at(&mut target, "$.b", json!(3), true).expect("write");
        let keys: Vec<_> = target.as_object().expect("object").keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn scalar_is_overwritten_by_a_deeper_write_when_creating_paths() {
        let mut target = json!({ "a": 1 });
        write_at(&mut target, "$.a.b", json!(2), true).expect("write");
        assert_eq!(target, json!({ "a": { "b": 2 } }));
    }

    #[test]
    fn conflicts_fail_without_create_paths() {
        let mut target = json!({ "a": 1 });
        let error = write_at(&mut target, "$.a.b", json!(2), false).expect_err("conflict");
        assert_eq!(error.kind(), "PathConflictError");
    }

    #[test]
    fn missing_intermediates_fail_without_create_paths() {
        let mut target = json!({});
        let error = write_at(&mut target, "$.a.b", json!(2), false).expect_err("not found");
        assert_eq!(error.kind(), "PathNotFoundError");

        let mut target = json!({ "a": {} });
        let error = write_at(&mut target, "$.a.b.c", json!(2), false).expect_err("not found");
        assert_eq!(error.kind(), "PathNotFoundError");
    }

    #[test]
    fn out_of_range_index_fails_without_create_paths() {
        let mut target = json!({ "a": [0] });
        let error = write_at(&mut target, "$.a[4]", json!(1), false).expect_err("out of range");
        assert_eq!(error.kind(), "PathNotFoundError");
    }

    #[test]
    fn writing_at_root_replaces_the_document() {
        let mut target = json!({ "old": true });
        write(&mut target, &Path::parse("$").expect("parse"), json!({ "new": true }), true).expect("write");
        assert_eq!(target, json!({ "new": true }));
    }
}
