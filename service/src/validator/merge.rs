//! Merging of intersection outputs

use fastschema_core::issue::PathSegment;
use serde_json::Value;

/// Merge two validated outputs.
///
/// Objects merge key-wise. A key present on both sides is merged
/// recursively when both values are objects, is a conflict when exactly one
/// of them is, and otherwise takes the right value. Outside objects the two
/// outputs must be equal.
///
/// On conflict returns the path of the conflicting value, relative to the
/// merged root.
pub(crate) fn merge_outputs(left: Value, right: Value) -> Result<Value, Vec<PathSegment>> {
    match (left, right) {
        (Value::Object(mut merged), Value::Object(right)) => {
            for (key, right_value) in right {
                let value = match merged.remove(&key) {
                    Some(left_value) => merge_field(left_value, right_value).map_err(|mut path| {
                        path.insert(0, PathSegment::Key(key.clone()));
                        path
                    })?,
                    None => right_value,
                };
                merged.insert(key, value);
            }
            Ok(Value::Object(merged))
        }
        (left, right) if left == right => Ok(right),
        _ => Err(Vec::new()),
    }
}

fn merge_field(left: Value, right: Value) -> Result<Value, Vec<PathSegment>> {
    match (&left, &right) {
        (Value::Object(_), Value::Object(_)) => merge_outputs(left, right),
        (Value::Object(_), _) | (_, Value::Object(_)) => Err(Vec::new()),
        _ => Ok(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_right_side_wins_on_scalars() {
        let merged = merge_outputs(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}));
        assert_eq!(merged, Ok(json!({"a": 1, "b": 3, "c": 4})));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let merged = merge_outputs(
            json!({"meta": {"id": 1}, "name": "x"}),
            json!({"meta": {"tag": "t"}}),
        );
        assert_eq!(merged, Ok(json!({"meta": {"id": 1, "tag": "t"}, "name": "x"})));
    }

    #[test]
    fn test_conflicts_report_their_path() {
        let conflict = merge_outputs(
            json!({"meta": {"id": {"x": 1}}}),
            json!({"meta": {"id": 5}}),
        );
        assert_eq!(
            conflict,
            Err(vec![PathSegment::key("meta"), PathSegment::key("id")])
        );
        assert_eq!(merge_outputs(json!("a"), json!("b")), Err(Vec::new()));
        assert_eq!(merge_outputs(json!([1]), json!([1])), Ok(json!([1])));
    }
}
