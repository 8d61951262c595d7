//! Path addressing and mutation helpers for a JSON document tree laid out the
//! way the realtime database stores it: nested objects, no nulls, no empty
//! objects.

use serde_json::{Map, Value};

use crate::StoreError;

const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Split a slash separated path into its segments. Leading, trailing and
/// repeated slashes are ignored, so `""` and `"/"` both address the root.
pub fn split_path(path: &str) -> Result<Vec<String>, StoreError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment.contains(&FORBIDDEN_KEY_CHARS[..]) {
                Err(StoreError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("segment '{}' contains one of . # $ [ ]", segment),
                })
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

pub fn join_path(segments: &[String]) -> String {
    segments.join("/")
}

pub fn get<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Replace the value at `segments`. Writing `null` (or a value that prunes to
/// nothing) deletes the node and any parents left empty.
pub fn set(root: &mut Value, segments: &[String], value: Value) {
    let value = prune(value);
    if segments.is_empty() {
        *root = value;
        return;
    }

    set_at(root, segments, value);
    if is_empty(root) {
        *root = Value::Null;
    }
}

fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        if value.is_null() {
            map.remove(first);
        } else {
            map.insert(first.clone(), value);
        }
        return;
    }

    let child_empty = {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
        is_empty(child)
    };
    if child_empty {
        map.remove(first);
    }
}

/// Shallow merge: each key of `fields` may itself be a relative path.
pub fn merge(root: &mut Value, segments: &[String], fields: Map<String, Value>) -> Result<(), StoreError> {
    for (key, value) in fields {
        let mut target = segments.to_vec();
        target.extend(split_path(&key)?);
        set(root, &target, value);
    }
    Ok(())
}

/// Drop nulls and empty objects recursively. Returns `Value::Null` when
/// nothing is left.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, prune(child)))
                .filter(|(_, child)| !child.is_null())
                .collect();
            if pruned.is_empty() {
                Value::Null
            } else {
                Value::Object(pruned)
            }
        }
        other => other,
    }
}

/// Two paths overlap when one is an ancestor of (or equal to) the other.
pub fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
