//! Path helpers over a JSON document tree.
//!
//! Realtime-store paths look like `settings/layout` or
//! `analytics/selectedItems/3`. Objects are addressed by key, arrays by
//! numeric segment. A `null` leaf is treated as absent.

use super::interface::StoreError;
use serde_json::{Map, Value};

/// Characters the realtime database refuses inside a key.
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Split a store path into segments, rejecting empty or forbidden keys.
/// The root path (`""` or `"/"`) yields no segments.
pub fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split('/')
        .map(|seg| {
            if seg.is_empty() || seg.contains(FORBIDDEN_KEY_CHARS) {
                Err(StoreError::InvalidPath(path.to_string()))
            } else {
                Ok(seg)
            }
        })
        .collect()
}

/// Whether a change at `changed` can affect the value observed at `watched`.
pub fn overlaps(watched: &str, changed: &str) -> bool {
    let w = watched.trim_matches('/');
    let c = changed.trim_matches('/');
    if w.is_empty() || c.is_empty() {
        return true;
    }
    let is_prefix = |short: &str, long: &str| {
        long == short || long.starts_with(&format!("{}/", short))
    };
    is_prefix(w, c) || is_prefix(c, w)
}

pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in path {
        node = match node {
            Value::Object(map) => map.get(*seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Write `value` at `path`, creating intermediate objects. Writing `null`
/// removes the leaf.
pub fn write(root: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for seg in parents {
        node = child_mut(node, seg);
    }

    if value.is_null() {
        remove_child(node, last);
    } else {
        *child_mut(node, last) = value;
    }
}

/// Shallow-merge the keys of `patch` into the object at `path`.
pub fn merge(root: &mut Value, path: &[&str], patch: Map<String, Value>) {
    for (key, value) in patch {
        let mut child_path: Vec<&str> = path.to_vec();
        child_path.push(&key);
        write(root, &child_path, value);
    }
}

fn child_mut<'a>(node: &'a mut Value, seg: &str) -> &'a mut Value {
    let index = match (&*node, seg.parse::<usize>()) {
        (Value::Array(_), Ok(idx)) => Some(idx),
        _ => None,
    };
    if index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match (node, index) {
        (Value::Array(items), Some(idx)) => {
            if idx >= items.len() {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        (Value::Object(map), _) => map.entry(seg.to_string()).or_insert(Value::Null),
        _ => unreachable!("node is either an indexed array or an object here"),
    }
}

fn remove_child(node: &mut Value, seg: &str) {
    match node {
        Value::Object(map) => {
            map.remove(seg);
        }
        Value::Array(items) => {
            if let Ok(idx) = seg.parse::<usize>() {
                if idx < items.len() {
                    items[idx] = Value::Null;
                }
            }
        }
        _ => {}
    }
}
