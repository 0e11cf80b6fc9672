use serde_json::{Map, Value};

use crate::{is_valid_index, PathError};

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Intermediate values that are neither objects nor arrays are replaced by
/// empty objects. Array segments must be a valid index no greater than the
/// array length; an index equal to the length appends. The empty path
/// replaces the whole tree.
pub fn set(doc: &mut Value, path: &[String], value: Value) -> Result<(), PathError> {
    let Some((leaf, parents)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };

    let mut current = doc;
    for step in parents {
        current = child_or_insert(current, step)?;
    }

    match current {
        Value::Array(arr) => {
            let idx = array_index(step_to_index(leaf)?, arr.len(), leaf)?;
            if idx == arr.len() {
                arr.push(value);
            } else {
                arr[idx] = value;
            }
        }
        Value::Object(map) => {
            map.insert(leaf.clone(), value);
        }
        other => {
            let mut map = Map::new();
            map.insert(leaf.clone(), value);
            *other = Value::Object(map);
        }
    }
    Ok(())
}

/// Remove the value at `path`, returning it. Removing the root is a no-op.
pub fn remove(doc: &mut Value, path: &[String]) -> Option<Value> {
    let (leaf, parents) = path.split_last()?;
    let container = crate::get_mut(doc, parents)?;
    match container {
        Value::Object(map) => map.shift_remove(leaf),
        Value::Array(arr) => {
            if !is_valid_index(leaf) {
                return None;
            }
            let idx: usize = leaf.parse().ok()?;
            (idx < arr.len()).then(|| arr.remove(idx))
        }
        _ => None,
    }
}

fn child_or_insert<'a>(current: &'a mut Value, step: &str) -> Result<&'a mut Value, PathError> {
    let child = match current {
        Value::Array(arr) => {
            let idx = array_index(step_to_index(step)?, arr.len(), step)?;
            if idx == arr.len() {
                arr.push(Value::Object(Map::new()));
            }
            &mut arr[idx]
        }
        Value::Object(map) => map
            .entry(step.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
        other => {
            *other = Value::Object(Map::new());
            return child_or_insert(other, step);
        }
    };
    if !matches!(child, Value::Object(_) | Value::Array(_)) {
        *child = Value::Object(Map::new());
    }
    Ok(child)
}

fn step_to_index(step: &str) -> Result<usize, PathError> {
    if !is_valid_index(step) {
        return Err(PathError::InvalidIndex(step.to_string()));
    }
    step.parse()
        .map_err(|_| PathError::InvalidIndex(step.to_string()))
}

fn array_index(idx: usize, len: usize, step: &str) -> Result<usize, PathError> {
    if idx > len {
        return Err(PathError::InvalidIndex(step.to_string()));
    }
    Ok(idx)
}
