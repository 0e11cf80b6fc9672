use serde_json::Value;

use crate::is_valid_index;

/// Get a value from a JSON tree by path.
///
/// Returns `None` as soon as a segment is missing or the current value is
/// not a container.
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Object(map) => map.get(step)?,
            Value::Array(arr) => {
                if !is_valid_index(step) {
                    return None;
                }
                arr.get(step.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value in a JSON tree by path.
pub fn get_mut<'a>(val: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Object(map) => map.get_mut(step)?,
            Value::Array(arr) => {
                if !is_valid_index(step) {
                    return None;
                }
                arr.get_mut(step.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_path;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let doc = json!({"user": {"name": "Maria", "tags": ["a", "b"]}});
        assert_eq!(get(&doc, &parse_path("user.name")), Some(&json!("Maria")));
        assert_eq!(get(&doc, &parse_path("user.tags.1")), Some(&json!("b")));
        assert_eq!(get(&doc, &parse_path("user.tags.9")), None);
        assert_eq!(get(&doc, &parse_path("user.name.first")), None);
        assert_eq!(get(&doc, &parse_path("*")), Some(&doc));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut doc = json!({"count": 1});
        if let Some(v) = get_mut(&mut doc, &parse_path("count")) {
            *v = json!(2);
        }
        assert_eq!(doc, json!({"count": 2}));
    }
}
