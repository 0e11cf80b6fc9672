use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delivered to a subscriber after a write at or below its path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Path the subscriber registered for.
    pub path: String,
    /// Current value at `path`; `None` when absent.
    pub value: Option<Value>,
    /// Path that was written.
    pub changed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    SetState,
    Reset,
}

/// Record handed to middleware before a mutation is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub path: String,
    pub value: Value,
}

impl Action {
    pub fn set_state(path: impl Into<String>, value: Value) -> Self {
        Action {
            kind: ActionKind::SetState,
            path: path.into(),
            value,
        }
    }

    pub fn reset() -> Self {
        Action {
            kind: ActionKind::Reset,
            path: logline_path::ROOT.to_string(),
            value: Value::Object(Default::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_wire_shape() {
        let action = Action::set_state("test", json!("value"));
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"type": "SET_STATE", "path": "test", "value": "value"})
        );
        assert_eq!(serde_json::to_value(Action::reset()).unwrap()["type"], "RESET");
    }
}
