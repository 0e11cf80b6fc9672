//! Checks for the reserved `bind` and `on` properties.

use std::sync::OnceLock;

use logline_expression::validate_expression;
use logline_path::is_identifier_path;
use regex::Regex;

fn event_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*:\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*$").unwrap()
    })
}

/// `bind` must be a dotted identifier path that also passes the expression
/// denylist.
pub fn is_valid_bind(value: &str) -> bool {
    is_identifier_path(value) && validate_expression(value)
}

/// `on` must read `event: handler` with bare identifiers on both sides.
pub fn is_valid_on(value: &str) -> bool {
    event_regex().is_match(value)
}

/// Split a valid `event: handler` binding.
pub fn split_event_binding(value: &str) -> Option<(&str, &str)> {
    let caps = event_regex().captures(value)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind() {
        assert!(is_valid_bind("user.name"));
        assert!(is_valid_bind("chat.history"));
        assert!(is_valid_bind("count"));
        assert!(!is_valid_bind("user name"));
        assert!(!is_valid_bind("user..name"));
        assert!(!is_valid_bind(".user"));
        assert!(!is_valid_bind("user[0]"));
        assert!(!is_valid_bind("obj.constructor"));
        assert!(!is_valid_bind(""));
    }

    #[test]
    fn test_on() {
        assert!(is_valid_on("click: sendMessage"));
        assert!(is_valid_on("submit:save"));
        assert!(!is_valid_on("click => alert('invalid')"));
        assert!(!is_valid_on("click: send()"));
        assert!(!is_valid_on("click: a: b"));
        assert!(!is_valid_on("click"));
        assert_eq!(
            split_event_binding(" change : update "),
            Some(("change", "update"))
        );
    }
}
