//! Dot-delimited path utilities.
//!
//! Paths address locations inside a JSON tree using `.` as the separator,
//! e.g. `user.profile.name`. The empty string and `*` both address the root.
//! Numeric segments index into arrays.
//!
//! # Example
//!
//! ```
//! use logline_path::{parse_path, format_path, get, set};
//! use serde_json::json;
//!
//! let path = parse_path("user.profile.name");
//! assert_eq!(path, vec!["user", "profile", "name"]);
//! assert_eq!(format_path(&path), "user.profile.name");
//!
//! let mut doc = json!({});
//! set(&mut doc, &path, json!("João")).unwrap();
//! assert_eq!(get(&doc, &path), Some(&json!("João")));
//! assert_eq!(doc, json!({"user": {"profile": {"name": "João"}}}));
//! ```

use thiserror::Error;

mod get;
pub use get::{get, get_mut};

mod set;
pub use set::{remove, set};

pub mod validate;
pub use validate::{is_identifier_path, is_identifier_segment, validate_path, ValidationError};

/// Path of the whole tree.
pub const ROOT: &str = "*";

/// Path separator.
pub const SEPARATOR: char = '.';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path has no parent")]
    NoParent,
    #[error("invalid array index: {0}")]
    InvalidIndex(String),
}

/// A parsed path: one string per segment.
pub type Path = Vec<String>;

/// Parse a dotted path into its segments.
///
/// `""` and `"*"` are the root and parse to no segments.
///
/// # Example
///
/// ```
/// use logline_path::parse_path;
///
/// assert!(parse_path("").is_empty());
/// assert!(parse_path("*").is_empty());
/// assert_eq!(parse_path("a.b"), vec!["a", "b"]);
/// ```
pub fn parse_path(path: &str) -> Path {
    if is_root_str(path) {
        return Vec::new();
    }
    path.split(SEPARATOR).map(str::to_string).collect()
}

/// Format path segments back into dotted form. The root formats as `*`.
pub fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        return ROOT.to_string();
    }
    path.join(".")
}

/// Whether the textual path addresses the root.
pub fn is_root_str(path: &str) -> bool {
    path.is_empty() || path == ROOT
}

/// Check if a path points to the root value.
pub fn is_root(path: &[String]) -> bool {
    path.is_empty()
}

/// Check if `parent` is a strict prefix of `child`.
///
/// # Example
///
/// ```
/// use logline_path::is_child;
///
/// let parent = vec!["chat".to_string()];
/// let child = vec!["chat".to_string(), "history".to_string()];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// assert!(!is_child(&child, &child));
/// ```
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && child.starts_with(parent)
}

/// Get the parent path of a given path.
pub fn parent(path: &[String]) -> Result<Path, PathError> {
    if path.is_empty() {
        return Err(PathError::NoParent);
    }
    Ok(path[..path.len() - 1].to_vec())
}

/// Strict ancestors of a dotted path, closest first, excluding the root.
///
/// # Example
///
/// ```
/// use logline_path::ancestors;
///
/// assert_eq!(ancestors("a.b.c"), vec!["a.b", "a"]);
/// assert!(ancestors("a").is_empty());
/// assert!(ancestors("*").is_empty());
/// ```
pub fn ancestors(path: &str) -> Vec<String> {
    if is_root_str(path) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut rest = path;
    while let Some(idx) = rest.rfind(SEPARATOR) {
        rest = &rest[..idx];
        out.push(rest.to_string());
    }
    out
}

/// Check if a string represents a valid non-negative integer array index.
///
/// # Example
///
/// ```
/// use logline_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("abc"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let path = parse_path("session.user.id");
        assert_eq!(path.len(), 3);
        assert_eq!(format_path(&path), "session.user.id");
        assert_eq!(format_path(&[]), "*");
    }

    #[test]
    fn test_parent() {
        let path = parse_path("a.b");
        assert_eq!(parent(&path).unwrap(), vec!["a"]);
        assert_eq!(parent(&[]), Err(PathError::NoParent));
    }

    #[test]
    fn test_ancestors_deep() {
        assert_eq!(ancestors("w.x.y.z"), vec!["w.x.y", "w.x", "w"]);
    }
}
