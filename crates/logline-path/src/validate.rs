//! Validation functions for dotted paths.

use thiserror::Error;

use crate::{is_root_str, SEPARATOR};

/// Maximum allowed path string length.
const MAX_PATH_LENGTH: usize = 1024;

/// Maximum allowed path depth.
const MAX_PATH_DEPTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty path segment in \"{0}\"")]
    EmptySegment(String),
    #[error("path too long")]
    PathTooLong,
    #[error("path too deep")]
    PathTooDeep,
}

/// Validate a dotted path used to address a state tree.
///
/// The root (`""` or `"*"`) is valid. Otherwise every segment must be
/// non-empty, and the path must respect the length and depth limits.
///
/// # Example
///
/// ```
/// use logline_path::validate_path;
///
/// validate_path("*").unwrap();
/// validate_path("user.profile.name").unwrap();
/// validate_path("user..name").unwrap_err();
/// validate_path(".user").unwrap_err();
/// ```
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if is_root_str(path) {
        return Ok(());
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong);
    }
    let mut depth = 0;
    for segment in path.split(SEPARATOR) {
        if segment.is_empty() {
            return Err(ValidationError::EmptySegment(path.to_string()));
        }
        depth += 1;
    }
    if depth > MAX_PATH_DEPTH {
        return Err(ValidationError::PathTooDeep);
    }
    Ok(())
}

/// Whether `segment` is a bare identifier segment: ASCII letters, digits
/// and underscores only.
pub fn is_identifier_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Whether `path` is an identifier path: identifier segments separated by
/// single dots, with no whitespace or other punctuation.
///
/// # Example
///
/// ```
/// use logline_path::is_identifier_path;
///
/// assert!(is_identifier_path("user.name"));
/// assert!(is_identifier_path("items_2"));
/// assert!(!is_identifier_path("user name"));
/// assert!(!is_identifier_path("user..name"));
/// assert!(!is_identifier_path("user.name()"));
/// assert!(!is_identifier_path(""));
/// ```
pub fn is_identifier_path(path: &str) -> bool {
    path.len() <= MAX_PATH_LENGTH && path.split(SEPARATOR).all(is_identifier_segment)
}
