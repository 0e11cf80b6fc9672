//! Denylist pre-filter for expression text.
//!
//! This runs before any parsing. It does not replace the evaluator's call
//! allow-list; it rejects text that names code-execution primitives, object
//! introspection, host globals or dialogs.

use std::sync::OnceLock;

use regex::RegexSet;

use crate::token::tokenize;

const DANGEROUS_PATTERNS: [&str; 15] = [
    r"eval\s*\(",
    r"Function\s*\(",
    r"constructor",
    r"prototype",
    r"__proto__",
    r"import\s*\(",
    r"require\s*\(",
    r"process\.",
    r"global\.",
    r"globalThis",
    r"window\.",
    r"document\.",
    r"alert\s*\(",
    r"confirm\s*\(",
    r"prompt\s*\(",
];

fn dangerous_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(DANGEROUS_PATTERNS).unwrap())
}

/// Whether the text matches any denylisted pattern.
pub fn is_dangerous(text: &str) -> bool {
    dangerous_set().is_match(text)
}

/// The first denylisted pattern the text matches.
pub fn find_dangerous_pattern(text: &str) -> Option<&'static str> {
    dangerous_set()
        .matches(text)
        .iter()
        .next()
        .map(|i| DANGEROUS_PATTERNS[i])
}

/// `false` when the text is denylisted or does not tokenize.
///
/// # Example
///
/// ```
/// use logline_expression::validate_expression;
///
/// assert!(validate_expression("user.age > 18 && user.active"));
/// assert!(!validate_expression("eval('1')"));
/// assert!(!validate_expression("a.constructor"));
/// assert!(!validate_expression("'unterminated"));
/// ```
pub fn validate_expression(text: &str) -> bool {
    !is_dangerous(text) && tokenize(text).is_ok()
}
