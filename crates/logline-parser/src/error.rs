use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong on a malformed line.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    #[error("property line without a block header: {0:?}")]
    MissingBlockHeader(String),
    #[error("inconsistent indentation: expected {expected} spaces, found {found}")]
    InconsistentIndent { expected: usize, found: usize },
    #[error("tabs are not allowed in indentation")]
    TabIndent,
    #[error("expected `key: value`, found {0:?}")]
    MalformedLine(String),
    #[error("block must start with `type:`, found key {0:?}")]
    MissingType(String),
    #[error("block type must be a non-empty string")]
    EmptyType,
    #[error("duplicate property {0:?}")]
    DuplicateProperty(String),
    #[error("unterminated quoted value")]
    UnterminatedString,
    #[error("invalid bind {0:?}: expected a dotted identifier path")]
    InvalidBind(String),
    #[error("invalid on {0:?}: expected `event: handler`")]
    InvalidOn(String),
}

/// Structural fault in LogLine source; fatal to the `parse` call.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("syntax error on line {line}: {kind}")]
pub struct SyntaxError {
    /// 1-based source line.
    pub line: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(line: usize, kind: SyntaxErrorKind) -> Self {
        SyntaxError { line, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    CircularReference,
    UnsafeExpression,
}

/// Non-fatal diagnostic collected on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub kind: IssueKind,
    pub message: String,
    /// Source line, when the issue comes from the parsed text itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}
