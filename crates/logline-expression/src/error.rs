use thiserror::Error;

/// Malformed token stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("unrecognized character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
}

/// Structural grammar violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("expression nesting exceeds {0} levels")]
    TooDeep(usize),
}

/// Semantic evaluation fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("call not allowed: {0}")]
    CallNotAllowed(String),

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("function \"{name}\" failed: {message}")]
    Host { name: String, message: String },
}

impl EvalError {
    /// Error for host functions to report a failure.
    pub fn host(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Host {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("expression matches denylisted pattern {0}")]
    Unsafe(&'static str),
}
