use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("invalid state path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("the state root must be an object")]
    RootNotObject,
}

impl StateError {
    pub(crate) fn invalid_path(path: &str, reason: impl ToString) -> Self {
        StateError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
