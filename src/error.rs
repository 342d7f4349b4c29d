#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("subtask already exists: {0}")]
    DuplicateSubtask(String),
    #[error("unknown subtask: {0}")]
    UnknownSubtask(String),
    #[error("subtask id is reserved for the project node: {0}")]
    ReservedId(String),
}

/// Failures at the JavaScript boundary.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("javascript error: {0}")]
    Js(String),
}

pub type Result<T, E = BoardError> = std::result::Result<T, E>;
