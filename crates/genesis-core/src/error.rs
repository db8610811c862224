pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload handed to a load path is not a usable document.
    #[error("Invalid graph data payload: {message}")]
    Validation { message: String },

    /// An operation referenced a node id that is not in the document.
    #[error("Parent node {node_id} not found")]
    NotFound { node_id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
