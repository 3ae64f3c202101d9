/// Result type for engine operations
pub type Result<T> = std::result::Result<T, KinshipError>;

/// Errors raised by the entity store collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced at the engine boundary
#[derive(Debug, thiserror::Error)]
pub enum KinshipError {
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Traversal exceeded the limit of {limit} visited people")]
    TraversalLimitExceeded { limit: usize },

    #[error("Traversal cancelled")]
    Cancelled,

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Traversal task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
