use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported category: {0}")]
    UnsupportedCategory(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure reported by a tracking collaborator. Never surfaced to callers of
/// the service; it only suppresses span ids and reward delivery.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking disabled")]
    Disabled,

    #[error("tracking unavailable: {0}")]
    Unavailable(String),

    #[error("tracking rejected request: {0}")]
    Rejected(String),

    #[error("tracking call timed out after {0}ms")]
    Timeout(u64),
}

/// Failure reported by a learned-store backend. Mapped to an empty lookup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("stored record is malformed: {0}")]
    Malformed(String),

    #[error("store lookup timed out after {0}ms")]
    Timeout(u64),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
