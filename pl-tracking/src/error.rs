use thiserror::Error;

pub type Result<T> = std::result::Result<T, SetupError>;

/// Raised while constructing a tracker, before any call is made.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid tracker config: {0}")]
    InvalidConfig(String),

    #[error("http client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for SetupError {
    fn from(e: reqwest::Error) -> Self {
        Self::Client(e.to_string())
    }
}
