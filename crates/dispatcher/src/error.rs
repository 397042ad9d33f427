use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatcherError>;

#[derive(Error, Debug)]
pub enum DispatcherError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Unrecognized payload: {0}")]
    PayloadError(String),
}
