use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid timer mode: {0:?}")]
    InvalidMode(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("drawing surface error: {0}")]
    Surface(String),

    #[error("tick scheduler error: {0}")]
    Scheduler(String),
}

pub type Result<T> = std::result::Result<T, Error>;
