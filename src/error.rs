use hyper::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Message cannot be empty.")]
    EmptyMessage,

    #[error("transport error: {0}")]
    Transport(#[from] hyper::Error),

    #[error("broker responded with status {0}")]
    Status(StatusCode),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("store I/O error: {0}")]
    Store(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid policy: {0}")]
    Policy(String),
}

impl Error {
    /// Whether a producer or consumer should try the same call again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Status(_) | Error::Decode(_) => true,
            Error::Store(_) => true,
            Error::EmptyMessage
            | Error::InvalidEndpoint(_)
            | Error::Config(_)
            | Error::Policy(_) => false,
        }
    }
}
