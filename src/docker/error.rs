use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to socket `{path}`: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to perform HTTP handshake: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),
    #[error("invalid request path `{0}`")]
    InvalidPath(String),
    #[error("daemon responded with status {status}: {body}")]
    Status {
        status: hyper::StatusCode,
        body: String,
    },
    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),
    #[error("stats object exceeds {limit} bytes without a line break")]
    LineTooLong { limit: usize },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid timestamp `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error(transparent)]
    Container(#[from] crate::container::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
