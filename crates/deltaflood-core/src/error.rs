use thiserror::Error;

/// Errors that can occur in deltaflood-core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to write line {line} to sink: {source}")]
    SinkWrite {
        line: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid change event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("invalid LSN format: {0}")]
    InvalidLsn(String),
}

pub type Result<T> = std::result::Result<T, Error>;
