use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed observation: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: rejected observation: {reason}")]
    InvalidObservation { line: usize, reason: String },

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Storage error: {0}")]
    Storage(#[from] linkmap_core::GraphError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
