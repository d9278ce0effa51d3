use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing, tombstoned, or owned by someone else. These cases are
    /// reported identically.
    #[error("no such card owned by you: {0}")]
    NoSuchCard(Uuid),

    #[error("graph card {0} already exists")]
    DuplicateIdentity(Uuid),

    #[error("caller identity missing or not accepted")]
    OwnershipDenied,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by transports to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateIdentity,
    OwnershipDenied,
    InvalidInput,
    Internal,
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::NotFound(_) | GraphError::NoSuchCard(_) => ErrorKind::NotFound,
            GraphError::DuplicateIdentity(_) => ErrorKind::DuplicateIdentity,
            GraphError::OwnershipDenied => ErrorKind::OwnershipDenied,
            GraphError::InvalidInput(_) => ErrorKind::InvalidInput,
            GraphError::Storage(_) | GraphError::Encoding(_) | GraphError::Io(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_card_is_reported_as_not_found() {
        let err = GraphError::NoSuchCard(Uuid::new_v4());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err = GraphError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
