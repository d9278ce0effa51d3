use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkmap_core::{ErrorKind, GraphError};
use serde_json::json;
use tracing::error;

const INTERNAL_MESSAGE: &str = "internal server error";

/// Transport-level failure. Internal details are logged, never returned.
#[derive(Debug)]
pub enum ApiError {
    Graph(GraphError),
    BadRequest(String),
    Internal(String),
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        ApiError::Graph(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("storage task failed: {}", err))
    }
}

fn message(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "message": msg.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => message(StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("{}", msg);
                message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
            ApiError::Graph(err) => match err.kind() {
                ErrorKind::NotFound => match err {
                    GraphError::NoSuchCard(_) => message(StatusCode::NOT_FOUND, err.to_string()),
                    _ => StatusCode::NO_CONTENT.into_response(),
                },
                ErrorKind::DuplicateIdentity => message(StatusCode::CONFLICT, err.to_string()),
                ErrorKind::OwnershipDenied => message(StatusCode::UNAUTHORIZED, err.to_string()),
                ErrorKind::InvalidInput => message(StatusCode::BAD_REQUEST, err.to_string()),
                ErrorKind::Internal => {
                    error!("{}", err);
                    message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GraphError::NotFound("node 1".to_string()), StatusCode::NO_CONTENT),
            (GraphError::NoSuchCard(Uuid::new_v4()), StatusCode::NOT_FOUND),
            (GraphError::DuplicateIdentity(Uuid::new_v4()), StatusCode::CONFLICT),
            (GraphError::OwnershipDenied, StatusCode::UNAUTHORIZED),
            (GraphError::InvalidInput("x".to_string()), StatusCode::BAD_REQUEST),
            (
                GraphError::Io(std::io::Error::other("disk gone")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
