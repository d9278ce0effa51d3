use super::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use linkmap_core::GraphError;
use uuid::Uuid;

/// Verified caller identity, taken from `Authorization: Bearer <uuid>`.
///
/// Token issuance and verification happen upstream; this only reads the
/// identity that was handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub Uuid);

pub fn owner_from_header(value: Option<&str>) -> Option<Uuid> {
    let token = value?.trim().strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        owner_from_header(header)
            .map(Owner)
            .ok_or(ApiError::Graph(GraphError::OwnershipDenied))
    }
}
