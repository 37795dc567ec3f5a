use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const SESSION_HEADER: &str = "x-session-id";

/// Client tab identifier; one admin session per value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Rejection type returned when the session header is unusable.
#[derive(Debug)]
pub enum SessionError {
    MissingSession,
    InvalidSession,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let msg = match self {
            SessionError::MissingSession => "missing x-session-id header",
            SessionError::InvalidSession => "invalid x-session-id header",
        };
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": msg })),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_HEADER)
            .ok_or(SessionError::MissingSession)?;
        let value = raw
            .to_str()
            .map_err(|_| SessionError::InvalidSession)?
            .trim();
        if value.is_empty() || value.len() > 128 {
            return Err(SessionError::InvalidSession);
        }
        Ok(SessionId(value.to_string()))
    }
}
