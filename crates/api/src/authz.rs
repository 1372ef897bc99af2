//! Request authentication and role gating.
//!
//! Two explicit steps, each returning early on failure: `authenticate`
//! turns the `Authorization` header into a [`Principal`], then
//! `authorize_role` checks it against the role a route requires.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use greengrocer_auth::{AuthzError, Principal, Role, TokenIssuer, authorize};

/// Why a request was turned away before reaching its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No header, or no token part in it.
    TokenRequired,
    /// Bad signature, malformed or expired token.
    InvalidToken,
    Forbidden(AuthzError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthRejection::TokenRequired => (StatusCode::UNAUTHORIZED, "Token required".to_string()),
            AuthRejection::InvalidToken => (StatusCode::FORBIDDEN, "Invalid token".to_string()),
            AuthRejection::Forbidden(e) => (StatusCode::FORBIDDEN, e.to_string()),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// The token is the second space-separated part of the header value
/// (`Bearer <token>`). An empty part counts as absent.
fn token_part(headers: &HeaderMap) -> Result<Option<&str>, AuthRejection> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthRejection::InvalidToken)?;
    Ok(value.split(' ').nth(1).filter(|t| !t.is_empty()))
}

pub fn authenticate(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<Principal, AuthRejection> {
    let token = token_part(headers)?.ok_or(AuthRejection::TokenRequired)?;
    match tokens.verify(token) {
        Ok(claims) => Ok(Principal::from(&claims)),
        Err(e) if e.is_missing() => Err(AuthRejection::TokenRequired),
        Err(_) => Err(AuthRejection::InvalidToken),
    }
}

pub fn authorize_role(principal: &Principal, required: Role) -> Result<(), AuthRejection> {
    authorize(principal, required).map_err(|e| {
        tracing::debug!(user_id = %principal.user_id, role = %principal.role, required = %required, "role gate denied");
        AuthRejection::Forbidden(e)
    })
}
