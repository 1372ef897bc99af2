use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use greengrocer_core::FieldErrors;
use greengrocer_infra::StoreError;

/// Handler failure, rendered with the JSON envelope its status class uses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 `{"error": msg}`.
    #[error("{0}")]
    BadRequest(String),

    /// 404 `{"error": msg}`.
    #[error("{0}")]
    NotFound(String),

    /// `{"message": msg}` with the given status (auth and batch endpoints).
    #[error("{message}")]
    Message { status: StatusCode, message: String },

    /// 500 `{"error": context}`; the source is logged, not returned.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// 500 `{"error": msg}`.
    #[error("{0}")]
    Internal(String),

    /// Framework-level failures (malformed JSON, wrong content type):
    /// `{"success": false, "message": msg}` with the failure's own status.
    #[error("{message}")]
    Unhandled { status: StatusCode, message: String },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn message(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Message {
            status,
            message: msg.into(),
        }
    }

    /// Wrap a store failure with the text the client sees.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Message { status, .. } | ApiError::Unhandled { status, .. } => *status,
            ApiError::Store { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Single-record endpoints report the first failed rule only.
impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        let message = errors.first_message().unwrap_or("Invalid request body").to_string();
        ApiError::BadRequest(message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unhandled {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Unhandled {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => json!({ "error": msg }),
            ApiError::Message { message, .. } => json!({ "message": message }),
            ApiError::Store { context, source } => {
                tracing::error!(error = %source, "{context}");
                json!({ "error": context })
            }
            ApiError::Unhandled { message, .. } => {
                tracing::warn!(status = status.as_u16(), %message, "request rejected");
                json!({ "success": false, "message": message })
            }
        };
        if let ApiError::Internal(msg) = &self {
            tracing::error!(error = %msg, "internal error");
        }
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_field_error_becomes_the_message() {
        let mut errors = FieldErrors::new();
        errors.push("name", "name is required");
        errors.push("price", "price is required");
        let err = ApiError::from(errors);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn store_errors_are_500() {
        let err = ApiError::store("Error fetching users")(StoreError::Backend("down".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
