use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use greengrocer_auth::{UserAccount, validate_new_user};
use greengrocer_infra::Filter;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

const USER_EXISTS: &str = "User already exists.";

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let new_user = validate_new_user(&body, &services.free_domains)?;

    let existing = services
        .users
        .find_one(&Filter::eq("email", new_user.email.as_str()))
        .await
        .map_err(ApiError::store("Error while signing up"))?;
    if existing.is_some() {
        return Err(ApiError::bad_request(USER_EXISTS));
    }

    let hash = services.hash_password(new_user.password.clone()).await?;
    match services.users.insert_one(UserAccount::from_new(new_user, hash)).await {
        Ok(saved) => {
            tracing::info!(user_id = %saved.id, role = %saved.document.user_type, "user signed up");
            Ok((StatusCode::CREATED, Json(json!({ "message": "User created successfully" }))).into_response())
        }
        // Lost a race with a concurrent signup for the same email.
        Err(e) if e.is_duplicate() => Err(ApiError::bad_request(USER_EXISTS)),
        Err(e) => Err(ApiError::store("Error while signing up")(e)),
    }
}

fn login_failed(err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "login failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "message": "Error occurred while trying to login",
            "error": err.to_string(),
        })),
    )
        .into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    let text = |key: &str| body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    let (Some(email), Some(password)) = (text("email"), text("password")) else {
        return ApiError::message(StatusCode::BAD_REQUEST, "Email and password are required").into_response();
    };

    let user = match services.users.find_one(&Filter::eq("email", email.trim())).await {
        Ok(Some(user)) => user,
        Ok(None) => return ApiError::message(StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => return login_failed(e),
    };

    match services
        .verify_password(password.to_string(), user.document.password_hash.clone())
        .await
    {
        Ok(true) => {}
        Ok(false) => return ApiError::message(StatusCode::BAD_REQUEST, "Wrong password").into_response(),
        Err(e) => return login_failed(e),
    }

    match services.tokens.issue(user.id, user.document.user_type) {
        Ok(token) => {
            tracing::info!(user_id = %user.id, "login succeeded");
            Json(json!({ "token": token, "message": "Login was a success" })).into_response()
        }
        Err(e) => login_failed(e),
    }
}
