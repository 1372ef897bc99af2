//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, hasher, token issuer, free-email domain set
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: query/response DTOs and JSON projections
//! - `listing.rs` / `batch.rs`: shared list and bulk-insert helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use greengrocer_auth::Role;

use crate::middleware;

pub mod batch;
pub mod dto;
pub mod errors;
pub mod listing;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let admin_only = middleware::AuthState {
        tokens: services.tokens.clone(),
        required: Role::Admin,
    };

    // User management: token + Admin role on every matched route.
    let users = routes::users::router().route_layer(axum::middleware::from_fn_with_state(
        admin_only,
        middleware::require_role,
    ));

    let api = Router::new()
        .nest("/userAuth", routes::auth::router())
        .nest("/users", users)
        .nest("/vegetables", routes::vegetables::router());

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        // A known path with the wrong method answers like an unknown path.
        .method_not_allowed_fallback(routes::system::not_found)
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
