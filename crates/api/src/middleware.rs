use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use greengrocer_auth::{Role, TokenIssuer};

use crate::authz::{self, AuthRejection};
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenIssuer>,
    pub required: Role,
}

/// Authenticate, then gate on `state.required`. The resulting
/// [`PrincipalContext`] is available to handlers as an extension.
pub async fn require_role(State(state): State<AuthState>, mut req: Request, next: Next) -> Result<Response, AuthRejection> {
    let principal = authz::authenticate(&state.tokens, req.headers())?;
    authz::authorize_role(&principal, state.required)?;

    req.extensions_mut().insert(PrincipalContext::from(principal));
    Ok(next.run(req).await)
}

/// One span per request; logs status and latency once the response is ready.
pub async fn trace_requests(req: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
    );
    let started = Instant::now();

    async move {
        let response = next.run(req).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        let status = response.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), latency_ms, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), latency_ms, "request completed");
        }
        response
    }
    .instrument(span)
    .await
}
