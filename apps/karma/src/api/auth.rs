//! # API Key Guard
//!
//! When `server.api_key` is set, every route except `/health` sits behind
//! [`require_api_key`]. The router applies the guard to the protected routes
//! only, so the guard itself never looks at the path.
//!
//! Clients send the key as `Authorization: Bearer <key>` or as the bare key.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The key protected requests must carry.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for a blank key, which means authentication is off.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        (!key.trim().is_empty()).then_some(Self(key))
    }

    /// Check an `Authorization` header value in constant time.
    #[must_use]
    pub fn accepts(&self, authorization: &str) -> bool {
        let provided = authorization
            .strip_prefix("Bearer ")
            .unwrap_or(authorization);
        self.0.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Reject requests without a matching `Authorization` header.
pub async fn require_api_key(
    State(key): State<Arc<ApiKey>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match authorization {
        Some(value) if key.accepts(value) => next.run(request).await,
        Some(_) => unauthorized(&request, "invalid_api_key"),
        None => unauthorized(&request, "missing_authorization_header"),
    }
}

fn unauthorized(request: &Request<Body>, reason: &'static str) -> Response {
    tracing::warn!(
        event = "auth_failure",
        reason,
        path = %request.uri().path(),
        "Rejected unauthenticated request"
    );
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        "Unauthorized",
    )
        .into_response()
}

// =============================================================================
// TESTS
// =============================================================================
