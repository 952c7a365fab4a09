//! # Request Budget
//!
//! One global governor bucket, sized by `server.rate_limit`. Requests over
//! budget get `429` with a `Retry-After` hint.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultDirectRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Shared limiter handed to [`throttle`].
pub type GlobalRateLimiter = Arc<DefaultDirectRateLimiter>;

/// A limiter allowing `per_second` requests, or `None` when the limit is 0.
#[must_use]
pub fn rate_limiter(per_second: u32) -> Option<GlobalRateLimiter> {
    NonZeroU32::new(per_second).map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Spend one unit of the budget or answer `429`.
pub async fn throttle(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait.as_secs().max(1);
            tracing::warn!(
                path = %request.uri().path(),
                retry_after,
                "Rate limit exceeded"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                "Too Many Requests",
            )
                .into_response()
        }
    }
}
