//! # Cross-Origin Policy
//!
//! Built from `server.cors_origins`:
//!
//! | setting | allowed origins |
//! |---|---|
//! | `[]` | loopback only (`localhost`, `127.0.0.1`, `[::1]`), any port |
//! | `["*"]` | any |
//! | a list | exactly the listed origins |

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS layer for the karma API: `GET`/`POST` with JSON bodies and an
/// `Authorization` header.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.is_empty() {
        return AllowOrigin::predicate(|origin, _| is_loopback_origin(origin));
    }
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: any origin may call the API");
        return AllowOrigin::any();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();
    tracing::info!(count = allowed.len(), "CORS: allowing configured origins");
    AllowOrigin::list(allowed)
}

/// `http(s)://localhost`, `127.0.0.1` or `[::1]`, with or without a port.
fn is_loopback_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };

    if let Some(port) = authority.strip_prefix("[::1]") {
        return port.is_empty() || port.starts_with(':');
    }
    let host = authority.split(':').next().unwrap_or(authority);
    host == "localhost" || host == "127.0.0.1"
}
