//! Response security headers, applied to every route.

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use std::env;
use tower_http::set_header::SetResponseHeaderLayer;

const BASE_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    (
        "content-security-policy",
        "default-src 'none'; frame-ancestors 'none'",
    ),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "geolocation=(), microphone=(), camera=()",
    ),
];

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// HSTS only makes sense behind HTTPS, so it is gated on production mode.
fn hsts_enabled() -> bool {
    env::var("RUST_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false)
}

pub fn apply_security_headers(router: Router) -> Router {
    let mut router = router;
    for (name, value) in BASE_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }
    if hsts_enabled() {
        tracing::info!("Security: HSTS header enabled (production mode)");
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static(HSTS_VALUE),
        ));
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_headers_are_valid() {
        for (name, value) in BASE_HEADERS {
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
            assert!(HeaderValue::from_static(value).to_str().is_ok());
        }
    }

    #[test]
    fn hsts_defaults_off() {
        env::remove_var("RUST_ENV");
        assert!(!hsts_enabled());
    }
}
