//! # Middleware Module
//!
//! Global rate limiting for the fieldkit HTTP API.
//!
//! `FIELDKIT_RATE_LIMIT` sets requests per second (default: 100, 0 disables).

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

const DEFAULT_RATE_LIMIT: u32 = 100;

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new global rate limiter.
///
/// Zero falls back to the default rate.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second)
        .or(NonZeroU32::new(DEFAULT_RATE_LIMIT))
        .unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Get rate limit from environment variable.
///
/// Unset or unparsable values give the default of 100.
pub fn get_rate_limit_from_env() -> u32 {
    parse_rate_limit(std::env::var("FIELDKIT_RATE_LIMIT").ok().as_deref())
}

fn parse_rate_limit(value: Option<&str>) -> u32 {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT)
}

/// Rate limiting middleware.
///
/// Returns 429 Too Many Requests once the limit is exceeded.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_first_request() {
        assert!(create_rate_limiter(50).check().is_ok());
        assert!(create_rate_limiter(0).check().is_ok());
    }

    #[test]
    fn limiter_rejects_burst_over_quota() {
        let limiter = create_rate_limiter(1);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn rate_limit_parsing() {
        assert_eq!(parse_rate_limit(None), 100);
        assert_eq!(parse_rate_limit(Some("0")), 0);
        assert_eq!(parse_rate_limit(Some(" 25 ")), 25);
        assert_eq!(parse_rate_limit(Some("fast")), 100);
    }
}
