use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Shared limiter guarding the login endpoint against credential stuffing.
pub struct LoginRateLimit {
    limiter: RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>,
}

impl LoginRateLimit {
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::with_period(Duration::from_secs(60))
            .unwrap()
            .allow_burst(NonZeroU32::new(requests_per_minute.max(1)).unwrap());

        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

pub async fn login_rate_limit_middleware(
    State(limit): State<Arc<LoginRateLimit>>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    if !limit.check() {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        )
            .into_response());
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_throttle() {
        let limit = LoginRateLimit::new(3);
        assert!(limit.check());
        assert!(limit.check());
        assert!(limit.check());
        assert!(!limit.check());
    }
}
