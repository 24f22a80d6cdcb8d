//! Rate limiting for credential endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

use crate::api::ApiError;
use crate::auth::extract_client_ip;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const DEFAULT_LOGIN_PER_MINUTE: NonZeroU32 = NonZeroU32::new(10).unwrap();
const DEFAULT_LOGIN_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();
const DEFAULT_SIGNUP_PER_MINUTE: NonZeroU32 = NonZeroU32::new(3).unwrap();

/// Rate limiting configuration for login and signup.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login attempts
    pub login: Arc<IpLimiter>,
    /// Per-IP limiter for account creation
    pub signup: Arc<IpLimiter>,
    /// Key on `X-Forwarded-For` instead of the socket address
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    /// Create rate limiters with default quotas.
    pub fn new(trust_proxy: bool) -> Self {
        Self::with_quotas(
            Quota::per_minute(DEFAULT_LOGIN_PER_MINUTE).allow_burst(DEFAULT_LOGIN_BURST),
            Quota::per_minute(DEFAULT_SIGNUP_PER_MINUTE),
            trust_proxy,
        )
    }

    pub fn with_quotas(login: Quota, signup: Quota, trust_proxy: bool) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(login)),
            signup: Arc::new(RateLimiter::keyed(signup)),
            trust_proxy,
        }
    }
}

async fn check_limit(
    limiter: &IpLimiter,
    trust_proxy: bool,
    message: &'static str,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, trust_proxy) {
        Ok(ip) => ip,
        Err(_) => {
            return ApiError::forbidden("Unable to determine client IP").into_response();
        }
    };

    match limiter.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(ip = %ip, "Rate limit exceeded");
            ApiError::too_many_requests(message).into_response()
        }
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    check_limit(
        &config.login,
        config.trust_proxy,
        "Too many login attempts. Please wait before trying again.",
        request,
        next,
    )
    .await
}

/// Middleware for rate limiting account creation.
pub async fn rate_limit_signup(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    check_limit(
        &config.signup,
        config.trust_proxy,
        "Too many signup attempts. Please wait before trying again.",
        request,
        next,
    )
    .await
}
