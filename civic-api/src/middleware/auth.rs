//! Axum Middleware for Authentication and Rate Limiting
//!
//! `auth_middleware` resolves the caller into a [`Principal`] and stores it
//! in the request extensions. Requests without credentials continue as the
//! anonymous citizen; credentials that fail validation are rejected with 401.
//!
//! `rate_limit_middleware` enforces per-principal quotas for authenticated
//! callers and per-address quotas for everyone else.

use crate::auth::{authenticate, AuthConfig};
use crate::config::ApiConfig;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use civic_core::Principal;
use dashmap::DashMap;
use governor::{clock::DefaultClock, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Resolve the principal for this request and inject it into extensions.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let principal = authenticate(&state.auth_config, auth_header).map_err(AuthMiddlewareError)?;

    if principal.is_authenticated() {
        tracing::debug!(
            principal = principal.id.as_deref().unwrap_or_default(),
            is_staff = principal.is_staff,
            department = principal.department.as_deref().unwrap_or_default(),
            "Request authenticated"
        );
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed extractor for the principal injected by [`auth_middleware`].
///
/// Without the middleware in front of the route the extractor fails with a
/// 500, since every handler that asks for a principal relies on it.
#[derive(Debug, Clone)]
pub struct PrincipalExtractor(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PrincipalExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(PrincipalExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "Principal not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for PrincipalExtractor {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// RATE LIMITING MIDDLEWARE
// ============================================================================

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

/// Key for rate limiting.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum RateLimitKey {
    /// Anonymous request, keyed by client address
    Ip(IpAddr),
    /// Authenticated request, keyed by principal id
    Principal(String),
}

/// State for rate limiting middleware.
#[derive(Clone)]
pub struct RateLimitState {
    config: Arc<ApiConfig>,
    limiters: Arc<DashMap<RateLimitKey, Arc<DirectRateLimiter>>>,
}

impl RateLimitState {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config: Arc::new(config),
            limiters: Arc::new(DashMap::new()),
        }
    }

    fn limit_for(&self, key: &RateLimitKey) -> u32 {
        match key {
            RateLimitKey::Ip(_) => self.config.rate_limit_unauthenticated,
            RateLimitKey::Principal(_) => self.config.rate_limit_authenticated,
        }
    }

    fn limiter_for(&self, key: &RateLimitKey) -> Arc<DirectRateLimiter> {
        let limiter = self.limiters.entry(key.clone()).or_insert_with(|| {
            let quota = Quota::per_minute(NonZeroU32::new(self.limit_for(key)).unwrap_or(NonZeroU32::MIN))
                .allow_burst(NonZeroU32::new(self.config.rate_limit_burst).unwrap_or(NonZeroU32::MIN));
            Arc::new(RateLimiter::direct(quota))
        });
        limiter.clone()
    }
}

/// Error type for rate limit middleware.
#[derive(Debug)]
pub struct RateLimitError {
    /// Seconds until the caller may retry
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = ApiError::too_many_requests(Some(self.retry_after)).into_response();
        response.headers_mut().insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from_str(&self.retry_after.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("60")),
        );
        response
    }
}

/// Client address, honouring proxy headers.
fn extract_client_ip(request: &Request, fallback: Option<SocketAddr>) -> IpAddr {
    if let Some(forwarded_for) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(Ok(ip)) = forwarded_for.split(',').next().map(|ip| ip.trim().parse()) {
            return ip;
        }
    }

    if let Some(Ok(ip)) = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|ip| ip.trim().parse())
    {
        return ip;
    }

    fallback
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rate limiting middleware.
///
/// Returns 429 with `Retry-After` once the caller's quota is exhausted.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let key = match request
        .extensions()
        .get::<Principal>()
        .and_then(|p| p.id.clone())
    {
        Some(id) => RateLimitKey::Principal(id),
        None => RateLimitKey::Ip(extract_client_ip(&request, connect_info.map(|c| c.0))),
    };

    match state.limiter_for(&key).check() {
        Ok(_) => {
            let limit = state.limit_for(&key);
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from_str(&limit.to_string())
                    .unwrap_or_else(|_| HeaderValue::from_static("100")),
            );
            Ok(response)
        }
        Err(not_until) => {
            let retry_after = not_until
                .wait_time_from(governor::clock::Clock::now(&DefaultClock::default()))
                .as_secs()
                .max(1);
            tracing::warn!(key = ?key, retry_after, "Rate limit exceeded");
            if let Ok(metrics) = crate::telemetry::METRICS.as_ref() {
                metrics.record_rate_limited(match key {
                    RateLimitKey::Ip(_) => "ip",
                    RateLimitKey::Principal(_) => "principal",
                });
            }
            Err(RateLimitError { retry_after })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
