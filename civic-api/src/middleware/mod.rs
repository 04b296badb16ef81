//! Middleware modules for the civic API
//!
//! - `auth`: principal resolution and the typed `PrincipalExtractor`
//! - rate limiting lives alongside it and keys on the resolved principal
//!
//! # Middleware Order
//!
//! Authentication must run before rate limiting so that staff are limited per
//! principal rather than per address:
//!
//! ```ignore
//! Router::new()
//!     .nest("/api/v1", api_routes)
//!     // Innermost
//!     .layer(middleware::from_fn_with_state(rate_limit_state, rate_limit_middleware))
//!     // Runs first on the request
//!     .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
//! ```

mod auth;

pub use auth::{
    auth_middleware, rate_limit_middleware, AuthMiddlewareError, AuthMiddlewareState,
    PrincipalExtractor, RateLimitError, RateLimitKey, RateLimitState,
};
