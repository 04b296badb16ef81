//! REST API Routes Module
//!
//! Includes:
//! - Complaint routes (submission, list, detail, update, delete, feedback,
//!   nearby, statistics)
//! - Category routes
//! - Health check endpoints (Kubernetes-compatible)
//! - Metrics and OpenAPI documents
//! - CORS support for browser-based clients

pub mod category;
pub mod complaint;
pub mod health;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, rate_limit_middleware, AuthMiddlewareState, RateLimitState};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Handler for /openapi.yaml endpoint.
#[cfg(feature = "openapi")]
async fn openapi_yaml() -> impl IntoResponse {
    use axum::http::StatusCode;

    match ApiDoc::to_yaml() {
        Ok(yaml) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/yaml")], yaml),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to generate YAML: {}", e),
        ),
    }
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Check if running in a production environment.
fn is_production_environment() -> bool {
    std::env::var("CIVIC_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set CIVIC_CORS_ORIGINS.",
        ));
    }
    if !config.rate_limit_enabled {
        tracing::warn!(
            "Rate limiting is disabled in production. Set CIVIC_RATE_LIMIT_ENABLED=true to enable it."
        );
    }
    Ok(())
}

// ============================================================================
// SECURE ROUTER BUILDER
// ============================================================================

/// Builds the full router with principal resolution and rate limiting on
/// every `/api/v1` route.
///
/// Public routes (health, metrics, OpenAPI) bypass both.
pub struct SecureRouterBuilder {
    state: AppState,
    auth_state: AuthMiddlewareState,
    rate_limit_state: RateLimitState,
}

impl SecureRouterBuilder {
    /// In production environments, refuses insecure auth or CORS settings.
    pub fn new(state: AppState, auth_config: AuthConfig) -> ApiResult<Self> {
        if is_production_environment() {
            auth_config.validate_for_production()?;
            validate_api_config_for_production(&state.api_config)?;
        }

        let rate_limit_state = RateLimitState::new(state.api_config.as_ref().clone());
        Ok(Self {
            state,
            auth_state: AuthMiddlewareState::new(auth_config),
            rate_limit_state,
        })
    }

    fn build_entity_routes() -> Router<AppState> {
        Router::new()
            .nest("/complaints", complaint::create_router())
            .nest("/categories", category::create_router())
    }

    /// Build the complete router.
    ///
    /// # Middleware Order (outer to inner)
    /// 1. CORS (outermost) - handles preflight requests
    /// 2. Observability - tracing and metrics
    /// 3. Auth (only on /api/v1/*) - resolves the principal
    /// 4. Rate Limiting (only on /api/v1/*) - keys on the resolved principal
    pub fn build(self) -> Router {
        let api_routes = Self::build_entity_routes()
            .layer(from_fn_with_state(self.rate_limit_state, rate_limit_middleware))
            .layer(from_fn_with_state(self.auth_state, auth_middleware));

        let cors = build_cors_layer(&self.state.api_config);

        let mut router: Router<AppState> = Router::new()
            .nest("/api/v1", api_routes)
            .nest("/health", health::create_router())
            .route("/metrics", get(metrics_handler))
            .route("/openapi.json", get(openapi_json));

        #[cfg(feature = "openapi")]
        {
            router = router.route("/openapi.yaml", get(openapi_yaml));
        }

        #[allow(unused_mut)]
        let mut router: Router = router.with_state(self.state);

        #[cfg(feature = "swagger-ui")]
        {
            use utoipa_swagger_ui::SwaggerUi;
            router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
        }

        router.layer(from_fn(observability_middleware)).layer(cors)
    }
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("retry-after"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter(|o| !o.starts_with("*."))
            .filter_map(|o| o.parse().ok())
            .collect();
        let wildcards: Vec<String> = config
            .cors_origins
            .iter()
            .filter(|o| o.starts_with("*."))
            .cloned()
            .collect();

        let cors = if wildcards.is_empty() {
            cors.allow_origin(origins)
        } else {
            let config = config.clone();
            cors.allow_origin(tower_http::cors::AllowOrigin::predicate(
                move |origin: &HeaderValue, _| {
                    origin
                        .to_str()
                        .map(|o| config.is_origin_allowed(o))
                        .unwrap_or(false)
                },
            ))
        };

        if config.cors_allow_credentials {
            cors.allow_credentials(true)
        } else {
            cors
        }
    }
}

/// Create the complete API router.
///
/// - Complaint and category routes under /api/v1/* (principal resolved from
///   the bearer token, anonymous when absent)
/// - Health checks at /health/*
/// - Metrics at /metrics
/// - OpenAPI spec at /openapi.json (and /openapi.yaml)
/// - Swagger UI at /swagger-ui (when the swagger-ui feature is enabled)
pub fn create_api_router(state: AppState, auth_config: AuthConfig) -> ApiResult<Router> {
    SecureRouterBuilder::new(state, auth_config).map(SecureRouterBuilder::build)
}
