//! Civic API - REST Layer for the Complaint Tracker
//!
//! Exposes the complaint lifecycle over HTTP (Axum). Requests resolve a
//! principal from an optional bearer token, pass through the service layer
//! (access policy, repository, event dispatch) and are rendered as JSON.
//!
//! Storage is either PostgreSQL (`DbClient`) or the in-memory repository
//! from `civic-storage`. Notifications are delivered by a background task
//! after the triggering change has committed.

#[macro_use]
pub mod macros;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod notifications;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{authenticate, generate_jwt_token, validate_jwt_token, AuthConfig, Claims};
pub use config::{bind_addr_from_env, ApiConfig, NotifierConfig, StorageBackend};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthMiddlewareState, PrincipalExtractor};
pub use notifications::{NotificationDispatcher, Notifier};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{CategoryService, ComplaintService, ServiceClock, WallClock};
pub use state::AppState;
pub use types::*;
