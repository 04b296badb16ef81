//! OpenAPI Specification for the Civic API
//!
//! Generated with utoipa from the DTO types and route annotations.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{HealthReport, HealthStatus, ProbeResult};
use crate::types::*;

// Import route modules for path references
use crate::routes::{category, complaint, health};
use crate::telemetry::metrics;

use civic_core::{ComplaintStatistics, ComplaintStatus, Priority};

/// OpenAPI document for the Civic API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Civic Complaint API",
        version = "0.1.0",
        description = "Municipal citizen-complaint tracking: submission, triage, resolution and feedback",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "Civic Desk", url = "https://civic-desk.org")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Complaints", description = "Complaint lifecycle, proximity search and statistics"),
        (name = "Categories", description = "Complaint categories and their departments"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Complaint Routes ===
        complaint::create_complaint,
        complaint::list_complaints,
        complaint::get_complaint,
        complaint::update_complaint,
        complaint::delete_complaint,
        complaint::submit_feedback,
        complaint::nearby_complaints,
        complaint::complaint_statistics,

        // === Category Routes ===
        category::list_categories,
        category::get_category,
        category::create_category,
        category::delete_category,

        // === Health Routes ===
        health::ping,
        health::liveness,
        health::readiness,

        // === Metrics ===
        metrics::metrics_handler,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Complaint Types ===
            CreateComplaintRequest, UpdateComplaintRequest, ComplaintListItem,
            ListComplaintsResponse, ComplaintDetailResponse, StatusHistoryResponse,
            ComplaintStatus, Priority, ComplaintStatistics,

            // === Category Types ===
            CategoryResponse, CreateCategoryRequest,

            // === Feedback Types ===
            SubmitFeedbackRequest, FeedbackResponse,

            // === Health Types ===
            HealthReport, HealthStatus, ProbeResult,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "JWT issued by the identity provider. Omit for anonymous citizen access.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate OpenAPI spec as YAML string.
    #[cfg(feature = "openapi")]
    pub fn to_yaml() -> Result<String, String> {
        serde_yaml::to_string(&Self::openapi()).map_err(|e| e.to_string())
    }
}
