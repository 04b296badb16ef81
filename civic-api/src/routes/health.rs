//! Health probes (no authentication).
//!
//! `/health/ready` answers 200 only when storage answers and the category
//! catalogue has been seeded; submissions are refused without categories.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use civic_storage::ComplaintRepository;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of one readiness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProbeResult {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<ProbeResult>,
}

impl HealthReport {
    fn from_checks(start_time: Instant, checks: Vec<ProbeResult>) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
            checks,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

async fn probe_storage(repo: &dyn ComplaintRepository) -> ProbeResult {
    let started = Instant::now();
    let (status, detail) = match repo.health_check().await {
        Ok(()) => (HealthStatus::Healthy, "reachable".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Storage probe failed");
            (HealthStatus::Unhealthy, e.to_string())
        }
    };
    ProbeResult {
        name: "storage".to_string(),
        status,
        latency_ms: started.elapsed().as_millis() as u64,
        detail,
    }
}

async fn probe_categories(repo: &dyn ComplaintRepository) -> ProbeResult {
    let started = Instant::now();
    let (status, detail) = match repo.category_list().await {
        Ok(categories) if !categories.is_empty() => (
            HealthStatus::Healthy,
            format!("{} categories", categories.len()),
        ),
        Ok(_) => (HealthStatus::Unhealthy, "no categories seeded".to_string()),
        Err(e) => (HealthStatus::Unhealthy, e.to_string()),
    };
    ProbeResult {
        name: "categories".to_string(),
        status,
        latency_ms: started.elapsed().as_millis() as u64,
        detail,
    }
}

/// GET /health/ping
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses((status = 200, description = "Service is responding", body = String)),
)]
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health/live - the process is up; no dependencies are touched.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is alive", body = HealthReport)),
)]
pub async fn liveness(State(start_time): State<Instant>) -> Json<HealthReport> {
    Json(HealthReport::from_checks(start_time, Vec::new()))
}

/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Storage reachable and catalogue seeded", body = HealthReport),
        (status = 503, description = "A readiness check failed", body = HealthReport),
    ),
)]
pub async fn readiness(
    State(repo): State<Arc<dyn ComplaintRepository>>,
    State(start_time): State<Instant>,
) -> (StatusCode, Json<HealthReport>) {
    let checks = vec![
        probe_storage(repo.as_ref()).await,
        probe_categories(repo.as_ref()).await,
    ];
    let report = HealthReport::from_checks(start_time, checks);
    (report.status_code(), Json(report))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
