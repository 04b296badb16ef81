//! Prometheus Metrics Definitions
//!
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<CivicMetrics>> = Lazy::new(CivicMetrics::new);

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Container for all civic metrics.
#[derive(Clone)]
pub struct CivicMetrics {
    /// labels: method, path, status
    pub http_requests_total: CounterVec,

    /// labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// labels: operation, entity, status
    pub db_operations_total: CounterVec,

    /// labels: operation, entity
    pub db_operation_duration_seconds: HistogramVec,

    /// labels: category
    pub complaints_submitted_total: CounterVec,

    /// labels: from, to
    pub status_transitions_total: CounterVec,

    /// labels: rating
    pub feedback_submissions_total: CounterVec,

    /// labels: kind, status (success/failure/dropped)
    pub notification_deliveries_total: CounterVec,

    /// labels: key (ip/principal)
    pub rate_limited_total: CounterVec,
}

impl CivicMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "civic_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "civic_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            db_operations_total: register_counter_vec!(
                "civic_db_operations_total",
                "Total number of database operations",
                &["operation", "entity", "status"]
            )
            .map_err(|e| registration_error("db_operations_total", e))?,

            db_operation_duration_seconds: register_histogram_vec!(
                "civic_db_operation_duration_seconds",
                "Database operation duration in seconds",
                &["operation", "entity"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("db_operation_duration_seconds", e))?,

            complaints_submitted_total: register_counter_vec!(
                "civic_complaints_submitted_total",
                "Complaints filed by citizens",
                &["category"]
            )
            .map_err(|e| registration_error("complaints_submitted_total", e))?,

            status_transitions_total: register_counter_vec!(
                "civic_status_transitions_total",
                "Complaint status transitions recorded in the ledger",
                &["from", "to"]
            )
            .map_err(|e| registration_error("status_transitions_total", e))?,

            feedback_submissions_total: register_counter_vec!(
                "civic_feedback_submissions_total",
                "Citizen feedback records accepted",
                &["rating"]
            )
            .map_err(|e| registration_error("feedback_submissions_total", e))?,

            notification_deliveries_total: register_counter_vec!(
                "civic_notification_deliveries_total",
                "Outbound notification delivery attempts",
                &["kind", "status"]
            )
            .map_err(|e| registration_error("notification_deliveries_total", e))?,

            rate_limited_total: register_counter_vec!(
                "civic_rate_limited_total",
                "Requests rejected by the rate limiter",
                &["key"]
            )
            .map_err(|e| registration_error("rate_limited_total", e))?,
        })
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_db_operation(
        &self,
        operation: &str,
        entity: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, entity, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation, entity])
            .observe(duration_secs);
    }

    pub fn record_submission(&self, category: &str) {
        self.complaints_submitted_total
            .with_label_values(&[category])
            .inc();
    }

    pub fn record_transition(&self, from: &str, to: &str) {
        self.status_transitions_total
            .with_label_values(&[from, to])
            .inc();
    }

    pub fn record_feedback(&self, rating: i16) {
        let rating = rating.to_string();
        self.feedback_submissions_total
            .with_label_values(&[&rating])
            .inc();
    }

    /// `status` is one of `success`, `failure` or `dropped`.
    pub fn record_notification(&self, kind: &str, status: &str) {
        self.notification_deliveries_total
            .with_label_values(&[kind, status])
            .inc();
    }

    pub fn record_rate_limited(&self, key: &str) {
        self.rate_limited_total.with_label_values(&[key]).inc();
    }
}

/// Handler for GET /metrics endpoint.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
