//! Civic Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics for the API
//! layer. Nothing here needs an external collector to run.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, CivicMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracer, LogFormat, TelemetryConfig};
