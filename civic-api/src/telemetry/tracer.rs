//! Tracing Subscriber Initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "civic_api=debug,info";

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    /// production, staging, development
    pub environment: String,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "civic-api".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl TelemetryConfig {
    /// - `CIVIC_SERVICE_NAME` (default: civic-api)
    /// - `CIVIC_ENVIRONMENT` (default: development)
    /// - `CIVIC_LOG_FORMAT`: `json` or `pretty` (default: json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("CIVIC_SERVICE_NAME").unwrap_or(defaults.service_name),
            service_version: defaults.service_version,
            environment: std::env::var("CIVIC_ENVIRONMENT").unwrap_or(defaults.environment),
            log_format: match std::env::var("CIVIC_LOG_FORMAT")
                .map(|s| s.to_lowercase())
                .as_deref()
            {
                Ok("pretty") | Ok("text") => LogFormat::Pretty,
                _ => LogFormat::Json,
            },
        }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup. The filter comes from `RUST_LOG` when set.
pub fn init_tracer(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        service_version = config.service_version,
        environment = config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}
