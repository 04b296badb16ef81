//! API Configuration Module
//!
//! CORS, rate limiting, pagination, media links, storage backend selection,
//! notification delivery and the bind address. Everything is read from
//! environment variables with development-friendly defaults.

use std::net::SocketAddr;
use std::time::Duration;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        })
        .unwrap_or(default)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP-facing configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Rate Limiting Configuration
    // ========================================================================
    pub rate_limit_enabled: bool,

    /// Requests per minute per IP for anonymous callers.
    pub rate_limit_unauthenticated: u32,

    /// Requests per minute per principal for authenticated callers.
    pub rate_limit_authenticated: u32,

    /// Burst capacity beyond the steady rate.
    pub rate_limit_burst: u32,

    pub rate_limit_window: Duration,

    // ========================================================================
    // Read model
    // ========================================================================
    /// Prefix joined with a stored photo reference to build `photo_url`.
    pub media_base_url: Option<String>,

    /// Default page size for complaint lists.
    pub page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,

            rate_limit_enabled: true,
            rate_limit_unauthenticated: 100,
            rate_limit_authenticated: 1000,
            rate_limit_burst: 10,
            rate_limit_window: Duration::from_secs(60),

            media_base_url: None,
            page_size: civic_core::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// - `CIVIC_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `CIVIC_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `CIVIC_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `CIVIC_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `CIVIC_RATE_LIMIT_UNAUTHENTICATED`: requests per minute per IP (default: 100)
    /// - `CIVIC_RATE_LIMIT_AUTHENTICATED`: requests per minute per principal (default: 1000)
    /// - `CIVIC_RATE_LIMIT_BURST`: burst capacity (default: 10)
    /// - `CIVIC_MEDIA_BASE_URL`: prefix for photo links (default: unset)
    /// - `CIVIC_PAGE_SIZE`: default list page size (default: 50, capped at 500)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("CIVIC_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cors_origins,
            cors_allow_credentials: env_flag("CIVIC_CORS_ALLOW_CREDENTIALS", false),
            cors_max_age_secs: env_parse("CIVIC_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            rate_limit_enabled: env_flag("CIVIC_RATE_LIMIT_ENABLED", true),
            rate_limit_unauthenticated: env_parse("CIVIC_RATE_LIMIT_UNAUTHENTICATED")
                .unwrap_or(defaults.rate_limit_unauthenticated),
            rate_limit_authenticated: env_parse("CIVIC_RATE_LIMIT_AUTHENTICATED")
                .unwrap_or(defaults.rate_limit_authenticated),
            rate_limit_burst: env_parse("CIVIC_RATE_LIMIT_BURST")
                .unwrap_or(defaults.rate_limit_burst),
            rate_limit_window: defaults.rate_limit_window,
            media_base_url: env_string("CIVIC_MEDIA_BASE_URL"),
            page_size: env_parse::<usize>("CIVIC_PAGE_SIZE")
                .unwrap_or(defaults.page_size)
                .clamp(1, civic_core::MAX_PAGE_SIZE),
        }
    }

    /// Strict CORS is in effect when origins are configured.
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.city.gov
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }

    /// Public URL of a stored photo reference.
    pub fn photo_url(&self, photo_ref: Option<&str>) -> Option<String> {
        let reference = photo_ref?.trim();
        if reference.is_empty() {
            return None;
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Some(reference.to_string());
        }
        let base = self.media_base_url.as_deref()?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            reference.trim_start_matches('/')
        ))
    }
}

// ============================================================================
// STORAGE BACKEND
// ============================================================================

/// Which repository implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl StorageBackend {
    /// Read `CIVIC_STORAGE` (`postgres` or `memory`, default `postgres`).
    pub fn from_env() -> Self {
        match env_string("CIVIC_STORAGE").map(|s| s.to_lowercase()).as_deref() {
            Some("memory") | Some("in-memory") | Some("inmemory") => StorageBackend::Memory,
            _ => StorageBackend::Postgres,
        }
    }
}

// ============================================================================
// NOTIFIER CONFIGURATION
// ============================================================================

/// Outbound notification settings.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Recipient of new-complaint alerts.
    pub admin_email: String,
    pub from_email: String,
    /// Mail relay endpoint. `None` means log-only delivery.
    pub webhook_url: Option<String>,
    /// Bounded queue between request handlers and the dispatcher task.
    pub queue_capacity: usize,
    pub timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@complaints.local".to_string(),
            from_email: "noreply@complaints.local".to_string(),
            webhook_url: None,
            queue_capacity: 256,
            timeout: Duration::from_secs(10),
        }
    }
}

impl NotifierConfig {
    /// - `CIVIC_ADMIN_EMAIL`, `CIVIC_FROM_EMAIL`
    /// - `CIVIC_NOTIFY_WEBHOOK_URL` (unset = log only)
    /// - `CIVIC_NOTIFY_QUEUE_CAPACITY` (default: 256)
    /// - `CIVIC_NOTIFY_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            admin_email: env_string("CIVIC_ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            from_email: env_string("CIVIC_FROM_EMAIL").unwrap_or(defaults.from_email),
            webhook_url: env_string("CIVIC_NOTIFY_WEBHOOK_URL"),
            queue_capacity: env_parse::<usize>("CIVIC_NOTIFY_QUEUE_CAPACITY")
                .unwrap_or(defaults.queue_capacity)
                .max(1),
            timeout: env_parse("CIVIC_NOTIFY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

// ============================================================================
// SERVER
// ============================================================================

/// Resolve the listen address from `CIVIC_API_BIND` and `PORT`/`CIVIC_API_PORT`.
pub fn bind_addr_from_env() -> Result<SocketAddr, std::net::AddrParseError> {
    let host = env_string("CIVIC_API_BIND").unwrap_or_else(|| "0.0.0.0".to_string());
    let port: u16 = env_parse("PORT")
        .or_else(|| env_parse("CIVIC_API_PORT"))
        .unwrap_or(3000);
    format!("{}:{}", host, port).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.rate_limit_unauthenticated, 100);
        assert_eq!(config.rate_limit_authenticated, 1000);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_origin_allowed_production() {
        let config = ApiConfig {
            cors_origins: vec!["https://complaints.city.gov".to_string()],
            ..ApiConfig::default()
        };
        assert!(config.is_production());
        assert!(config.is_origin_allowed("https://complaints.city.gov"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }

    #[test]
    fn test_wildcard_subdomain() {
        let config = ApiConfig {
            cors_origins: vec!["*.city.gov".to_string()],
            ..ApiConfig::default()
        };
        assert!(config.is_origin_allowed("https://complaints.city.gov"));
        assert!(!config.is_origin_allowed("https://evilcity.gov"));
        assert!(!config.is_origin_allowed("http://complaints.city.gov"));
    }

    #[test]
    fn test_photo_url() {
        let mut config = ApiConfig::default();
        assert_eq!(config.photo_url(Some("complaints/a.jpg")), None);

        config.media_base_url = Some("https://media.city.gov/".to_string());
        assert_eq!(
            config.photo_url(Some("/complaints/a.jpg")).as_deref(),
            Some("https://media.city.gov/complaints/a.jpg")
        );
        assert_eq!(config.photo_url(None), None);
        assert_eq!(
            config.photo_url(Some("https://cdn.example/x.png")).as_deref(),
            Some("https://cdn.example/x.png")
        );
    }

    #[test]
    fn test_notifier_defaults() {
        let config = NotifierConfig::default();
        assert!(config.webhook_url.is_none());
        assert_eq!(config.queue_capacity, 256);
    }
}
