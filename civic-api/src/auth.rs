//! Authentication Module
//!
//! Adapts the external identity provider to the core `Principal`. The provider
//! issues HS256 bearer tokens; a request without an `Authorization` header is
//! treated as the anonymous citizen. The principal is built once, from claims,
//! when the request is authenticated.

use crate::error::{ApiError, ApiResult};
use civic_core::Principal;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock used for token time validation.
///
/// Time checks are done here rather than inside `jsonwebtoken` so tests can
/// inject a fixed instant.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds. Negative for pre-1970 clocks.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Test clock helpers for common scenarios.
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// JWT SECRET
// ============================================================================

/// JWT signing secret that never shows up in logs.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Wrap a secret, rejecting empty values.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::missing_field("jwt_secret"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value for signing and verification only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// Token lifetime in seconds (default: 1 hour)
    pub jwt_expiration_secs: i64,

    /// Clock skew tolerance in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for token time validation
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: build_jwt_secret(INSECURE_DEFAULT_SECRET.to_string()),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// - `CIVIC_JWT_SECRET`: signing secret
    /// - `CIVIC_JWT_EXPIRATION_SECS`: token lifetime (default: 3600)
    /// - `CIVIC_JWT_CLOCK_SKEW_SECS`: clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let secret_str = std::env::var("CIVIC_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("CIVIC_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            jwt_clock_skew_secs: std::env::var("CIVIC_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Refuse insecure secrets when `CIVIC_ENVIRONMENT` is production.
    ///
    /// Outside production the same problems are logged as warnings.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("CIVIC_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set CIVIC_JWT_SECRET to a secure value. \
                     CIVIC_ENVIRONMENT={}",
                    environment
                )));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set CIVIC_JWT_SECRET \
                 (minimum 32 characters) before deploying."
            );
        }

        if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            } else if !self.jwt_secret.is_insecure_default() {
                tracing::warn!(
                    secret_len = self.jwt_secret.len(),
                    "JWT secret is short; use at least 32 characters in production"
                );
            }
        }

        Ok(())
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into())),
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// Claims issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    #[serde(default)]
    pub is_staff: bool,

    #[serde(default)]
    pub is_superuser: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default)]
    pub is_department_user: bool,
}

impl Claims {
    /// Claims for `principal`, valid from the clock's current time.
    ///
    /// Returns `None` for the anonymous principal, which has no token.
    pub fn for_principal(
        principal: &Principal,
        expiration_secs: i64,
        clock: &dyn JwtClock,
    ) -> Option<Self> {
        let sub = principal.id.clone()?;
        let now = clock.now_epoch_secs();
        Some(Self {
            sub,
            iat: now,
            exp: now + expiration_secs,
            is_staff: principal.is_staff,
            is_superuser: principal.is_superuser,
            department: principal.department.clone(),
            is_department_user: principal.is_department_user,
        })
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }

    /// The principal these claims describe.
    pub fn into_principal(self) -> Principal {
        Principal {
            id: Some(self.sub),
            // A superuser is always an administrator.
            is_staff: self.is_staff || self.is_superuser,
            is_superuser: self.is_superuser,
            department: self
                .department
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            is_department_user: self.is_department_user,
        }
    }
}

// ============================================================================
// TOKEN VALIDATION
// ============================================================================

fn validate_claim_times(now: i64, exp: i64, nbf: Option<i64>, leeway_secs: i64) -> ApiResult<()> {
    if let Some(nbf) = nbf {
        if now + leeway_secs < nbf {
            return Err(ApiError::unauthorized("Token not yet valid (nbf)"));
        }
    }

    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }

    Ok(())
}

/// Validate a bearer token and return its claims.
///
/// `jsonwebtoken` checks the signature only; expiry is checked against the
/// configured clock with skew tolerance.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();

    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error(
            "Server time configuration error - please contact support",
        ));
    }

    validate_claim_times(now, claims.exp, None, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Issue a token for `principal`. Used by operators and tests.
pub fn generate_jwt_token(config: &AuthConfig, principal: &Principal) -> ApiResult<String> {
    let claims = Claims::for_principal(principal, config.jwt_expiration_secs, &*config.clock)
        .ok_or_else(|| ApiError::invalid_input("Cannot issue a token for an anonymous principal"))?;

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Resolve the caller from an optional `Authorization` header value.
///
/// No header means anonymous. A header that is present must carry a valid
/// bearer token.
pub fn authenticate(config: &AuthConfig, authorization: Option<&str>) -> ApiResult<Principal> {
    let Some(value) = authorization else {
        return Ok(Principal::anonymous());
    };
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::invalid_token("Authorization header must use the Bearer scheme")
        })?;
    Ok(validate_jwt_token(config, token)?.into_principal())
}
