//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_API_URL` - Base URL of the commerce REST API
//!
//! ## Optional
//! - `COMMERCE_ACCESS_TOKEN` - Operator JWT (otherwise obtained via `login`)
//! - `COMMERCE_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `IDENTITY_URL` - Identity service URL used for password login
//! - `EXPORT_MAX_PAGES` - Hard cap on pages walked by a full export (default: 1000)
//! - `ADMIN_PREFS_PATH` - Preference file (default: .commerce-admin/prefs.json)
//! - `LOG_FORMAT` - `text` (default) or `json`

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_EXPORT_MAX_PAGES: &str = "1000";
const DEFAULT_PREFS_PATH: &str = ".commerce-admin/prefs.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Commerce API configuration
    pub commerce: CommerceConfig,
    /// Identity service configuration (optional, enables password login)
    pub identity: Option<IdentityConfig>,
    /// Hard cap on pages fetched by a full export
    pub export_max_pages: u32,
    /// Where column preferences and the session are stored
    pub preferences_path: PathBuf,
    /// Log output format
    pub log_format: LogFormat,
}

/// Commerce API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct CommerceConfig {
    /// Base URL of the commerce API
    pub api_url: Url,
    /// Operator access token
    pub access_token: Option<SecretString>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("api_url", &self.api_url.as_str())
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity service
    pub url: Url,
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_url("COMMERCE_API_URL")?;
        let access_token = get_optional_env("COMMERCE_ACCESS_TOKEN").map(|token| {
            if let Err(e) = validate_secret_strength(&token, "COMMERCE_ACCESS_TOKEN") {
                tracing::warn!("COMMERCE_ACCESS_TOKEN validation warning: {e}");
            }
            SecretString::from(token)
        });
        let timeout_secs = get_env_or_default("COMMERCE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("COMMERCE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_url,
            access_token,
            timeout_secs,
        })
    }
}

impl IdentityConfig {
    /// Load identity configuration from environment.
    ///
    /// Returns `None` if `IDENTITY_URL` is not set (password login disabled).
    fn from_env() -> Result<Option<Self>, ConfigError> {
        if get_optional_env("IDENTITY_URL").is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            url: get_url("IDENTITY_URL")?,
        }))
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let commerce = CommerceConfig::from_env()?;
        let identity = IdentityConfig::from_env()?;
        let export_max_pages = get_env_or_default("EXPORT_MAX_PAGES", DEFAULT_EXPORT_MAX_PAGES)
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar("EXPORT_MAX_PAGES".to_string(), e.to_string()))?;
        if export_max_pages == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "EXPORT_MAX_PAGES".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let preferences_path = PathBuf::from(get_env_or_default(
            "ADMIN_PREFS_PATH",
            DEFAULT_PREFS_PATH,
        ));
        let log_format = parse_log_format(&get_env_or_default("LOG_FORMAT", "text"))?;

        Ok(Self {
            commerce,
            identity,
            export_max_pages,
            preferences_path,
            log_format,
        })
    }

    /// Returns a reference to the identity configuration, if available.
    #[must_use]
    pub const fn identity(&self) -> Option<&IdentityConfig> {
        self.identity.as_ref()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar(
            "LOG_FORMAT".to_string(),
            format!("expected 'text' or 'json', got '{other}'"),
        )),
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable parsed as a URL.
fn get_url(key: &str) -> Result<Url, ConfigError> {
    let value = get_required_env(key)?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
