//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREKEEP_API_URL` - Base URL of the catalog/order API
//!   (default: `https://workintech-fe-ecommerce.onrender.com`)
//! - `STOREKEEP_DATA_DIR` - Durable storage tier directory
//!   (default: platform data dir + `/storekeep`)
//! - `STOREKEEP_SESSION_DIR` - Session storage tier directory
//!   (default: `$XDG_RUNTIME_DIR/storekeep`, falling back to the temp dir)
//! - `STOREKEEP_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `STOREKEEP_CATALOG_TTL_SECS` - Category/role cache lifetime (default: 300)
//! - `STOREKEEP_VERIFY_MARKER_TTL_SECS` - Age after which an in-flight
//!   verification marker is considered abandoned (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://workintech-fe-ecommerce.onrender.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const DEFAULT_VERIFY_MARKER_TTL_SECS: u64 = 60;
const APP_DIR_NAME: &str = "storekeep";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No usable directory for {0}; set it explicitly")]
    NoDirectory(&'static str),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote REST API
    pub api_url: Url,
    /// Directory backing the durable storage tier
    pub data_dir: PathBuf,
    /// Directory backing the session storage tier
    pub session_dir: PathBuf,
    /// Per-request timeout for API calls
    pub request_timeout: Duration,
    /// Lifetime of cached categories and roles
    pub catalog_ttl: Duration,
    /// Age after which a verification marker no longer blocks a new attempt
    pub verify_marker_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration with default timeouts for the given locations.
    #[must_use]
    pub fn new(api_url: Url, data_dir: PathBuf, session_dir: PathBuf) -> Self {
        Self {
            api_url,
            data_dir,
            session_dir,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            verify_marker_ttl: Duration::from_secs(DEFAULT_VERIFY_MARKER_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed, or if
    /// no default directory exists for an unset storage location.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("STOREKEEP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_base_url(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("STOREKEEP_API_URL".to_string(), e))?;

        let data_dir = match lookup("STOREKEEP_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(ConfigError::NoDirectory("STOREKEEP_DATA_DIR"))?,
        };
        let session_dir = lookup("STOREKEEP_SESSION_DIR").map_or_else(
            || {
                dirs::runtime_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join(APP_DIR_NAME)
            },
            PathBuf::from,
        );

        Ok(Self {
            api_url,
            data_dir,
            session_dir,
            request_timeout: get_secs(
                &lookup,
                "STOREKEEP_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            catalog_ttl: get_secs(&lookup, "STOREKEEP_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?,
            verify_marker_ttl: get_secs(
                &lookup,
                "STOREKEEP_VERIFY_MARKER_TTL_SECS",
                DEFAULT_VERIFY_MARKER_TTL_SECS,
            )?,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// any path prefix.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Read a whole-second duration, falling back to `default` when unset.
fn get_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    lookup(key).map_or(Ok(Duration::from_secs(default)), |value| {
        value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_explicit_dirs() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("STOREKEEP_DATA_DIR", "/var/lib/storekeep"),
            ("STOREKEEP_SESSION_DIR", "/run/user/1000/storekeep"),
        ]))
        .unwrap();

        assert_eq!(
            config.api_url.as_str(),
            "https://workintech-fe-ecommerce.onrender.com/"
        );
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/storekeep"));
        assert_eq!(config.session_dir, PathBuf::from("/run/user/1000/storekeep"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_ttl, Duration::from_secs(300));
        assert_eq!(config.verify_marker_ttl, Duration::from_secs(60));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_api_url_keeps_path_prefix() {
        let url = parse_base_url("http://localhost:8080/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/");
        assert_eq!(url.join("login").unwrap().path(), "/api/v1/login");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("STOREKEEP_API_URL", "ftp://example.com"),
            ("STOREKEEP_DATA_DIR", "/tmp/a"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREKEEP_API_URL"));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("STOREKEEP_DATA_DIR", "/tmp/a"),
            ("STOREKEEP_REQUEST_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREKEEP_REQUEST_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_overrides_durations() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("STOREKEEP_DATA_DIR", "/tmp/a"),
            ("STOREKEEP_CATALOG_TTL_SECS", "5"),
            ("STOREKEEP_VERIFY_MARKER_TTL_SECS", " 10 "),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ]))
        .unwrap();
        assert_eq!(config.catalog_ttl, Duration::from_secs(5));
        assert_eq!(config.verify_marker_ttl, Duration::from_secs(10));
        assert_eq!(
            config.sentry_dsn.as_deref(),
            Some("https://key@sentry.example/1")
        );
    }
}
