//! Importer configuration
//!
//! The validator and the server connection are configured in one YAML
//! document:
//!
//! ```yaml
//! server:
//!   base_url: https://example.org/FROST-Server/v1.1
//!   auth: { type: basic, username: importer, password: secret }
//!   http: { timeout_secs: 30, max_retries: 3, requests_per_second: 10 }
//! validator:
//!   type: by_phenomenon_time
//!   update: true
//! ```

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::remote::{ObservationSink, ObservationSource, SensorThingsClient};
use crate::types::{BackoffType, OptionStringExt};
use crate::validator::{
    DuplicateValidator, IntervalValidator, NullValidator, ParameterValidator, Validator,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete importer configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImporterConfig {
    /// SensorThings server connection
    pub server: ServerConfig,

    /// Validator selection
    #[serde(default)]
    pub validator: ValidatorConfig,
}

impl ImporterConfig {
    /// Check field values that serde cannot
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.validator.validate()
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// Connection to the SensorThings server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Service root, including the API version segment
    pub base_url: String,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("server.base_url"));
        }
        url::Url::parse(self.base_url.trim())
            .map_err(|e| Error::invalid_value("server.base_url", e.to_string()))?;
        self.auth.validate()?;
        self.http.validate()
    }

    /// Build the HTTP client for this server
    pub fn http_client(&self) -> Result<HttpClient> {
        let http = &self.http;
        let config = HttpClientConfig::new(self.base_url.trim())
            .timeout(Duration::from_secs(http.timeout_secs))
            .max_retries(http.max_retries)
            .backoff(
                http.backoff,
                Duration::from_millis(http.initial_backoff_ms),
                Duration::from_millis(http.max_backoff_ms),
            )
            .rate_limit(
                (http.requests_per_second > 0)
                    .then(|| RateLimiterConfig::per_second(http.requests_per_second)),
            );
        HttpClient::with_auth(config, self.auth.clone())
    }

    /// Connect a SensorThings store
    pub fn connect(&self) -> Result<SensorThingsClient> {
        Ok(SensorThingsClient::new(self.http_client()?))
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Requests per second limit; 0 disables rate limiting
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Retry backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,

    /// Initial retry delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum retry delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            requests_per_second: default_rps(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_ms(),
            max_backoff_ms: default_max_ms(),
        }
    }
}

impl HttpConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value(
                "server.http.timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(Error::invalid_value(
                "server.http.initial_backoff_ms",
                "must not exceed max_backoff_ms",
            ));
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rps() -> u32 {
    10
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Validator Config
// ============================================================================

/// Validator selection and its options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorConfig {
    /// Admit every observation (`type: "null"` or `type: none`)
    #[default]
    #[serde(alias = "none")]
    Null,

    /// Duplicates by phenomenon time
    ByPhenomenonTime {
        /// Update existing records whose result differs
        #[serde(default)]
        update: bool,
        /// Read remote records through the cache
        #[serde(default = "default_true")]
        cache_observations: bool,
        /// Delete remote records that duplicate another record's time
        #[serde(default)]
        delete_duplicates: bool,
        /// Admit observations identical to an existing record
        #[serde(default)]
        admit_duplicates: bool,
    },

    /// Duplicates by a parameter value
    ByParameter {
        /// Parameter holding the key
        parameter_name: String,
        /// Update the matching record instead of rejecting
        #[serde(default)]
        update: bool,
        /// Server-side property path, defaults to `parameters/<parameter_name>`
        #[serde(default)]
        filter_field_path: Option<String>,
    },

    /// Interval length check
    CheckTimeInterval {
        /// Expected ISO-8601 duration, e.g. `PT1H`
        duration: String,
    },
}

impl ValidatorConfig {
    /// Validator name, as used in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::ByPhenomenonTime { .. } => "by_phenomenon_time",
            Self::ByParameter { .. } => "by_parameter",
            Self::CheckTimeInterval { .. } => "check_time_interval",
        }
    }

    /// Check that the options are usable
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ByParameter { parameter_name, .. } if parameter_name.trim().is_empty() => {
                Err(Error::missing_field("validator.parameter_name"))
            }
            Self::CheckTimeInterval { duration } => {
                duration.parse::<crate::duration::IsoDuration>().map(drop)
            }
            _ => Ok(()),
        }
    }

    /// Construct the configured validator over the given store
    pub fn build(
        &self,
        source: Arc<dyn ObservationSource>,
        sink: Arc<dyn ObservationSink>,
    ) -> Result<Box<dyn Validator>> {
        let validator: Box<dyn Validator> = match self {
            Self::Null => Box::new(NullValidator),
            Self::ByPhenomenonTime {
                update,
                cache_observations,
                delete_duplicates,
                admit_duplicates,
            } => Box::new(
                DuplicateValidator::new(source, sink)
                    .update(*update)
                    .cache_observations(*cache_observations)
                    .delete_duplicates(*delete_duplicates)
                    .admit_duplicates(*admit_duplicates),
            ),
            Self::ByParameter {
                parameter_name,
                update,
                filter_field_path,
            } => {
                let mut validator =
                    ParameterValidator::new(source, parameter_name.trim())?.update(*update);
                if let Some(path) = filter_field_path.clone().none_if_empty() {
                    validator = validator.filter_path(path);
                }
                Box::new(validator)
            }
            Self::CheckTimeInterval { duration } => Box::new(IntervalValidator::new(duration)?),
        };
        Ok(validator)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<ImporterConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_config_from_str(&content)
}

/// Parse and validate a configuration document
pub fn load_config_from_str(yaml: &str) -> Result<ImporterConfig> {
    let config: ImporterConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use test_case::test_case;

    const FULL: &str = r#"
server:
  base_url: "https://example.org/FROST-Server/v1.1"
  auth:
    type: basic
    username: importer
    password: secret
  http:
    timeout_secs: 10
    max_retries: 5
    requests_per_second: 0
validator:
  type: by_phenomenon_time
  update: true
  delete_duplicates: true
"#;

    fn memory() -> (Arc<dyn ObservationSource>, Arc<dyn ObservationSink>) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store)
    }

    #[test]
    fn test_parse_full_config() {
        let config = load_config_from_str(FULL).unwrap();

        assert_eq!(config.server.base_url, "https://example.org/FROST-Server/v1.1");
        assert_eq!(
            config.server.auth,
            AuthConfig::Basic {
                username: "importer".to_string(),
                password: "secret".to_string(),
            }
        );
        assert_eq!(config.server.http.timeout_secs, 10);
        assert_eq!(config.server.http.max_retries, 5);
        assert_eq!(config.server.http.initial_backoff_ms, 100);
        assert_eq!(
            config.validator,
            ValidatorConfig::ByPhenomenonTime {
                update: true,
                cache_observations: true,
                delete_duplicates: true,
                admit_duplicates: false,
            }
        );
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = load_config_from_str("server:\n  base_url: http://localhost:8080/v1.1\n").unwrap();

        assert_eq!(config.server.auth, AuthConfig::None);
        assert_eq!(config.server.http, HttpConfig::default());
        assert_eq!(config.validator, ValidatorConfig::Null);
    }

    #[test_case("validator: { type: 'null' }", "null" ; "null")]
    #[test_case("validator: { type: none }", "null" ; "none alias")]
    #[test_case("validator: { type: by_phenomenon_time }", "by_phenomenon_time" ; "by time")]
    #[test_case("validator: { type: by_parameter, parameter_name: id }", "by_parameter" ; "by parameter")]
    #[test_case("validator: { type: check_time_interval, duration: PT1H }", "check_time_interval" ; "interval")]
    fn test_build_each_validator(section: &str, expected: &str) {
        let yaml = format!("server: {{ base_url: 'http://localhost/v1.1' }}\n{section}\n");
        let config = load_config_from_str(&yaml).unwrap();
        let (source, sink) = memory();

        let validator = config.validator.build(source, sink).unwrap();
        assert_eq!(validator.name(), expected);
        assert_eq!(config.validator.kind(), expected);
    }

    #[test_case("server: { base_url: '' }" ; "empty base url")]
    #[test_case("server: { base_url: 'not a url' }" ; "invalid base url")]
    #[test_case("server: { base_url: 'http://x', http: { timeout_secs: 0 } }" ; "zero timeout")]
    #[test_case("server: { base_url: 'http://x', auth: { type: bearer, token: '' } }" ; "empty token")]
    #[test_case("server: { base_url: 'http://x' }\nvalidator: { type: check_time_interval, duration: hourly }" ; "bad duration")]
    #[test_case("server: { base_url: 'http://x' }\nvalidator: { type: by_parameter, parameter_name: ' ' }" ; "blank parameter")]
    #[test_case("server: { base_url: 'http://x' }\nvalidator: { type: by_magic }" ; "unknown validator")]
    #[test_case("server: { base_url: 'http://x', proxy: 'y' }" ; "unknown field")]
    fn test_invalid_config(yaml: &str) {
        let err = load_config_from_str(yaml).unwrap_err();
        assert!(err.is_config_error(), "unexpected error: {err}");
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.validator.kind(), "by_phenomenon_time");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_server_builds_client() {
        let config = load_config_from_str(FULL).unwrap();
        let client = config.server.http_client().unwrap();

        assert!(!client.has_rate_limiter());
        assert_eq!(
            client.base_url().as_str(),
            "https://example.org/FROST-Server/v1.1/"
        );
    }
}
