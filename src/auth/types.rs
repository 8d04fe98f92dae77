//! Auth configuration types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Authentication configuration, as read from the `server.auth` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        #[serde(default)]
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// API Key authentication (header or query)
    ApiKey {
        /// Where to place the API key
        #[serde(default)]
        location: Location,
        /// Header or query parameter name
        #[serde(default)]
        name: Option<String>,
        /// Prefix to add before the value (e.g., "Token ")
        #[serde(default)]
        prefix: Option<String>,
        /// The API key value
        value: String,
    },
}

impl AuthConfig {
    /// Auth type name, as used in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::ApiKey { .. } => "api_key",
        }
    }

    /// Check that the required credentials are present
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Basic { username, .. } if username.is_empty() => {
                Err(Error::missing_field("server.auth.username"))
            }
            Self::Bearer { token } if token.is_empty() => {
                Err(Error::missing_field("server.auth.token"))
            }
            Self::ApiKey { value, .. } if value.is_empty() => {
                Err(Error::missing_field("server.auth.value"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(matches!(config, AuthConfig::None));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_auth_config_from_yaml() {
        let config: AuthConfig =
            serde_yaml::from_str("type: api_key\nlocation: query\nvalue: secret").unwrap();
        assert_eq!(
            config,
            AuthConfig::ApiKey {
                location: Location::Query,
                name: None,
                prefix: None,
                value: "secret".to_string(),
            }
        );
        assert_eq!(config.kind(), "api_key");
    }

    #[test]
    fn test_auth_config_requires_credentials() {
        let config = AuthConfig::Bearer {
            token: String::new(),
        };
        assert!(config.validate().unwrap_err().is_config_error());
    }
}
