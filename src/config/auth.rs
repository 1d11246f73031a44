//! Authentication configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::auth::ZitadelConfig;

/// Zitadel OIDC settings used to validate access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Zitadel authority URL (token issuer)
    pub zitadel_authority: String,

    /// Expected audience for tokens
    pub zitadel_audience: String,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    /// Settings for the token validator adapter.
    pub fn zitadel_config(&self) -> ZitadelConfig {
        ZitadelConfig::new(&self.zitadel_authority, &self.zitadel_audience)
            .with_cache_duration(self.jwks_cache_ttl())
    }

    /// Validate authentication configuration
    ///
    /// In production, requires HTTPS for the authority URL.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.zitadel_authority.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ZITADEL_AUTHORITY"));
        }
        if self.zitadel_audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ZITADEL_AUDIENCE"));
        }

        if *environment == Environment::Production && !self.zitadel_authority.starts_with("https://") {
            return Err(ValidationError::AuthorityMustBeHttps);
        }

        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            zitadel_authority: String::new(),
            zitadel_audience: String::new(),
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
        }
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            zitadel_authority: "https://auth.example.com".to_string(),
            zitadel_audience: "assignment-chat-api".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwks_cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_zitadel_config_carries_issuer_audience_and_ttl() {
        let config = AuthConfig {
            jwks_cache_ttl_secs: 120,
            ..valid()
        };
        let zitadel = config.zitadel_config();
        assert_eq!(zitadel.issuer_url, "https://auth.example.com");
        assert_eq!(zitadel.audience, "assignment-chat-api");
        assert_eq!(zitadel.jwks_cache_duration, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_validation_missing_authority() {
        let config = AuthConfig::default();
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_validation_missing_audience() {
        let config = AuthConfig {
            zitadel_audience: String::new(),
            ..valid()
        };
        assert!(matches!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("AUTH__ZITADEL_AUDIENCE"))
        ));
    }

    #[test]
    fn test_validation_production_requires_https() {
        let config = AuthConfig {
            zitadel_authority: "http://localhost:8081".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert!(config.validate(&Environment::Production).is_err());
    }

    #[test]
    fn test_authority_and_audience_are_the_only_required_fields() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "zitadel_authority": "https://auth.example.com",
            "zitadel_audience": "assignment-chat-api",
        }))
        .unwrap();
        assert!(config.validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate(&Environment::Production).is_ok());
    }
}
