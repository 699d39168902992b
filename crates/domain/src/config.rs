//! Provider configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for one external identity provider.
///
/// Loaded once at startup by the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client identifier.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret.
    #[serde(default)]
    pub secret: String,
    /// Redirect URI registered with the provider.
    #[serde(default)]
    pub redirect_uri: String,
    /// Self-hosted base URL; empty or absent means the public SaaS host.
    #[serde(default)]
    pub url: Option<String>,
    /// Comma-separated scopes requested in addition to the provider defaults.
    #[serde(default)]
    pub scopes: Option<String>,
    /// Whether the provider may be used at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Creates an enabled configuration without host override or extra scopes.
    pub fn new(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
            redirect_uri: redirect_uri.into(),
            url: None,
            scopes: None,
            enabled: true,
        }
    }

    /// Sets the self-hosted base URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the extra comma-separated scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    /// Checks that the configuration is complete.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Disabled`] for a disabled provider and
    /// [`ConfigError::MissingField`] for the first empty required field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Err(ConfigError::Disabled);
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::MissingField("client_id"));
        }
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingField("secret"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ConfigError::MissingField("redirect_uri"));
        }
        Ok(())
    }

    /// Configured host override, empty when none is set.
    #[must_use]
    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    /// Configured extra scopes, empty when none are set.
    #[must_use]
    pub fn scopes_or_empty(&self) -> &str {
        self.scopes.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid() -> ProviderConfig {
        ProviderConfig::new("client", "secret", "https://app.example.com/callback")
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_missing_fields() {
        let mut config = valid();
        config.client_id = String::new();
        assert_eq!(config.validate(), Err(ConfigError::MissingField("client_id")));

        let mut config = valid();
        config.secret = "   ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::MissingField("secret")));

        let mut config = valid();
        config.redirect_uri = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("redirect_uri"))
        );
    }

    #[test]
    fn test_disabled_provider() {
        let mut config = valid();
        config.enabled = false;
        assert_eq!(config.validate(), Err(ConfigError::Disabled));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ProviderConfig = serde_json::from_value(serde_json::json!({
            "client_id": "abc",
            "secret": "shh",
            "redirect_uri": "https://app/cb"
        }))
        .unwrap_or_else(|e| unreachable!("config should deserialize: {e}"));

        assert!(config.enabled);
        assert_eq!(config.url_or_empty(), "");
        assert_eq!(config.scopes_or_empty(), "");
    }

    #[test]
    fn test_builders() {
        let config = valid()
            .with_url("https://git.corp.example")
            .with_scopes("api,read_repository");
        assert_eq!(config.url_or_empty(), "https://git.corp.example");
        assert_eq!(config.scopes_or_empty(), "api,read_repository");
    }
}
