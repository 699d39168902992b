//! Application settings: an optional TOML file overlaid by environment
//! variables (`IDLINK__PROVIDERS__GITLAB__CLIENT_ID`, ...).

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use idlink_domain::ProviderConfig;

const ENV_PREFIX: &str = "IDLINK";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the binary reads from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider configurations keyed by registry name.
    pub providers: BTreeMap<String, ProviderConfig>,
    /// Outbound HTTP settings.
    pub http: HttpSettings,
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout applied by the shared HTTP client.
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpSettings {
    /// Timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Loads `path` (if it exists) and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parses settings from TOML text alone.
    pub fn from_toml(text: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Configuration of `name`, if present.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_settings() {
        let settings = Settings::from_toml("")
            .unwrap_or_else(|e| unreachable!("empty settings should parse: {e}"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_providers_table() {
        let settings = Settings::from_toml(
            r#"
            [http]
            timeout_secs = 5

            [providers.gitlab]
            client_id = "abc"
            secret = "s3cret"
            redirect_uri = "https://app.example.com/callback"
            scopes = "api"

            [providers.keycloak]
            client_id = "kc"
            secret = "kc-secret"
            redirect_uri = "https://app.example.com/callback"
            url = "https://sso.example.com/realms/main"
            enabled = false
            "#,
        )
        .unwrap_or_else(|e| unreachable!("settings should parse: {e}"));

        assert_eq!(settings.http.timeout_secs, 5);
        assert_eq!(
            settings.provider("gitlab"),
            Some(
                &ProviderConfig::new("abc", "s3cret", "https://app.example.com/callback")
                    .with_scopes("api")
            )
        );

        let keycloak = settings
            .provider("keycloak")
            .unwrap_or_else(|| unreachable!("keycloak should be configured"));
        assert!(!keycloak.enabled);
        assert_eq!(keycloak.url.as_deref(), Some("https://sso.example.com/realms/main"));
        assert!(settings.provider("github").is_none());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let settings = Settings::load(Path::new("/nonexistent/idlink.toml"));
        assert!(settings.is_ok());
    }
}
