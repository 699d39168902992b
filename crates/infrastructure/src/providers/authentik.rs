//! authentik provider.
//!
//! authentik is usually self-hosted; the configured URL replaces the
//! public host for every endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use idlink_application::{
    IdentityProvider, RequestContext, VerificationRule, compose_scopes, default_verification_rule,
    normalize, resolve_host,
};
use idlink_domain::{
    CanonicalIdentity, ConfigError, EmailVerification, FetchError, OAuthToken, ProfileFields,
    ProviderConfig, TokenError,
};

use crate::http::AuthenticatedFetcher;
use crate::oauth::{OAuthClient, OAuthEndpoints};

/// Registry name.
pub const NAME: &str = "authentik";

const DEFAULT_HOST: &str = "authentik.com";
const AUTHORIZE_PATH: &str = "/application/o/authorize/";
const TOKEN_PATH: &str = "/application/o/token/";
const USERINFO_PATH: &str = "/application/o/userinfo/";
const DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "profile",
    "read_user",
    "user",
    "email",
    "offline_access",
];

#[derive(Debug, Deserialize)]
struct AuthentikUser {
    id: i64,
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    confirmed_at: Option<String>,
}

impl From<AuthentikUser> for ProfileFields {
    fn from(user: AuthentikUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.unwrap_or_default(),
            verification: EmailVerification::ConfirmedAt(user.confirmed_at),
            name: user.name.unwrap_or_default(),
            picture: user.avatar_url.unwrap_or_default(),
        }
    }
}

/// authentik identity provider.
#[derive(Debug)]
pub struct AuthentikProvider {
    oauth: OAuthClient,
    fetcher: Arc<AuthenticatedFetcher>,
    host: String,
    verification_rule: VerificationRule,
}

impl AuthentikProvider {
    /// Creates the adapter from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is incomplete or a
    /// derived URL is invalid.
    pub fn new(
        config: &ProviderConfig,
        fetcher: Arc<AuthenticatedFetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let host = resolve_host(config.url_or_empty(), DEFAULT_HOST);
        let scopes = compose_scopes(DEFAULT_SCOPES, config.scopes_or_empty());
        let oauth = OAuthClient::new(
            config,
            OAuthEndpoints::from_host(&host, AUTHORIZE_PATH, TOKEN_PATH),
            scopes,
        )?;

        tracing::debug!(provider = NAME, %host, "provider configured");

        Ok(Self {
            oauth,
            fetcher,
            host,
            verification_rule: default_verification_rule,
        })
    }

    /// Replaces the email verification rule.
    #[must_use]
    pub fn with_verification_rule(mut self, rule: VerificationRule) -> Self {
        self.verification_rule = rule;
        self
    }

    /// Userinfo endpoint URL.
    #[must_use]
    pub fn userinfo_url(&self) -> String {
        format!("{}{USERINFO_PATH}", self.host)
    }
}

/// Registry constructor.
///
/// # Errors
///
/// See [`AuthentikProvider::new`].
pub fn build(
    config: &ProviderConfig,
    fetcher: Arc<AuthenticatedFetcher>,
) -> Result<Arc<dyn IdentityProvider>, ConfigError> {
    Ok(Arc::new(AuthentikProvider::new(config, fetcher)?))
}

#[async_trait]
impl IdentityProvider for AuthentikProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn issuer(&self) -> &str {
        &self.host
    }

    fn scopes(&self) -> &[String] {
        self.oauth.scopes()
    }

    fn authorization_url(&self, state: &str) -> String {
        self.oauth.authorization_url(state)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, TokenError> {
        self.oauth.exchange_code(code).await
    }

    async fn fetch_identity(
        &self,
        ctx: &RequestContext,
        token: &OAuthToken,
    ) -> Result<CanonicalIdentity, FetchError> {
        let user: AuthentikUser = self
            .fetcher
            .fetch(ctx, token, &self.userinfo_url())
            .await?;

        Ok(normalize(&self.host, user.into(), self.verification_rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fetcher() -> Arc<AuthenticatedFetcher> {
        Arc::new(
            AuthenticatedFetcher::new().unwrap_or_else(|e| unreachable!("fetcher should build: {e}")),
        )
    }

    fn config() -> ProviderConfig {
        ProviderConfig::new("client", "secret", "https://app.example.com/callback")
    }

    #[test]
    fn test_default_host_and_endpoints() {
        let provider = AuthentikProvider::new(&config(), fetcher())
            .unwrap_or_else(|e| unreachable!("provider should build: {e}"));

        assert_eq!(provider.issuer(), "https://authentik.com");
        assert_eq!(
            provider.oauth.endpoints(),
            &OAuthEndpoints {
                auth_url: "https://authentik.com/application/o/authorize/".to_string(),
                token_url: "https://authentik.com/application/o/token/".to_string(),
            }
        );
        assert_eq!(
            provider.userinfo_url(),
            "https://authentik.com/application/o/userinfo/"
        );
    }

    #[test]
    fn test_self_hosted_override() {
        let provider =
            AuthentikProvider::new(&config().with_url("sso.corp.example/"), fetcher())
                .unwrap_or_else(|e| unreachable!("provider should build: {e}"));

        assert_eq!(provider.issuer(), "https://sso.corp.example");
        assert!(
            provider
                .authorization_url("s")
                .starts_with("https://sso.corp.example/application/o/authorize/")
        );
    }

    #[test]
    fn test_scopes_extend_defaults() {
        let provider = AuthentikProvider::new(&config().with_scopes("extra1,extra2"), fetcher())
            .unwrap_or_else(|e| unreachable!("provider should build: {e}"));

        assert_eq!(
            provider.scopes(),
            [
                "openid",
                "profile",
                "read_user",
                "user",
                "email",
                "offline_access",
                "extra1",
                "extra2"
            ]
        );
    }

    #[test]
    fn test_incomplete_config_rejected() {
        let mut incomplete = config();
        incomplete.secret = String::new();

        let err = AuthentikProvider::new(&incomplete, fetcher())
            .err()
            .unwrap_or_else(|| unreachable!("missing secret should be rejected"));
        assert_eq!(err, ConfigError::MissingField("secret"));
    }

    #[test]
    fn test_profile_extraction() {
        let user: AuthentikUser = serde_json::from_value(serde_json::json!({
            "id": 42,
            "email": "a@b.com",
            "confirmed_at": "2024-01-01",
            "name": "Ann",
            "avatar_url": "http://x/y.png"
        }))
        .unwrap_or_else(|e| unreachable!("profile should decode: {e}"));

        assert_eq!(
            ProfileFields::from(user),
            ProfileFields {
                id: "42".to_string(),
                email: "a@b.com".to_string(),
                verification: EmailVerification::ConfirmedAt(Some("2024-01-01".to_string())),
                name: "Ann".to_string(),
                picture: "http://x/y.png".to_string(),
            }
        );
    }

    #[test]
    fn test_profile_with_nulls() {
        let user: AuthentikUser = serde_json::from_value(serde_json::json!({
            "id": 7,
            "email": null,
            "confirmed_at": null
        }))
        .unwrap_or_else(|e| unreachable!("profile should decode: {e}"));

        let fields = ProfileFields::from(user);
        assert_eq!(fields.email, "");
        assert_eq!(fields.verification, EmailVerification::ConfirmedAt(None));
    }

    #[test]
    fn test_profile_without_id_rejected() {
        let result = serde_json::from_value::<AuthentikUser>(serde_json::json!({
            "email": "a@b.com"
        }));
        assert!(result.is_err());
    }
}
