//! Keycloak provider.
//!
//! Keycloak has no public SaaS host: the configured URL must point at the
//! realm (e.g. `https://sso.example.com/realms/main`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use idlink_application::{
    IdentityProvider, RequestContext, VerificationRule, compose_scopes, default_verification_rule,
    host_override, normalize,
};
use idlink_domain::{
    CanonicalIdentity, ConfigError, EmailVerification, FetchError, OAuthToken, ProfileFields,
    ProviderConfig, TokenError,
};

use crate::http::AuthenticatedFetcher;
use crate::oauth::{OAuthClient, OAuthEndpoints};

/// Registry name.
pub const NAME: &str = "keycloak";

const AUTHORIZE_PATH: &str = "/protocol/openid-connect/auth";
const TOKEN_PATH: &str = "/protocol/openid-connect/token";
const USERINFO_PATH: &str = "/protocol/openid-connect/userinfo";
const DEFAULT_SCOPES: &[&str] = &["profile", "email"];

/// OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
struct KeycloakUser {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl From<KeycloakUser> for ProfileFields {
    fn from(user: KeycloakUser) -> Self {
        Self {
            id: user.sub,
            email: user.email.unwrap_or_default(),
            verification: EmailVerification::Flag(user.email_verified.unwrap_or(false)),
            name: user.name.unwrap_or_default(),
            picture: user.picture.unwrap_or_default(),
        }
    }
}

/// Keycloak identity provider.
#[derive(Debug)]
pub struct KeycloakProvider {
    oauth: OAuthClient,
    fetcher: Arc<AuthenticatedFetcher>,
    host: String,
    verification_rule: VerificationRule,
}

impl KeycloakProvider {
    /// Creates the adapter from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHost`] when no realm URL is
    /// configured, and other [`ConfigError`]s for incomplete or invalid
    /// configuration.
    pub fn new(
        config: &ProviderConfig,
        fetcher: Arc<AuthenticatedFetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let Some(host) = host_override(config.url_or_empty()) else {
            return Err(ConfigError::MissingHost("Keycloak"));
        };

        let oauth = OAuthClient::new(
            config,
            OAuthEndpoints::from_host(&host, AUTHORIZE_PATH, TOKEN_PATH),
            compose_scopes(DEFAULT_SCOPES, config.scopes_or_empty()),
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
}

/// Registry constructor.
///
/// # Errors
///
/// See [`KeycloakProvider::new`].
pub fn build(
    config: &ProviderConfig,
    fetcher: Arc<AuthenticatedFetcher>,
) -> Result<Arc<dyn IdentityProvider>, ConfigError> {
    Ok(Arc::new(KeycloakProvider::new(config, fetcher)?))
}

#[async_trait]
impl IdentityProvider for KeycloakProvider {
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
        let url = format!("{}{USERINFO_PATH}", self.host);
        let user: KeycloakUser = self.fetcher.fetch(ctx, token, &url).await?;

        Ok(normalize(&self.host, user.into(), self.verification_rule))
    }
}
