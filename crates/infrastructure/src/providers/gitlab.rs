//! GitLab provider (gitlab.com or a self-managed instance).

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
pub const NAME: &str = "gitlab";

const DEFAULT_HOST: &str = "gitlab.com";
const AUTHORIZE_PATH: &str = "/oauth/authorize";
const TOKEN_PATH: &str = "/oauth/token";
const USER_PATH: &str = "/api/v4/user";
const DEFAULT_SCOPES: &[&str] = &["read_user"];

/// Subset of `GET /api/v4/user`.
#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: i64,
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    confirmed_at: Option<String>,
}

impl From<GitLabUser> for ProfileFields {
    fn from(user: GitLabUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.unwrap_or_default(),
            verification: EmailVerification::ConfirmedAt(user.confirmed_at),
            name: user.name.unwrap_or_default(),
            picture: user.avatar_url.unwrap_or_default(),
        }
    }
}

/// GitLab identity provider.
#[derive(Debug)]
pub struct GitLabProvider {
    oauth: OAuthClient,
    fetcher: Arc<AuthenticatedFetcher>,
    host: String,
    verification_rule: VerificationRule,
}

impl GitLabProvider {
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
/// See [`GitLabProvider::new`].
pub fn build(
    config: &ProviderConfig,
    fetcher: Arc<AuthenticatedFetcher>,
) -> Result<Arc<dyn IdentityProvider>, ConfigError> {
    Ok(Arc::new(GitLabProvider::new(config, fetcher)?))
}

#[async_trait]
impl IdentityProvider for GitLabProvider {
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
        let url = format!("{}{USER_PATH}", self.host);
        let user: GitLabUser = self.fetcher.fetch(ctx, token, &url).await?;

        Ok(normalize(&self.host, user.into(), self.verification_rule))
    }
}
