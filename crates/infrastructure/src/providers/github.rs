//! GitHub provider (github.com or GitHub Enterprise Server).
//!
//! The profile endpoint only exposes the public email, so the primary
//! address and its verification flag come from `/user/emails`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use idlink_application::{
    IdentityProvider, RequestContext, VerificationRule, compose_scopes, default_verification_rule,
    host_override, normalize, resolve_host,
};
use idlink_domain::{
    CanonicalIdentity, ConfigError, EmailVerification, FetchError, OAuthToken, ProfileFields,
    ProviderConfig, TokenError,
};

use crate::http::AuthenticatedFetcher;
use crate::oauth::{OAuthClient, OAuthEndpoints};

/// Registry name.
pub const NAME: &str = "github";

const DEFAULT_HOST: &str = "github.com";
const PUBLIC_API: &str = "https://api.github.com";
/// API prefix of GitHub Enterprise Server.
const ENTERPRISE_API_PATH: &str = "/api/v3";
const AUTHORIZE_PATH: &str = "/login/oauth/authorize";
const TOKEN_PATH: &str = "/login/oauth/access_token";
const DEFAULT_SCOPES: &[&str] = &["user:email"];

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: Option<String>,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Combines the profile with the `/user/emails` listing.
///
/// Takes the primary address, then the first listed one, then the public
/// profile email (whose verification GitHub does not report).
fn profile_fields(user: GitHubUser, emails: &[GitHubEmail]) -> ProfileFields {
    let listed = emails
        .iter()
        .find(|e| e.primary)
        .or_else(|| emails.first());

    let (email, verification) = match listed {
        Some(entry) => (
            entry.email.clone(),
            EmailVerification::Flag(entry.verified),
        ),
        None => (
            user.email.unwrap_or_default(),
            EmailVerification::Unsupported,
        ),
    };

    let name = user
        .name
        .filter(|n| !n.is_empty())
        .or(user.login)
        .unwrap_or_default();

    ProfileFields {
        id: user.id.to_string(),
        email,
        verification,
        name,
        picture: user.avatar_url.unwrap_or_default(),
    }
}

/// GitHub identity provider.
#[derive(Debug)]
pub struct GitHubProvider {
    oauth: OAuthClient,
    fetcher: Arc<AuthenticatedFetcher>,
    host: String,
    api_base: String,
    verification_rule: VerificationRule,
}

impl GitHubProvider {
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

        let (host, api_base) = match host_override(config.url_or_empty()) {
            Some(host) => {
                let api_base = format!("{host}{ENTERPRISE_API_PATH}");
                (host, api_base)
            }
            None => (resolve_host("", DEFAULT_HOST), PUBLIC_API.to_string()),
        };

        let oauth = OAuthClient::new(
            config,
            OAuthEndpoints::from_host(&host, AUTHORIZE_PATH, TOKEN_PATH),
            compose_scopes(DEFAULT_SCOPES, config.scopes_or_empty()),
        )?;

        tracing::debug!(provider = NAME, %host, %api_base, "provider configured");

        Ok(Self {
            oauth,
            fetcher,
            host,
            api_base,
            verification_rule: default_verification_rule,
        })
    }

    /// Replaces the email verification rule.
    #[must_use]
    pub fn with_verification_rule(mut self, rule: VerificationRule) -> Self {
        self.verification_rule = rule;
        self
    }

    /// Base URL of the REST API.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

/// Registry constructor.
///
/// # Errors
///
/// See [`GitHubProvider::new`].
pub fn build(
    config: &ProviderConfig,
    fetcher: Arc<AuthenticatedFetcher>,
) -> Result<Arc<dyn IdentityProvider>, ConfigError> {
    Ok(Arc::new(GitHubProvider::new(config, fetcher)?))
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
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
        let user: GitHubUser = self
            .fetcher
            .fetch(ctx, token, &format!("{}/user", self.api_base))
            .await?;
        let emails: Vec<GitHubEmail> = self
            .fetcher
            .fetch(ctx, token, &format!("{}/user/emails", self.api_base))
            .await?;

        Ok(normalize(
            &self.host,
            profile_fields(user, &emails),
            self.verification_rule,
        ))
    }
}
