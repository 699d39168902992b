//! Identity provider port

use async_trait::async_trait;
use idlink_domain::{CanonicalIdentity, FetchError, OAuthToken, TokenError};

use crate::context::RequestContext;

/// Contract every external identity provider adapter implements.
///
/// Implementations are immutable after construction and shared across
/// concurrent logins without locking.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Registry name of the provider (e.g. "gitlab").
    fn name(&self) -> &str;

    /// Resolved provider host, used as the identity issuer.
    fn issuer(&self) -> &str;

    /// Scopes requested during authorization.
    fn scopes(&self) -> &[String];

    /// Authorization URL the user is redirected to.
    ///
    /// `state` is the caller's CSRF token and is echoed back on the callback.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns the exchange failure as reported by the OAuth2 client.
    /// Nothing is retried.
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, TokenError>;

    /// Fetches the authenticated user's profile and normalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the userinfo request fails, answers with a
    /// non-success status, cannot be decoded, or `ctx` finishes first.
    async fn fetch_identity(
        &self,
        ctx: &RequestContext,
        token: &OAuthToken,
    ) -> Result<CanonicalIdentity, FetchError>;
}
