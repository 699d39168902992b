//! OAuth token types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token obtained from an authorization-code exchange.
///
/// Opaque to the adapters beyond being the bearer credential presented to
/// the userinfo endpoint. Never persisted by this crate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The access token string
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// When the token expires (if known)
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token, present when offline access was granted
    pub refresh_token: Option<String>,
    /// Scopes granted by this token
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When this token was obtained
    pub obtained_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Create a new token with current timestamp.
    #[must_use]
    pub fn new(
        access_token: String,
        token_type: String,
        expires_in_secs: Option<u64>,
        refresh_token: Option<String>,
        scopes: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        let expires_at = expires_in_secs.and_then(|secs| {
            i64::try_from(secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .and_then(|d| now.checked_add_signed(d))
        });

        Self {
            access_token,
            token_type,
            expires_at,
            refresh_token,
            scopes,
            obtained_at: now,
        }
    }

    /// Shorthand for a bearer token without expiry, refresh token or scopes.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::new(access_token.into(), "Bearer".to_string(), None, None, Vec::new())
    }
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}
