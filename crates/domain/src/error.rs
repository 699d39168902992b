//! Domain error types

use thiserror::Error;

/// Invalid or incomplete provider configuration.
///
/// Raised once, when an adapter is constructed. An adapter that failed
/// with this error is unusable until its configuration is corrected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The provider is switched off in configuration.
    #[error("provider is not enabled")]
    Disabled,

    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A configured or derived URL does not parse.
    #[error("invalid URL in {field}: {message}")]
    InvalidUrl {
        /// Which URL was rejected.
        field: &'static str,
        /// Parser message.
        message: String,
    },

    /// The provider has no public default host and none was configured.
    #[error("unable to find URL for the {0} provider")]
    MissingHost(&'static str),

    /// The shared HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Authorization-code exchange failed.
///
/// Mirrors the failure modes of the underlying OAuth2 client one to one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token endpoint answered with an OAuth2 error response.
    #[error("token endpoint rejected the code: {error}")]
    Rejected {
        /// OAuth2 error code (e.g. `invalid_grant`).
        error: String,
        /// Optional human readable description.
        description: Option<String>,
    },

    /// The token request never completed.
    #[error("token request failed: {0}")]
    Transport(String),

    /// The token endpoint answered with a body that is not a token response.
    #[error("failed to parse token response: {message}")]
    Parse {
        /// Parser message.
        message: String,
        /// Raw response body, lossily decoded.
        body: String,
    },

    /// Any other failure reported by the OAuth2 client.
    #[error("token exchange failed: {0}")]
    Other(String),

    /// The token response did not carry an access token.
    #[error("token response has no access token")]
    MissingAccessToken,
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The provider could not be reached (includes cancellation and deadlines).
    Transport,
    /// The provider answered with a non-success status.
    Status,
    /// The provider answered with data of an unexpected shape.
    Decode,
}

/// Identity retrieval failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Error description.
        message: String,
    },

    /// Non-2xx response.
    #[error("request to {url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Beginning of the response body.
        body: String,
    },

    /// Body did not decode into the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// The caller cancelled the request.
    #[error("request to {url} was cancelled")]
    Cancelled {
        /// Requested URL.
        url: String,
    },

    /// The caller's deadline elapsed before the request completed.
    #[error("request to {url} exceeded its deadline")]
    DeadlineExceeded {
        /// Requested URL.
        url: String,
    },
}

impl FetchError {
    /// Folds the error into one of the three reportable kinds.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Transport { .. } | Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => {
                FetchErrorKind::Transport
            }
            Self::Status { .. } => FetchErrorKind::Status,
            Self::Decode { .. } => FetchErrorKind::Decode,
        }
    }

    /// Returns true if the request was aborted by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Any failure of the identity adapter layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Construction failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Code exchange failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Identity fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        let url = "https://example.com/user".to_string();

        let err = FetchError::Status {
            url: url.clone(),
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.kind(), FetchErrorKind::Status);

        let err = FetchError::Decode {
            url: url.clone(),
            message: "missing field `id`".to_string(),
        };
        assert_eq!(err.kind(), FetchErrorKind::Decode);

        let err = FetchError::Cancelled { url: url.clone() };
        assert_eq!(err.kind(), FetchErrorKind::Transport);
        assert!(err.is_cancelled());

        let err = FetchError::DeadlineExceeded { url };
        assert_eq!(err.kind(), FetchErrorKind::Transport);
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_identity_error_from() {
        let err: IdentityError = ConfigError::MissingField("client_id").into();
        assert_eq!(err.to_string(), "missing required field: client_id");

        let err: IdentityError = TokenError::MissingAccessToken.into();
        assert!(matches!(err, IdentityError::Token(_)));
    }
}
