//! `OAuth2` authorization-code client.
//!
//! Thin wrapper over the `oauth2` crate: builds the authorize URL and
//! exchanges codes at the token endpoint. Failures are passed through
//! variant for variant as [`TokenError`].

use std::time::Duration;

use oauth2::basic::{BasicClient, BasicTokenResponse, BasicTokenType};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, ErrorResponse, RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl,
};

use idlink_domain::{ConfigError, OAuthToken, ProviderConfig, TokenError};

/// Upper bound on a single token request.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Authorization and token endpoint URLs of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint.
    pub token_url: String,
}

impl OAuthEndpoints {
    /// Joins the provider's fixed path templates onto a resolved host.
    #[must_use]
    pub fn from_host(host: &str, auth_path: &str, token_path: &str) -> Self {
        Self {
            auth_url: format!("{host}{auth_path}"),
            token_url: format!("{host}{token_path}"),
        }
    }
}

/// `OAuth2` client bound to one provider's endpoints and scopes.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: ConfiguredClient,
    http_client: oauth2::reqwest::Client,
    endpoints: OAuthEndpoints,
    scopes: Vec<String>,
}

impl OAuthClient {
    /// Creates a client for `config` against `endpoints`.
    ///
    /// Client credentials are sent in the request body, which every
    /// supported provider accepts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if an endpoint or the redirect
    /// URI does not parse, and [`ConfigError::Http`] if the HTTP client
    /// cannot be built.
    pub fn new(
        config: &ProviderConfig,
        endpoints: OAuthEndpoints,
        scopes: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let auth_url = AuthUrl::new(endpoints.auth_url.clone())
            .map_err(|e| invalid_url("auth_url", &e))?;
        let token_url = TokenUrl::new(endpoints.token_url.clone())
            .map_err(|e| invalid_url("token_url", &e))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.trim().to_string())
            .map_err(|e| invalid_url("redirect_uri", &e))?;

        let client = BasicClient::new(ClientId::new(config.client_id.trim().to_string()))
            .set_client_secret(ClientSecret::new(config.secret.trim().to_string()))
            .set_auth_type(AuthType::RequestBody)
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        // Token endpoints must not redirect; following one would leak the code.
        let http_client = oauth2::reqwest::ClientBuilder::new()
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;

        Ok(Self {
            client,
            http_client,
            endpoints,
            scopes,
        })
    }

    /// The endpoints this client talks to.
    #[must_use]
    pub const fn endpoints(&self) -> &OAuthEndpoints {
        &self.endpoints
    }

    /// The scopes requested during authorization.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Authorization URL carrying the caller's CSRF `state`.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .url();
        url.to_string()
    }

    /// Exchanges an authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns the `oauth2` failure mapped one to one onto [`TokenError`].
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthToken, TokenError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(map_token_error)?;

        token_from_response(&response)
    }
}

fn invalid_url(field: &'static str, error: &url::ParseError) -> ConfigError {
    ConfigError::InvalidUrl {
        field,
        message: error.to_string(),
    }
}

fn map_token_error<RE, T>(error: RequestTokenError<RE, T>) -> TokenError
where
    RE: std::error::Error + 'static,
    T: ErrorResponse + 'static,
{
    match error {
        RequestTokenError::ServerResponse(response) => {
            // Standard error responses serialize to {"error": ..., "error_description": ...}.
            let value = serde_json::to_value(&response).unwrap_or_default();
            TokenError::Rejected {
                error: value
                    .get("error")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown_error")
                    .to_string(),
                description: value
                    .get("error_description")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from),
            }
        }
        RequestTokenError::Request(e) => TokenError::Transport(error_chain(&e)),
        RequestTokenError::Parse(e, body) => TokenError::Parse {
            message: e.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
        },
        RequestTokenError::Other(message) => TokenError::Other(message),
    }
}

/// Renders an error with all of its sources.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn token_from_response(response: &BasicTokenResponse) -> Result<OAuthToken, TokenError> {
    let access_token = response.access_token().secret();
    if access_token.is_empty() {
        return Err(TokenError::MissingAccessToken);
    }

    let token_type = match response.token_type() {
        BasicTokenType::Bearer => "Bearer".to_string(),
        BasicTokenType::Mac => "MAC".to_string(),
        BasicTokenType::Extension(other) => other.clone(),
    };

    let scopes = response
        .scopes()
        .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
        .unwrap_or_default();

    Ok(OAuthToken::new(
        access_token.clone(),
        token_type,
        response.expires_in().map(|d| d.as_secs()),
        response.refresh_token().map(|t| t.secret().clone()),
        scopes,
    ))
}
