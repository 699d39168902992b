//! idlink infrastructure: HTTP and `OAuth2` adapters
//!
//! Concrete [`IdentityProvider`](idlink_application::IdentityProvider)
//! implementations for the supported providers, built on `oauth2` for the
//! code exchange and `reqwest` for userinfo requests.

pub mod http;
pub mod oauth;
pub mod providers;

pub use http::AuthenticatedFetcher;
pub use oauth::{OAuthClient, OAuthEndpoints};
pub use providers::{
    AuthentikProvider, GitHubProvider, GitLabProvider, KeycloakProvider, ProviderConstructor,
    ProviderRegistry, RegistryError,
};
