//! Third-party identity provider adapters.

pub mod authentik;
pub mod github;
pub mod gitlab;
pub mod keycloak;
mod registry;

pub use authentik::AuthentikProvider;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use keycloak::KeycloakProvider;
pub use registry::{ProviderConstructor, ProviderRegistry, RegistryError};
