//! Name-to-constructor lookup for provider adapters.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use idlink_application::IdentityProvider;
use idlink_domain::{ConfigError, ProviderConfig};

use super::{authentik, github, gitlab, keycloak};
use crate::http::AuthenticatedFetcher;

/// Builds an adapter from its configuration and the shared fetcher.
pub type ProviderConstructor = fn(
    &ProviderConfig,
    Arc<AuthenticatedFetcher>,
) -> Result<Arc<dyn IdentityProvider>, ConfigError>;

/// Errors from [`ProviderRegistry::build`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No constructor is registered under this name.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The constructor rejected the configuration.
    #[error("invalid configuration for provider {provider}: {source}")]
    Config {
        /// Provider name.
        provider: String,
        /// Construction failure.
        #[source]
        source: ConfigError,
    },
}

/// Registered provider constructors sharing one fetcher.
#[derive(Clone)]
pub struct ProviderRegistry {
    fetcher: Arc<AuthenticatedFetcher>,
    constructors: BTreeMap<String, ProviderConstructor>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish_non_exhaustive()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new(fetcher: Arc<AuthenticatedFetcher>) -> Self {
        Self {
            fetcher,
            constructors: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in provider.
    #[must_use]
    pub fn builtin(fetcher: Arc<AuthenticatedFetcher>) -> Self {
        let mut registry = Self::new(fetcher);
        registry.register(authentik::NAME, authentik::build);
        registry.register(github::NAME, github::build);
        registry.register(gitlab::NAME, gitlab::build);
        registry.register(keycloak::NAME, keycloak::build);
        registry
    }

    /// Registers `constructor` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, constructor: ProviderConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Constructs the adapter registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProvider`] for unregistered names
    /// and [`RegistryError::Config`] when the configuration is rejected.
    pub fn build(
        &self,
        name: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn IdentityProvider>, RegistryError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;

        constructor(config, Arc::clone(&self.fetcher)).map_err(|source| {
            tracing::warn!(provider = name, error = %source, "provider configuration rejected");
            RegistryError::Config {
                provider: name.to_string(),
                source,
            }
        })
    }
}
