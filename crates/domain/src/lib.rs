//! idlink Domain - Core identity types
//!
//! This crate defines the data model shared by the identity adapters:
//! provider configuration, tokens, the canonical identity record and the
//! error taxonomy. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;

pub use auth::OAuthToken;
pub use config::ProviderConfig;
pub use error::{ConfigError, FetchError, FetchErrorKind, IdentityError, TokenError};
pub use identity::{
    CanonicalIdentity, Claims, Email, EmailVerification, IDENTITY_SCHEMA_VERSION, LegacyClaims,
    ProfileFields,
};
