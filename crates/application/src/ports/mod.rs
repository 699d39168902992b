//! Port definitions (interfaces)
//!
//! Ports define the boundary between the provider-independent core and the
//! adapters in the infrastructure layer.

mod identity_provider;

pub use identity_provider::IdentityProvider;
