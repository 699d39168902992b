//! HTTP helpers shared by the provider adapters.

mod fetch;

pub use fetch::AuthenticatedFetcher;
