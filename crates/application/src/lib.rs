//! idlink Application - Ports and provider-independent logic
//!
//! This crate defines:
//! - The `IdentityProvider` port every adapter implements
//! - Host resolution and scope composition
//! - Claims normalization
//! - The request context (deadline and cancellation) passed into fetches

pub mod context;
pub mod host;
pub mod normalize;
pub mod ports;
pub mod scopes;

pub use context::{CancellationReceiver, CancellationToken, ContextDone, RequestContext};
pub use host::{host_override, resolve_host};
pub use normalize::{VerificationRule, default_verification_rule, normalize};
pub use ports::IdentityProvider;
pub use scopes::compose_scopes;
