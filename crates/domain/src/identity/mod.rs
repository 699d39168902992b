//! Identity types produced by the adapters

mod claims;
mod profile;

pub use claims::{CanonicalIdentity, Claims, Email, IDENTITY_SCHEMA_VERSION, LegacyClaims};
pub use profile::{EmailVerification, ProfileFields};
