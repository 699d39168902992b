//! Generic values extracted from a provider profile

use serde::{Deserialize, Serialize};

/// How a provider expresses that an email address is verified.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EmailVerification {
    /// A "confirmed at" timestamp; absent or empty when unconfirmed.
    ConfirmedAt(Option<String>),
    /// An explicit boolean.
    Flag(bool),
    /// The provider has no verification concept.
    #[default]
    Unsupported,
}

/// Provider-agnostic profile values, ready for normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileFields {
    /// Provider user id rendered as a string.
    pub id: String,
    /// Reported email; empty when the provider supplied none.
    pub email: String,
    /// Verification marker for `email`.
    pub verification: EmailVerification,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub picture: String,
}
