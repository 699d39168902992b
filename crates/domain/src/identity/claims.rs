//! Canonical identity record

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Version of the serialized identity schema.
///
/// Version 1 still emits the legacy mirror fields (`avatar_url`,
/// `full_name`, `provider_id`). They are dropped in version 2; consumers
/// must move to `picture`, `name` and `sub` before then.
pub const IDENTITY_SCHEMA_VERSION: u32 = 1;

/// An email address reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// The address as reported.
    pub email: String,
    /// Whether the provider vouches for the address.
    pub verified: bool,
    /// Whether this is the account's primary address.
    pub primary: bool,
}

/// Normalized identity claims, analogous to OpenID Connect claims.
///
/// The legacy mirror fields are derived from the canonical ones at
/// serialization time and therefore cannot diverge from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Issuer: the resolved provider host.
    #[serde(rename = "iss", default)]
    pub issuer: String,
    /// Subject: the provider's user id rendered as a string.
    #[serde(rename = "sub", default)]
    pub subject: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub picture: String,
}

/// Read-only view of the deprecated claim fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyClaims<'a> {
    /// Mirror of [`Claims::picture`].
    pub avatar_url: &'a str,
    /// Mirror of [`Claims::name`].
    pub full_name: &'a str,
    /// Mirror of [`Claims::subject`].
    pub provider_id: &'a str,
}

impl Claims {
    /// Creates claims from their canonical parts.
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        name: impl Into<String>,
        picture: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            name: name.into(),
            picture: picture.into(),
        }
    }

    /// Deprecated fields, mirrored from the canonical ones.
    #[must_use]
    pub fn legacy(&self) -> LegacyClaims<'_> {
        LegacyClaims {
            avatar_url: &self.picture,
            full_name: &self.name,
            provider_id: &self.subject,
        }
    }
}

impl Serialize for Claims {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let legacy = self.legacy();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("iss", &self.issuer)?;
        map.serialize_entry("sub", &self.subject)?;
        if !self.name.is_empty() {
            map.serialize_entry("name", &self.name)?;
        }
        if !self.picture.is_empty() {
            map.serialize_entry("picture", &self.picture)?;
        }

        if !legacy.avatar_url.is_empty() {
            map.serialize_entry("avatar_url", legacy.avatar_url)?;
        }
        if !legacy.full_name.is_empty() {
            map.serialize_entry("full_name", legacy.full_name)?;
        }
        if !legacy.provider_id.is_empty() {
            map.serialize_entry("provider_id", legacy.provider_id)?;
        }
        map.end()
    }
}

/// Provider-agnostic identity handed back to the calling system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    /// Output schema version, see [`IDENTITY_SCHEMA_VERSION`].
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    /// Reported addresses, at most one entry per address.
    #[serde(default)]
    pub emails: Vec<Email>,
    /// Normalized claims.
    pub claims: Claims,
}

const fn current_schema_version() -> u32 {
    IDENTITY_SCHEMA_VERSION
}

impl CanonicalIdentity {
    /// Creates an identity at the current schema version.
    #[must_use]
    pub const fn new(emails: Vec<Email>, claims: Claims) -> Self {
        Self {
            schema_version: IDENTITY_SCHEMA_VERSION,
            emails,
            claims,
        }
    }

    /// The primary address, if any.
    #[must_use]
    pub fn primary_email(&self) -> Option<&Email> {
        self.emails.iter().find(|e| e.primary)
    }
}
