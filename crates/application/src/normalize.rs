//! Claims normalization
//!
//! Maps the generic values extracted from a provider profile into the
//! canonical identity record. Provider JSON never reaches this module.

use idlink_domain::{CanonicalIdentity, Claims, Email, EmailVerification, ProfileFields};

/// Decides whether a provider's verification marker means "verified".
pub type VerificationRule = fn(&EmailVerification) -> bool;

/// Default verification policy.
///
/// A non-empty "confirmed at" marker or a `true` flag means verified;
/// providers without a verification concept are never verified.
#[must_use]
pub fn default_verification_rule(marker: &EmailVerification) -> bool {
    match marker {
        EmailVerification::ConfirmedAt(at) => at.as_deref().is_some_and(|s| !s.trim().is_empty()),
        EmailVerification::Flag(verified) => *verified,
        EmailVerification::Unsupported => false,
    }
}

/// Builds the canonical identity for a profile fetched from `issuer`.
///
/// Whitespace around the email is dropped; a blank email yields no entry,
/// the same way a blank "confirmed at" marker counts as unverified.
#[must_use]
pub fn normalize(issuer: &str, fields: ProfileFields, rule: VerificationRule) -> CanonicalIdentity {
    let mut emails = Vec::new();
    let email = fields.email.trim();
    if !email.is_empty() {
        emails.push(Email {
            email: email.to_string(),
            verified: rule(&fields.verification),
            primary: true,
        });
    }

    CanonicalIdentity::new(
        emails,
        Claims::new(issuer, fields.id, fields.name, fields.picture),
    )
}
