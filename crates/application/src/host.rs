//! Provider host resolution
//!
//! Turns an optional self-hosted base URL into the concrete host the
//! adapters address. Pure string handling, no network access.

/// Scheme used when the configured value carries none.
const DEFAULT_SCHEME: &str = "https";

/// Resolves the host an adapter talks to.
///
/// The configured value wins when [`host_override`] accepts it; otherwise
/// `default_host` is resolved the same way. Returns an empty string when
/// neither names a host. Resolving an already resolved host returns it
/// unchanged.
#[must_use]
pub fn resolve_host(configured: &str, default_host: &str) -> String {
    host_override(configured)
        .or_else(|| host_override(default_host))
        .unwrap_or_default()
}

/// Normalizes a self-hosted base URL.
///
/// The value is trimmed, given an `https://` scheme if it has none, and
/// stripped of trailing slashes. Returns `None` when nothing is left after
/// the scheme (`""`, `"/"`, `"https://"`).
#[must_use]
pub fn host_override(configured: &str) -> Option<String> {
    let configured = configured.trim();
    let (scheme, rest) = split_scheme(configured).unwrap_or((DEFAULT_SCHEME, configured));
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{rest}"))
}

fn split_scheme(value: &str) -> Option<(&str, &str)> {
    value.split_once("://").filter(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
