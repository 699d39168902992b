//! Scope composition

/// Appends caller-supplied scopes to a provider's defaults.
///
/// `extra` is a comma-separated list. Each entry is trimmed and empty
/// entries are skipped. Order is preserved and nothing is deduplicated.
#[must_use]
pub fn compose_scopes(defaults: &[&str], extra: &str) -> Vec<String> {
    defaults
        .iter()
        .map(|s| (*s).to_string())
        .chain(
            extra
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        )
        .collect()
}
