//! Query normalization and two-tier coin directory matching.

use crate::{CoinsightError, CryptoIdentity};

/// One coin as listed in a provider's directory or search response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Provider-specific coin id.
    pub id: String,
    /// Ticker symbol as listed (any case).
    pub symbol: String,
    /// Display name as listed.
    pub name: String,
}

impl DirectoryEntry {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Canonical cache and identity key for a query: trimmed and lowercased.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Find the directory entry for `query`.
///
/// An exact case-insensitive symbol match is preferred; otherwise the first
/// case-insensitive name match is returned. Directory order breaks ties.
#[must_use]
pub fn match_directory<'a>(
    entries: &'a [DirectoryEntry],
    query: &str,
) -> Option<&'a DirectoryEntry> {
    let q = query.trim();
    if q.is_empty() {
        return None;
    }
    entries
        .iter()
        .find(|e| e.symbol.trim().eq_ignore_ascii_case(q))
        .or_else(|| entries.iter().find(|e| e.name.trim().eq_ignore_ascii_case(q)))
}

/// Resolve `query` against `entries` into an identity carrying `provider`'s id.
///
/// # Errors
/// Returns `IdentityNotFound` when neither tier matches.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "coinsight::core::resolve_from_directory",
        level = "debug",
        skip(entries),
        fields(entries = entries.len()),
    )
)]
pub fn resolve_from_directory(
    provider: &str,
    query: &str,
    entries: &[DirectoryEntry],
) -> Result<CryptoIdentity, CoinsightError> {
    match_directory(entries, query)
        .map(|e| {
            CryptoIdentity::new(query, &e.symbol, e.name.as_str())
                .with_provider_id(provider, e.id.as_str())
        })
        .ok_or_else(|| CoinsightError::identity_not_found(provider, query))
}
