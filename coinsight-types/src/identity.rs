//! Provider-resolved coin identities.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A free-text query mapped to one or more provider-specific coin ids.
///
/// The symbol is always stored uppercase. A provider id is only present when
/// that provider's identity resolution succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoIdentity {
    query: String,
    #[serde(deserialize_with = "uppercase")]
    symbol: String,
    name: String,
    provider_ids: BTreeMap<String, String>,
}

fn uppercase<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    String::deserialize(d).map(|s| s.to_uppercase())
}

impl CryptoIdentity {
    /// Create an identity without any provider ids.
    pub fn new(query: impl Into<String>, symbol: &str, name: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            symbol: symbol.trim().to_uppercase(),
            name: name.into().trim().to_string(),
            provider_ids: BTreeMap::new(),
        }
    }

    /// Attach the id a provider uses for this coin.
    #[must_use]
    pub fn with_provider_id(mut self, provider: &str, id: impl Into<String>) -> Self {
        self.provider_ids.insert(provider.to_string(), id.into());
        self
    }

    /// The query as given by the caller whose lookup created this identity.
    ///
    /// Identities are memoized per normalized query, so later callers that
    /// spell the query differently share the first caller's spelling.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Uppercase ticker symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The id `provider` uses for this coin, if it resolved one.
    #[must_use]
    pub fn provider_id(&self, provider: &str) -> Option<&str> {
        self.provider_ids.get(provider).map(String::as_str)
    }

    /// All provider ids keyed by provider name.
    #[must_use]
    pub const fn provider_ids(&self) -> &BTreeMap<String, String> {
        &self.provider_ids
    }
}
