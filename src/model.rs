//! Result and summary types returned by backends.
//!
//! `LookupResult` is the structured response of a CURIE lookup. It mirrors
//! the JSON shape served by biolookup instances, so the same type is used to
//! decode responses in the remote backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provider name to resolvable URL for one entity.
pub type Providers = BTreeMap<String, String>;

/// A cross-reference from an entity to an entity in another vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xref {
    /// Prefix of the referenced entity.
    pub xref_prefix: String,
    /// Identifier of the referenced entity.
    pub xref_identifier: String,
    /// Where the cross-reference came from.
    pub provenance: String,
}

impl Xref {
    /// Creates a new cross-reference.
    #[must_use]
    pub fn new(
        xref_prefix: impl Into<String>,
        xref_identifier: impl Into<String>,
        provenance: impl Into<String>,
    ) -> Self {
        Self {
            xref_prefix: xref_prefix.into(),
            xref_identifier: xref_identifier.into(),
            provenance: provenance.into(),
        }
    }
}

/// A typed edge from an entity to a target entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Prefix of the relation type (e.g. `ro`).
    pub relation_prefix: String,
    /// Identifier of the relation type (e.g. `0002211`).
    pub relation_identifier: String,
    /// Prefix of the target entity.
    pub target_prefix: String,
    /// Identifier of the target entity.
    pub target_identifier: String,
}

/// The outcome of resolving one CURIE.
///
/// Optional attributes that are absent or empty are omitted on
/// serialization rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    /// The CURIE exactly as it was queried.
    pub query: String,

    /// Normalized prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Identifier, after alternate-id redirection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Canonical name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Definition text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Species, usually an NCBI taxonomy identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,

    /// Synonyms, in storage order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,

    /// Cross-references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xrefs: Option<Vec<Xref>>,

    /// Relations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<Relation>>,

    /// Provider URLs for the (possibly redirected) identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Providers>,

    /// Whether the lookup found a name.
    pub success: bool,

    /// Human-readable reason for a failed lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LookupResult {
    /// Creates a failed result that only echoes the query.
    #[must_use]
    pub fn failure(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Creates a successful result for a resolved entity.
    #[must_use]
    pub fn found(
        query: impl Into<String>,
        prefix: impl Into<String>,
        identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            prefix: Some(prefix.into()),
            identifier: Some(identifier.into()),
            name: Some(name.into()),
            success: true,
            ..Self::default()
        }
    }

    /// Sets the prefix and identifier the result refers to.
    #[must_use]
    pub fn with_reference(
        mut self,
        prefix: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        self.prefix = Some(prefix.into());
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets the provider URLs.
    #[must_use]
    pub fn with_providers(mut self, providers: Providers) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Adds a single provider entry, creating the map if needed.
    ///
    /// Serving layers use this to add a link back to themselves.
    #[must_use]
    pub fn with_provider(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.providers
            .get_or_insert_with(Providers::new)
            .insert(name.into(), url.into());
        self
    }

    /// Returns the `prefix:identifier` CURIE of the resolved entity, if any.
    #[must_use]
    pub fn curie(&self) -> Option<String> {
        match (&self.prefix, &self.identifier) {
            (Some(prefix), Some(identifier)) => Some(format!("{prefix}:{identifier}")),
            _ => None,
        }
    }
}

/// Per-prefix record counts for one attribute kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryCounter(BTreeMap<String, u64>);

impl SummaryCounter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the count for a prefix.
    pub fn insert(&mut self, prefix: impl Into<String>, count: u64) {
        self.0.insert(prefix.into(), count);
    }

    /// Count for `prefix`, zero when absent.
    #[must_use]
    pub fn get(&self, prefix: &str) -> u64 {
        self.0.get(prefix).copied().unwrap_or(0)
    }

    /// Sum over all prefixes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of prefixes with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no prefix has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(prefix, count)` pairs in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Consumes the counter into its underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, u64> {
        self.0
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for SummaryCounter {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Counts of every attribute kind for one prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixSummary {
    /// The prefix.
    pub prefix: String,
    /// Display name from the registry, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Number of names.
    pub names: u64,
    /// Number of alternate identifiers.
    pub alts: u64,
    /// Number of definitions.
    pub definitions: u64,
    /// Number of species links.
    pub species: u64,
    /// Number of synonyms.
    pub synonyms: u64,
    /// Number of cross-references.
    pub xrefs: u64,
    /// Number of relations.
    pub rels: u64,
}
