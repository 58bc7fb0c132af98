//! In-memory backend.
//!
//! Each attribute (names, alts, definitions, species, synonyms) has its own
//! [`AttributeSource`], fixed at construction:
//! - `Eager`: a fully materialized `prefix -> identifier -> value` map. Its
//!   summary is computed once and kept.
//! - `Lazy`: a [`PrefixProvider`] asked for one prefix at a time. Caching and
//!   summaries are up to the provider.
//! - `Absent`: the attribute is not loaded.
//!
//! A prefix exists iff the name source has a mapping for it, even an empty one.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use crate::backend::loader::{self, RowValue};
use crate::backend::{Backend, BackendKind};
use crate::error::BackendResult;
use crate::model::SummaryCounter;

/// `prefix -> identifier -> value`.
pub type PrefixMap<V> = HashMap<String, HashMap<String, V>>;

/// Source of per-prefix mappings fetched on demand.
#[async_trait]
pub trait PrefixProvider<V>: Send + Sync {
    /// The mapping for `prefix`, or `None` if the provider has no data for it.
    async fn mapping(&self, prefix: &str) -> BackendResult<Option<Arc<HashMap<String, V>>>>;

    /// Per-prefix counts, if the provider can compute them.
    async fn summarize(&self) -> BackendResult<SummaryCounter> {
        Ok(SummaryCounter::new())
    }
}

/// Where one attribute's data comes from.
pub enum AttributeSource<V> {
    /// Not loaded; every lookup misses.
    Absent,
    /// Fully materialized.
    Eager(PrefixMap<V>),
    /// Fetched per prefix from a provider.
    Lazy(Arc<dyn PrefixProvider<V>>),
}

impl<V> Default for AttributeSource<V> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<V> fmt::Debug for AttributeSource<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Eager(map) => write!(f, "Eager({} prefixes)", map.len()),
            Self::Lazy(_) => write!(f, "Lazy"),
        }
    }
}

impl<V> From<PrefixMap<V>> for AttributeSource<V> {
    fn from(map: PrefixMap<V>) -> Self {
        Self::Eager(map)
    }
}

impl<V> From<Arc<dyn PrefixProvider<V>>> for AttributeSource<V> {
    fn from(provider: Arc<dyn PrefixProvider<V>>) -> Self {
        Self::Lazy(provider)
    }
}

#[derive(Debug)]
struct Attribute<V> {
    source: AttributeSource<V>,
    summary: OnceLock<SummaryCounter>,
}

impl<V: RowValue> Attribute<V> {
    fn new(source: AttributeSource<V>) -> Self {
        Self {
            source,
            summary: OnceLock::new(),
        }
    }

    async fn contains_prefix(&self, prefix: &str) -> BackendResult<bool> {
        match &self.source {
            AttributeSource::Absent => Ok(false),
            AttributeSource::Eager(map) => Ok(map.contains_key(prefix)),
            AttributeSource::Lazy(provider) => Ok(provider.mapping(prefix).await?.is_some()),
        }
    }

    async fn get(&self, prefix: &str, identifier: &str) -> BackendResult<Option<V>> {
        match &self.source {
            AttributeSource::Absent => Ok(None),
            AttributeSource::Eager(map) => {
                Ok(map.get(prefix).and_then(|m| m.get(identifier)).cloned())
            }
            AttributeSource::Lazy(provider) => Ok(provider
                .mapping(prefix)
                .await?
                .and_then(|m| m.get(identifier).cloned())),
        }
    }

    async fn summarize(&self) -> BackendResult<SummaryCounter> {
        match &self.source {
            AttributeSource::Absent => Ok(SummaryCounter::new()),
            AttributeSource::Eager(map) => Ok(self
                .summary
                .get_or_init(|| {
                    map.iter()
                        .map(|(prefix, mapping)| {
                            (prefix.clone(), mapping.values().map(RowValue::weight).sum::<u64>())
                        })
                        .collect()
                })
                .clone()),
            AttributeSource::Lazy(provider) => provider.summarize().await,
        }
    }
}

/// Backend over in-process maps.
#[derive(Debug)]
pub struct MemoryBackend {
    names: Attribute<String>,
    alts: Attribute<String>,
    definitions: Attribute<String>,
    species: Attribute<String>,
    synonyms: Attribute<Vec<String>>,
}

impl MemoryBackend {
    /// Starts building a backend; every attribute defaults to `Absent`.
    #[must_use]
    pub fn builder() -> MemoryBackendBuilder {
        MemoryBackendBuilder::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn has_prefix(&self, prefix: &str) -> BackendResult<bool> {
        self.names.contains_prefix(prefix).await
    }

    async fn get_primary_id(&self, prefix: &str, identifier: &str) -> BackendResult<String> {
        Ok(self
            .alts
            .get(prefix, identifier)
            .await?
            .unwrap_or_else(|| identifier.to_string()))
    }

    async fn get_name(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>> {
        self.names.get(prefix, identifier).await
    }

    async fn get_definition(
        &self,
        prefix: &str,
        identifier: &str,
    ) -> BackendResult<Option<String>> {
        self.definitions.get(prefix, identifier).await
    }

    async fn get_species(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>> {
        self.species.get(prefix, identifier).await
    }

    async fn get_synonyms(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<String>> {
        Ok(self.synonyms.get(prefix, identifier).await?.unwrap_or_default())
    }

    async fn summarize_names(&self) -> BackendResult<SummaryCounter> {
        self.names.summarize().await
    }

    async fn summarize_alts(&self) -> BackendResult<SummaryCounter> {
        self.alts.summarize().await
    }

    async fn summarize_definitions(&self) -> BackendResult<SummaryCounter> {
        self.definitions.summarize().await
    }

    async fn summarize_species(&self) -> BackendResult<SummaryCounter> {
        self.species.summarize().await
    }

    async fn summarize_synonyms(&self) -> BackendResult<SummaryCounter> {
        self.synonyms.summarize().await
    }
}

/// Builder for [`MemoryBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackendBuilder {
    names: AttributeSource<String>,
    alts: AttributeSource<String>,
    definitions: AttributeSource<String>,
    species: AttributeSource<String>,
    synonyms: AttributeSource<Vec<String>>,
}

impl MemoryBackendBuilder {
    /// Canonical names. Their prefixes define which prefixes exist.
    #[must_use]
    pub fn names(mut self, source: impl Into<AttributeSource<String>>) -> Self {
        self.names = source.into();
        self
    }

    /// Alternate identifiers, keyed `prefix -> alt -> primary`.
    #[must_use]
    pub fn alts(mut self, source: impl Into<AttributeSource<String>>) -> Self {
        self.alts = source.into();
        self
    }

    /// Definitions.
    #[must_use]
    pub fn definitions(mut self, source: impl Into<AttributeSource<String>>) -> Self {
        self.definitions = source.into();
        self
    }

    /// Species.
    #[must_use]
    pub fn species(mut self, source: impl Into<AttributeSource<String>>) -> Self {
        self.species = source.into();
        self
    }

    /// Synonyms, in insertion order.
    #[must_use]
    pub fn synonyms(mut self, source: impl Into<AttributeSource<Vec<String>>>) -> Self {
        self.synonyms = source.into();
        self
    }

    /// Eager names from `(prefix, identifier, name)` rows.
    #[must_use]
    pub fn names_from_rows<I, P, K, W>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = (P, K, W)>,
        P: Into<String>,
        K: Into<String>,
        W: Into<String>,
    {
        self.names(loader::prefix_map_from_rows(rows))
    }

    /// Eager alternate identifiers from `(prefix, identifier, alt)` rows.
    #[must_use]
    pub fn alts_from_rows<I, P, K, W>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = (P, K, W)>,
        P: Into<String>,
        K: Into<String>,
        W: Into<String>,
    {
        self.alts(loader::alt_map_from_rows(rows))
    }

    /// Eager definitions from `(prefix, identifier, definition)` rows.
    #[must_use]
    pub fn definitions_from_rows<I, P, K, W>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = (P, K, W)>,
        P: Into<String>,
        K: Into<String>,
        W: Into<String>,
    {
        self.definitions(loader::prefix_map_from_rows(rows))
    }

    /// Eager species from `(prefix, identifier, species)` rows.
    #[must_use]
    pub fn species_from_rows<I, P, K, W>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = (P, K, W)>,
        P: Into<String>,
        K: Into<String>,
        W: Into<String>,
    {
        self.species(loader::prefix_map_from_rows(rows))
    }

    /// Eager synonyms from `(prefix, identifier, synonym)` rows.
    #[must_use]
    pub fn synonyms_from_rows<I, P, K, W>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = (P, K, W)>,
        P: Into<String>,
        K: Into<String>,
        W: Into<String>,
    {
        self.synonyms(loader::synonym_map_from_rows(rows))
    }

    /// Finishes the backend.
    #[must_use]
    pub fn build(self) -> MemoryBackend {
        MemoryBackend {
            names: Attribute::new(self.names),
            alts: Attribute::new(self.alts),
            definitions: Attribute::new(self.definitions),
            species: Attribute::new(self.species),
            synonyms: Attribute::new(self.synonyms),
        }
    }
}
