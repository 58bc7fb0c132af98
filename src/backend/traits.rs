//! The contract every storage strategy implements.
//!
//! A backend only supplies primitives: prefix existence, alternate-id
//! redirection and per-attribute getters, plus per-prefix summaries. The
//! lookup algorithm is written once in [`resolve`](super::resolve) and
//! reached through [`Backend::lookup`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::resolve::{self, LookupOptions};
use crate::curie::CurieNormalizer;
use crate::error::BackendResult;
use crate::model::{LookupResult, PrefixSummary, Relation, SummaryCounter, Xref};

/// The storage strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In-process maps, eager or lazy.
    Memory,
    /// Precomputed SQL tables.
    Sql,
    /// Another biolookup instance over HTTP.
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sql => write!(f, "sql"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// A resolution backend.
///
/// Implementations must be `Send + Sync`: one instance is shared by every
/// concurrent request for the lifetime of the process.
///
/// Attributes a backend does not store come back empty rather than as an
/// error. The synonym, xref and relation getters and summaries default to
/// that behavior.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> BackendKind;

    /// Returns true iff any record exists for `prefix`.
    async fn has_prefix(&self, prefix: &str) -> BackendResult<bool>;

    /// Maps an alternate identifier to its primary identifier.
    ///
    /// Returns `identifier` unchanged when it is not a known alternate,
    /// including when it is already primary or entirely unknown.
    async fn get_primary_id(&self, prefix: &str, identifier: &str) -> BackendResult<String>;

    /// Canonical name.
    async fn get_name(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>>;

    /// Definition text.
    async fn get_definition(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>>;

    /// Species the entity belongs to.
    async fn get_species(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>>;

    /// Synonyms, in storage order.
    async fn get_synonyms(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<String>> {
        tracing::debug!(backend = %self.kind(), prefix, identifier, "synonyms not supported");
        Ok(Vec::new())
    }

    /// Cross-references.
    async fn get_xrefs(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<Xref>> {
        tracing::debug!(backend = %self.kind(), prefix, identifier, "xrefs not supported");
        Ok(Vec::new())
    }

    /// Relations.
    async fn get_rels(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<Relation>> {
        tracing::debug!(backend = %self.kind(), prefix, identifier, "relations not supported");
        Ok(Vec::new())
    }

    /// Names per prefix.
    async fn summarize_names(&self) -> BackendResult<SummaryCounter>;

    /// Alternate identifiers per prefix.
    async fn summarize_alts(&self) -> BackendResult<SummaryCounter>;

    /// Definitions per prefix.
    async fn summarize_definitions(&self) -> BackendResult<SummaryCounter>;

    /// Species links per prefix.
    async fn summarize_species(&self) -> BackendResult<SummaryCounter>;

    /// Synonyms per prefix.
    async fn summarize_synonyms(&self) -> BackendResult<SummaryCounter> {
        Ok(SummaryCounter::new())
    }

    /// Cross-references per prefix.
    async fn summarize_xrefs(&self) -> BackendResult<SummaryCounter> {
        Ok(SummaryCounter::new())
    }

    /// Relations per prefix.
    async fn summarize_rels(&self) -> BackendResult<SummaryCounter> {
        Ok(SummaryCounter::new())
    }

    /// Number of prefixes with names.
    async fn count_prefixes(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_names().await?.len() as u64))
    }

    /// Total names.
    async fn count_names(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_names().await?.total()))
    }

    /// Total alternate identifiers.
    async fn count_alts(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_alts().await?.total()))
    }

    /// Total definitions.
    async fn count_definitions(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_definitions().await?.total()))
    }

    /// Total species links.
    async fn count_species(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_species().await?.total()))
    }

    /// Total synonyms.
    async fn count_synonyms(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_synonyms().await?.total()))
    }

    /// Total cross-references.
    async fn count_xrefs(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_xrefs().await?.total()))
    }

    /// Total relations.
    async fn count_rels(&self) -> BackendResult<Option<u64>> {
        Ok(Some(self.summarize_rels().await?.total()))
    }

    /// Runs every counter once, filling whatever caches the backend keeps.
    async fn count_all(&self) -> BackendResult<()> {
        self.count_prefixes().await?;
        self.count_definitions().await?;
        self.count_alts().await?;
        self.count_names().await?;
        self.count_species().await?;
        self.count_synonyms().await?;
        self.count_xrefs().await?;
        self.count_rels().await?;
        Ok(())
    }

    /// One row per prefix that has names, with the counts of every attribute.
    async fn summarize_all(
        &self,
        normalizer: Option<&dyn CurieNormalizer>,
    ) -> BackendResult<Vec<PrefixSummary>> {
        let names = self.summarize_names().await?;
        let alts = self.summarize_alts().await?;
        let definitions = self.summarize_definitions().await?;
        let species = self.summarize_species().await?;
        let synonyms = self.summarize_synonyms().await?;
        let xrefs = self.summarize_xrefs().await?;
        let rels = self.summarize_rels().await?;

        Ok(names
            .iter()
            .map(|(prefix, count)| PrefixSummary {
                prefix: prefix.to_string(),
                name: normalizer.and_then(|n| n.get_name(prefix)),
                names: count,
                alts: alts.get(prefix),
                definitions: definitions.get(prefix),
                species: species.get(prefix),
                synonyms: synonyms.get(prefix),
                xrefs: xrefs.get(prefix),
                rels: rels.get(prefix),
            })
            .collect())
    }

    /// Resolves a CURIE into a [`LookupResult`].
    ///
    /// Unparseable CURIEs, unknown prefixes and unknown identifiers come back
    /// as results with `success == false`. Only storage failures are errors.
    async fn lookup(
        &self,
        normalizer: &dyn CurieNormalizer,
        curie: &str,
        options: LookupOptions,
    ) -> BackendResult<LookupResult> {
        resolve::lookup(self, normalizer, curie, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_backend_object_safe(_: &dyn Backend) {}

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Memory.to_string(), "memory");
        assert_eq!(BackendKind::Sql.to_string(), "sql");
        assert_eq!(BackendKind::Remote.to_string(), "remote");
    }
}
