//! CURIE resolution over any [`Backend`].
//!
//! The algorithm:
//! 1. parse the CURIE; failure yields "could not identify prefix"
//! 2. compute provider URLs
//! 3. bail out with "could not find id->name mapping" if the backend holds
//!    nothing for the prefix
//! 4. look up the name, following at most one alternate-id hop
//! 5. bail out with "could not look up identifier" if there is still no name
//! 6. attach every non-empty optional attribute

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::{Backend, BackendKind};
use crate::curie::CurieNormalizer;
use crate::error::BackendResult;
use crate::model::{LookupResult, PrefixSummary, SummaryCounter};

/// Message for CURIEs the normalizer cannot split.
pub const MSG_UNPARSEABLE: &str = "could not identify prefix";

/// Message for identifiers with no name, even after redirection.
pub const MSG_UNKNOWN_IDENTIFIER: &str = "could not look up identifier";

/// Message for prefixes the backend holds no data for.
#[must_use]
pub fn msg_unknown_prefix(prefix: &str) -> String {
    format!("could not find id->name mapping for {prefix}")
}

/// Options for a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOptions {
    /// Follow an alternate identifier to its primary when the name lookup
    /// misses. Only one hop is taken.
    pub resolve_alternate: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            resolve_alternate: true,
        }
    }
}

impl LookupOptions {
    /// Options that never redirect alternate identifiers.
    #[must_use]
    pub const fn without_alternates() -> Self {
        Self {
            resolve_alternate: false,
        }
    }
}

/// Resolves `curie` against `backend`.
#[instrument(level = "debug", skip(backend, normalizer), fields(backend = %backend.kind()))]
pub async fn lookup<B, N>(
    backend: &B,
    normalizer: &N,
    curie: &str,
    options: LookupOptions,
) -> BackendResult<LookupResult>
where
    B: Backend + ?Sized,
    N: CurieNormalizer + ?Sized,
{
    let Some((prefix, mut identifier)) = normalizer.parse_curie(curie) else {
        debug!("unparseable curie");
        return Ok(LookupResult::failure(curie, MSG_UNPARSEABLE));
    };

    let mut providers = normalizer.get_providers(&prefix, &identifier);
    if !backend.has_prefix(&prefix).await? {
        debug!(%prefix, "prefix not loaded");
        return Ok(LookupResult::failure(curie, msg_unknown_prefix(&prefix))
            .with_reference(prefix, identifier)
            .with_providers(providers));
    }

    let mut name = backend.get_name(&prefix, &identifier).await?;
    if name.is_none() && options.resolve_alternate {
        let primary = backend.get_primary_id(&prefix, &identifier).await?;
        if primary != identifier {
            debug!(%prefix, alt = %identifier, %primary, "redirecting alternate identifier");
            identifier = primary;
            providers = normalizer.get_providers(&prefix, &identifier);
            name = backend.get_name(&prefix, &identifier).await?;
        }
    }

    let Some(name) = name else {
        debug!(%prefix, %identifier, "no name");
        return Ok(LookupResult::failure(curie, MSG_UNKNOWN_IDENTIFIER)
            .with_reference(prefix, identifier)
            .with_providers(providers));
    };

    let mut result = LookupResult::found(curie, prefix.as_str(), identifier.as_str(), name)
        .with_providers(providers);
    result.definition = backend
        .get_definition(&prefix, &identifier)
        .await?
        .filter(|s| !s.is_empty());
    result.species = backend
        .get_species(&prefix, &identifier)
        .await?
        .filter(|s| !s.is_empty());
    result.synonyms = non_empty(backend.get_synonyms(&prefix, &identifier).await?);
    result.xrefs = non_empty(backend.get_xrefs(&prefix, &identifier).await?);
    result.relations = non_empty(backend.get_rels(&prefix, &identifier).await?);
    Ok(result)
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// A backend paired with the normalizer it resolves CURIEs with.
///
/// This is the surface a serving layer holds on to. Cloning is cheap.
#[derive(Clone)]
pub struct Resolver {
    backend: Arc<dyn Backend>,
    normalizer: Arc<dyn CurieNormalizer>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("backend", &self.backend.kind())
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, normalizer: Arc<dyn CurieNormalizer>) -> Self {
        Self { backend, normalizer }
    }

    /// The wrapped backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The wrapped normalizer.
    #[must_use]
    pub fn normalizer(&self) -> &Arc<dyn CurieNormalizer> {
        &self.normalizer
    }

    /// Which strategy the backend uses.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Resolves `curie`, following alternate identifiers.
    pub async fn lookup(&self, curie: &str) -> BackendResult<LookupResult> {
        self.lookup_with(curie, LookupOptions::default()).await
    }

    /// Resolves `curie` with explicit options.
    pub async fn lookup_with(
        &self,
        curie: &str,
        options: LookupOptions,
    ) -> BackendResult<LookupResult> {
        self.backend.lookup(self.normalizer.as_ref(), curie, options).await
    }

    /// Per-prefix counts of every attribute, with registry names.
    pub async fn summarize_all(&self) -> BackendResult<Vec<PrefixSummary>> {
        self.backend.summarize_all(Some(self.normalizer.as_ref())).await
    }

    /// Names per prefix.
    pub async fn summarize_names(&self) -> BackendResult<SummaryCounter> {
        self.backend.summarize_names().await
    }

    /// Warms every counter.
    pub async fn count_all(&self) -> BackendResult<()> {
        self.backend.count_all().await
    }
}
