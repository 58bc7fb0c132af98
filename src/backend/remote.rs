//! Backend that forwards whole lookups to another biolookup instance.
//!
//! Only [`Backend::lookup`] is served: `GET {base_url}/{endpoint}/{curie}`
//! answered with a JSON [`LookupResult`]. The primitives have no remote
//! counterpart and fail with [`BackendError::Unsupported`]. One request per
//! lookup, no retries.

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::backend::resolve::LookupOptions;
use crate::backend::{Backend, BackendKind};
use crate::config::RemoteConfig;
use crate::curie::CurieNormalizer;
use crate::error::{BackendError, BackendResult};
use crate::model::{LookupResult, Relation, SummaryCounter, Xref};

/// Backend proxying lookups over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteBackend {
    /// Builds an HTTP client with the configured timeout.
    pub fn new(config: RemoteConfig) -> BackendResult<Self> {
        let config = config.validate()?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Full lookup URL for `curie`.
    #[must_use]
    pub fn url_for(&self, curie: &str) -> String {
        if self.config.endpoint.is_empty() {
            format!("{}/{curie}", self.config.base_url)
        } else {
            format!("{}/{}/{curie}", self.config.base_url, self.config.endpoint)
        }
    }

    fn unsupported<T>(operation: &'static str) -> BackendResult<T> {
        Err(BackendError::unsupported(BackendKind::Remote, operation))
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn has_prefix(&self, _prefix: &str) -> BackendResult<bool> {
        Self::unsupported("has_prefix")
    }

    async fn get_primary_id(&self, _prefix: &str, _identifier: &str) -> BackendResult<String> {
        Self::unsupported("get_primary_id")
    }

    async fn get_name(&self, _prefix: &str, _identifier: &str) -> BackendResult<Option<String>> {
        Self::unsupported("get_name")
    }

    async fn get_definition(
        &self,
        _prefix: &str,
        _identifier: &str,
    ) -> BackendResult<Option<String>> {
        Self::unsupported("get_definition")
    }

    async fn get_species(&self, _prefix: &str, _identifier: &str) -> BackendResult<Option<String>> {
        Self::unsupported("get_species")
    }

    async fn get_synonyms(&self, _prefix: &str, _identifier: &str) -> BackendResult<Vec<String>> {
        Self::unsupported("get_synonyms")
    }

    async fn get_xrefs(&self, _prefix: &str, _identifier: &str) -> BackendResult<Vec<Xref>> {
        Self::unsupported("get_xrefs")
    }

    async fn get_rels(&self, _prefix: &str, _identifier: &str) -> BackendResult<Vec<Relation>> {
        Self::unsupported("get_rels")
    }

    async fn summarize_names(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_names")
    }

    async fn summarize_alts(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_alts")
    }

    async fn summarize_definitions(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_definitions")
    }

    async fn summarize_species(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_species")
    }

    async fn summarize_synonyms(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_synonyms")
    }

    async fn summarize_xrefs(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_xrefs")
    }

    async fn summarize_rels(&self) -> BackendResult<SummaryCounter> {
        Self::unsupported("summarize_rels")
    }

    #[instrument(
        level = "debug",
        skip(self, _normalizer, _options),
        fields(base_url = %self.config.base_url)
    )]
    async fn lookup(
        &self,
        _normalizer: &dyn CurieNormalizer,
        curie: &str,
        _options: LookupOptions,
    ) -> BackendResult<LookupResult> {
        let url = self.url_for(curie);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "remote lookup failed");
            return Err(BackendError::RemoteStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json::<LookupResult>().await?)
    }
}
