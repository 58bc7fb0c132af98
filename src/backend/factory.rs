//! Builds a backend from a [`BackendConfig`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::backend::loader::{self, TsvDirectoryProvider};
use crate::backend::memory::{AttributeSource, MemoryBackend, PrefixMap, PrefixProvider};
use crate::backend::Backend;
use crate::config::{BackendConfig, MemoryConfig};
use crate::error::{BackendError, BackendResult};

/// Names file under `<lazy_root>/<prefix>/`.
pub const LAZY_NAMES_FILE: &str = "names.tsv.gz";
/// Alternate identifier file, `identifier, alt` rows.
pub const LAZY_ALTS_FILE: &str = "alts.tsv.gz";
/// Definitions file.
pub const LAZY_DEFINITIONS_FILE: &str = "definitions.tsv.gz";
/// Species file.
pub const LAZY_SPECIES_FILE: &str = "species.tsv.gz";
/// Synonyms file, one row per synonym.
pub const LAZY_SYNONYMS_FILE: &str = "synonyms.tsv.gz";

/// Opens the backend `config` describes.
pub async fn open_backend(config: BackendConfig) -> BackendResult<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match config {
        BackendConfig::Memory(config) => Arc::new(open_memory(config).await?),
        #[cfg(feature = "sql")]
        BackendConfig::Sql(config) => {
            Arc::new(crate::backend::sql::SqlBackend::connect(config).await?)
        }
        #[cfg(not(feature = "sql"))]
        BackendConfig::Sql(_) => {
            return Err(BackendError::unsupported(
                crate::backend::BackendKind::Sql,
                "open_backend",
            ))
        }
        #[cfg(feature = "remote")]
        BackendConfig::Remote(config) => {
            Arc::new(crate::backend::remote::RemoteBackend::new(config)?)
        }
        #[cfg(not(feature = "remote"))]
        BackendConfig::Remote(_) => {
            return Err(BackendError::unsupported(
                crate::backend::BackendKind::Remote,
                "open_backend",
            ))
        }
    };
    info!(backend = %backend.kind(), "opened backend");
    Ok(backend)
}

/// Builds a memory backend, lazily over `lazy_root` when set, otherwise by
/// loading every configured file up front.
pub async fn open_memory(config: MemoryConfig) -> BackendResult<MemoryBackend> {
    let config = config.validate()?;
    if let Some(root) = &config.lazy_root {
        info!(root = %root.display(), "serving memory backend lazily");
        return Ok(lazy_memory(root));
    }

    let started = Instant::now();
    let backend = tokio::task::spawn_blocking(move || eager_memory(&config))
        .await
        .map_err(|e| BackendError::io("<memory loader>", std::io::Error::other(e)))??;
    info!(elapsed = ?started.elapsed(), "loaded memory backend");
    Ok(backend)
}

fn lazy_memory(root: &Path) -> MemoryBackend {
    let names: Arc<dyn PrefixProvider<String>> =
        Arc::new(TsvDirectoryProvider::new(root, LAZY_NAMES_FILE));
    let alts: Arc<dyn PrefixProvider<String>> =
        Arc::new(TsvDirectoryProvider::alts(root, LAZY_ALTS_FILE));
    let definitions: Arc<dyn PrefixProvider<String>> =
        Arc::new(TsvDirectoryProvider::new(root, LAZY_DEFINITIONS_FILE));
    let species: Arc<dyn PrefixProvider<String>> =
        Arc::new(TsvDirectoryProvider::new(root, LAZY_SPECIES_FILE));
    let synonyms: Arc<dyn PrefixProvider<Vec<String>>> =
        Arc::new(TsvDirectoryProvider::new(root, LAZY_SYNONYMS_FILE));
    MemoryBackend::builder()
        .names(names)
        .alts(alts)
        .definitions(definitions)
        .species(species)
        .synonyms(synonyms)
        .build()
}

fn eager_memory(config: &MemoryConfig) -> BackendResult<MemoryBackend> {
    fn load<V>(
        path: Option<&PathBuf>,
        read: impl Fn(&Path) -> BackendResult<PrefixMap<V>>,
    ) -> BackendResult<AttributeSource<V>> {
        match path {
            Some(path) => Ok(AttributeSource::Eager(read(path)?)),
            None => Ok(AttributeSource::Absent),
        }
    }

    Ok(MemoryBackend::builder()
        .names(load(config.names.as_ref(), |p| loader::load_prefix_map(p))?)
        .alts(load(config.alts.as_ref(), |p| loader::load_alt_map(p))?)
        .definitions(load(config.definitions.as_ref(), |p| loader::load_prefix_map(p))?)
        .species(load(config.species.as_ref(), |p| loader::load_prefix_map(p))?)
        .synonyms(load(config.synonyms.as_ref(), |p| loader::load_synonym_map(p))?)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_requires_names_or_root() {
        let err = open_memory(MemoryConfig::default()).await.unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_names_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig {
            names: Some(dir.path().join("missing.tsv.gz")),
            ..MemoryConfig::default()
        };
        let err = open_memory(config).await.unwrap_err();
        assert!(matches!(err, BackendError::Io { .. }));
    }

    #[tokio::test]
    async fn test_lazy_root_without_files_has_no_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig {
            lazy_root: Some(dir.path().to_path_buf()),
            ..MemoryConfig::default()
        };
        let backend = open_backend(BackendConfig::Memory(config)).await.unwrap();
        assert!(!backend.has_prefix("go").await.unwrap());
        assert_eq!(backend.get_primary_id("go", "0000073").await.unwrap(), "0000073");
    }
}
