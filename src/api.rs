//! Process-wide default resolver.
//!
//! The first call builds a backend and a registry from the environment;
//! every later call reuses them. Settings:
//! - `BIOLOOKUP_BACKEND` selects the backend (default `sql`). The SQL
//!   backend needs `BIOLOOKUP_DATABASE_URL`.
//! - `BIOLOOKUP_REGISTRY` points to a JSON registry. Without it every
//!   prefix is accepted as written, lowercased.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::backend::{open_backend, Backend, Resolver};
use crate::config::BackendConfig;
use crate::curie::Registry;
use crate::error::{BackendError, BackendResult, ConfigError};
use crate::model::LookupResult;

/// Variable holding the SQL connection string.
pub const DATABASE_URL_VAR: &str = "BIOLOOKUP_DATABASE_URL";

/// Variable holding the path of a JSON registry.
pub const REGISTRY_VAR: &str = "BIOLOOKUP_REGISTRY";

static DEFAULT_RESOLVER: OnceCell<Resolver> = OnceCell::const_new();

/// Reads the backend settings, insisting on an explicit database URL when
/// the SQL backend is selected.
pub fn config_from_vars(
    var: impl Fn(&str) -> Option<String>,
) -> Result<BackendConfig, ConfigError> {
    let config = BackendConfig::from_vars(&var)?;
    if matches!(config, BackendConfig::Sql(_)) && var(DATABASE_URL_VAR).is_none() {
        return Err(ConfigError::MissingVar {
            name: DATABASE_URL_VAR.to_string(),
        });
    }
    Ok(config)
}

/// Loads the registry named by `BIOLOOKUP_REGISTRY`, or a permissive one.
pub fn registry_from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Registry, ConfigError> {
    match var(REGISTRY_VAR) {
        Some(path) => Registry::from_path(path),
        None => Ok(Registry::permissive()),
    }
}

/// The shared resolver, built on first use.
pub async fn default_resolver() -> BackendResult<&'static Resolver> {
    DEFAULT_RESOLVER
        .get_or_try_init(|| async {
            let var = |name: &str| std::env::var(name).ok();
            let config = config_from_vars(var)?;
            let registry = registry_from_vars(var)?;
            let backend = open_backend(config).await?;
            info!(backend = %backend.kind(), resources = registry.len(), "default resolver ready");
            Ok::<_, BackendError>(Resolver::new(backend, Arc::new(registry)))
        })
        .await
}

/// The shared backend, built on first use.
pub async fn default_backend() -> BackendResult<Arc<dyn Backend>> {
    Ok(Arc::clone(default_resolver().await?.backend()))
}

/// Resolves `curie` with the shared resolver.
pub async fn lookup(curie: &str) -> BackendResult<LookupResult> {
    default_resolver().await?.lookup(curie).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::curie::CurieNormalizer;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_sql_requires_database_url() {
        let err = config_from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { ref name } if name == DATABASE_URL_VAR));

        let config = config_from_vars(vars(&[(DATABASE_URL_VAR, "sqlite://lookup.db")])).unwrap();
        match config {
            BackendConfig::Sql(sql) => assert_eq!(sql.url, "sqlite://lookup.db"),
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn test_remote_needs_no_database_url() {
        let config = config_from_vars(vars(&[("BIOLOOKUP_BACKEND", "remote")])).unwrap();
        assert!(matches!(config, BackendConfig::Remote(_)));
    }

    #[test]
    fn test_registry_defaults_to_permissive() {
        let registry = registry_from_vars(vars(&[])).unwrap();
        assert!(registry.is_empty());
        assert_eq!(
            registry.parse_curie("DOID:14330"),
            Some(("doid".to_string(), "14330".to_string()))
        );
    }

    #[test]
    fn test_registry_from_missing_file() {
        let err =
            registry_from_vars(vars(&[(REGISTRY_VAR, "/nonexistent/registry.json")])).unwrap_err();
        assert!(matches!(err, ConfigError::Registry { .. }));
    }
}
