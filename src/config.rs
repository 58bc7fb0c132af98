//! Backend configuration.
//!
//! Every settings struct has a `Default`, a `validate()` that rejects values
//! which would only fail later, and a `from_env()` reading `BIOLOOKUP_*`
//! variables. `from_vars` takes the variable source as a closure so the
//! parsing can be exercised without touching the process environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default SQL connection string, a SQLite file in the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://biolookup.db";

/// Default base URL of the public biolookup service.
pub const DEFAULT_REMOTE_URL: &str = "http://biolookup.io";

/// Default endpoint the lookup API is mounted on.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "api/lookup";

/// Names of the tables the SQL backend reads.
///
/// Each base table `t` has a companion `t_summary(prefix, identifier_count)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// References: `(prefix, identifier, name)`.
    pub refs: String,
    /// Alternate identifiers: `(prefix, identifier, alt)`.
    pub alts: String,
    /// Definitions: `(prefix, identifier, definition)`.
    pub defs: String,
    /// Species: `(prefix, identifier, species)`.
    pub species: String,
    /// Join of refs, defs and species on `(prefix, identifier)`.
    pub derived: String,
    /// Synonyms: `(prefix, identifier, synonym)`, many rows per identifier.
    pub synonyms: String,
    /// Cross-references: `(prefix, identifier, xref_prefix, xref_identifier, provenance)`.
    pub xrefs: String,
    /// Relations: `(prefix, identifier, relation_prefix, relation_identifier,
    /// target_prefix, target_identifier)`.
    pub rels: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            refs: "obo_reference".to_string(),
            alts: "obo_alt".to_string(),
            defs: "obo_def".to_string(),
            species: "obo_species".to_string(),
            derived: "entities".to_string(),
            synonyms: "synonyms".to_string(),
            xrefs: "xrefs".to_string(),
            rels: "relations".to_string(),
        }
    }
}

impl TableNames {
    fn all(&self) -> [&str; 8] {
        [
            &self.refs,
            &self.alts,
            &self.defs,
            &self.species,
            &self.derived,
            &self.synonyms,
            &self.xrefs,
            &self.rels,
        ]
    }

    /// Rejects names that are not plain SQL identifiers.
    ///
    /// Table names are interpolated into statement text, so only
    /// `[A-Za-z_][A-Za-z0-9_]*` is accepted.
    pub fn validate(self) -> Result<Self, ConfigError> {
        for name in self.all() {
            if !is_sql_identifier(name) {
                return Err(ConfigError::InvalidTableName {
                    name: name.to_string(),
                });
            }
        }
        Ok(self)
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Settings for the SQL backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlConfig {
    /// Connection string (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Table names.
    pub tables: TableNames,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Entries kept per memoization cache.
    pub cache_capacity: usize,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            tables: TableNames::default(),
            max_connections: 10,
            cache_capacity: 100_000,
        }
    }
}

impl SqlConfig {
    /// Creates a configuration for `url` with default tables and limits.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Replaces the table names.
    #[must_use]
    pub fn with_tables(mut self, tables: TableNames) -> Self {
        self.tables = tables;
        self
    }

    /// Checks the settings and normalizes them.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::invalid("url", &self.url, "must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid("max_connections", "0", "must be at least 1"));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::invalid("cache_capacity", "0", "must be at least 1"));
        }
        let tables = self.tables.validate()?;
        Ok(Self { tables, ..self })
    }

    /// Reads `BIOLOOKUP_DATABASE_URL`, `BIOLOOKUP_MAX_CONNECTIONS`,
    /// `BIOLOOKUP_CACHE_CAPACITY` and `BIOLOOKUP_TABLE_<KIND>`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut tables = TableNames::default();
        for (suffix, slot) in [
            ("REFS", &mut tables.refs),
            ("ALTS", &mut tables.alts),
            ("DEFS", &mut tables.defs),
            ("SPECIES", &mut tables.species),
            ("DERIVED", &mut tables.derived),
            ("SYNONYMS", &mut tables.synonyms),
            ("XREFS", &mut tables.xrefs),
            ("RELS", &mut tables.rels),
        ] {
            if let Some(name) = var(&format!("BIOLOOKUP_TABLE_{suffix}")) {
                *slot = name;
            }
        }

        Self {
            url: var("BIOLOOKUP_DATABASE_URL").unwrap_or(defaults.url),
            tables,
            max_connections: parse_var(
                &var,
                "BIOLOOKUP_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,
            cache_capacity: parse_var(&var, "BIOLOOKUP_CACHE_CAPACITY", defaults.cache_capacity)?,
        }
        .validate()
    }
}

/// Settings for the remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the remote instance.
    pub base_url: String,
    /// Endpoint the lookup API is mounted on.
    pub endpoint: String,
    /// Request timeout. Requests fail instead of waiting longer.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REMOTE_URL.to_string(),
            endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RemoteConfig {
    /// Creates a configuration for `base_url` with the default endpoint.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Trims slashes so that `base_url/endpoint/curie` is well formed.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::invalid("base_url", &self.base_url, "must be an http(s) URL"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "0", "must be positive"));
        }
        Ok(Self {
            base_url,
            endpoint: self.endpoint.trim().trim_matches('/').to_string(),
            timeout: self.timeout,
        })
    }

    /// Reads `BIOLOOKUP_REMOTE_URL`, `BIOLOOKUP_REMOTE_ENDPOINT` and
    /// `BIOLOOKUP_REMOTE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout_secs =
            parse_var(&var, "BIOLOOKUP_REMOTE_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        Self {
            base_url: var("BIOLOOKUP_REMOTE_URL").unwrap_or(defaults.base_url),
            endpoint: var("BIOLOOKUP_REMOTE_ENDPOINT").unwrap_or(defaults.endpoint),
            timeout: Duration::from_secs(timeout_secs),
        }
        .validate()
    }
}

/// Settings for the in-memory backend.
///
/// Either every attribute is served lazily from `lazy_root`, or each
/// attribute with a path is loaded eagerly from a gzip TSV file. Attributes
/// without a path are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    /// `prefix, identifier, name` file.
    pub names: Option<PathBuf>,
    /// `prefix, identifier, alt` file.
    pub alts: Option<PathBuf>,
    /// `prefix, identifier, definition` file.
    pub definitions: Option<PathBuf>,
    /// `prefix, identifier, species` file.
    pub species: Option<PathBuf>,
    /// `prefix, identifier, synonym` file.
    pub synonyms: Option<PathBuf>,
    /// Directory of per-prefix files read on demand.
    pub lazy_root: Option<PathBuf>,
}

impl MemoryConfig {
    /// Checks the settings and normalizes them.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.names.is_none() && self.lazy_root.is_none() {
            return Err(ConfigError::invalid(
                "names",
                "",
                "a names file or a lazy root directory is required",
            ));
        }
        Ok(self)
    }

    /// Reads `BIOLOOKUP_NAMES_PATH`, `BIOLOOKUP_ALTS_PATH`,
    /// `BIOLOOKUP_DEFINITIONS_PATH`, `BIOLOOKUP_SPECIES_PATH`,
    /// `BIOLOOKUP_SYNONYMS_PATH` and `BIOLOOKUP_LAZY_ROOT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = |name: &str| var(name).map(PathBuf::from);
        Self {
            names: path("BIOLOOKUP_NAMES_PATH"),
            alts: path("BIOLOOKUP_ALTS_PATH"),
            definitions: path("BIOLOOKUP_DEFINITIONS_PATH"),
            species: path("BIOLOOKUP_SPECIES_PATH"),
            synonyms: path("BIOLOOKUP_SYNONYMS_PATH"),
            lazy_root: path("BIOLOOKUP_LAZY_ROOT"),
        }
        .validate()
    }
}

/// Which backend to build, with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// In-process maps.
    Memory(MemoryConfig),
    /// Precomputed SQL tables.
    Sql(SqlConfig),
    /// Another biolookup instance over HTTP.
    Remote(RemoteConfig),
}

impl BackendConfig {
    /// Selects the backend with `BIOLOOKUP_BACKEND` (`sql`, `memory` or
    /// `remote`, default `sql`) and reads its settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let kind = var("BIOLOOKUP_BACKEND").unwrap_or_else(|| "sql".to_string());
        match kind.trim().to_ascii_lowercase().as_str() {
            "sql" => Ok(Self::Sql(SqlConfig::from_vars(&var)?)),
            "memory" => Ok(Self::Memory(MemoryConfig::from_vars(&var)?)),
            "remote" => Ok(Self::Remote(RemoteConfig::from_vars(&var)?)),
            _ => Err(ConfigError::invalid(
                "BIOLOOKUP_BACKEND",
                kind,
                "expected one of: sql, memory, remote",
            )),
        }
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, raw.clone(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_table_names_default_valid() {
        let tables = TableNames::default().validate().unwrap();
        assert_eq!(tables.refs, "obo_reference");
        assert_eq!(tables.derived, "entities");
    }

    #[test]
    fn test_table_names_reject_injection() {
        let tables = TableNames {
            refs: "obo_reference; DROP TABLE obo_alt".to_string(),
            ..TableNames::default()
        };
        assert!(matches!(tables.validate(), Err(ConfigError::InvalidTableName { .. })));

        let tables = TableNames {
            alts: "1alts".to_string(),
            ..TableNames::default()
        };
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_sql_config_from_vars() {
        let config = SqlConfig::from_vars(vars(&[
            ("BIOLOOKUP_DATABASE_URL", "postgres://localhost/biolookup"),
            ("BIOLOOKUP_MAX_CONNECTIONS", "4"),
            ("BIOLOOKUP_TABLE_REFS", "refs"),
        ]))
        .unwrap();
        assert_eq!(config.url, "postgres://localhost/biolookup");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.tables.refs, "refs");
        assert_eq!(config.tables.alts, "obo_alt");
        assert_eq!(config.cache_capacity, 100_000);
    }

    #[test]
    fn test_sql_config_rejects_bad_number() {
        let err = SqlConfig::from_vars(vars(&[("BIOLOOKUP_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert!(err.to_string().contains("BIOLOOKUP_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_remote_config_trims_slashes() {
        let config = RemoteConfig {
            base_url: "http://localhost:5000/".to_string(),
            endpoint: "/api/lookup/".to_string(),
            timeout: Duration::from_secs(2),
        }
        .validate()
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.endpoint, "api/lookup");
    }

    #[test]
    fn test_remote_config_defaults() {
        let config = RemoteConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_REMOTE_URL);
        assert_eq!(config.endpoint, DEFAULT_REMOTE_ENDPOINT);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_memory_config_requires_names() {
        assert!(MemoryConfig::default().validate().is_err());
        let config =
            MemoryConfig::from_vars(vars(&[("BIOLOOKUP_LAZY_ROOT", "/data/biolookup")])).unwrap();
        assert_eq!(config.lazy_root, Some(PathBuf::from("/data/biolookup")));
    }

    #[test]
    fn test_backend_config_selection() {
        let config = BackendConfig::from_vars(vars(&[("BIOLOOKUP_BACKEND", "remote")])).unwrap();
        assert!(matches!(config, BackendConfig::Remote(_)));

        let config = BackendConfig::from_vars(vars(&[])).unwrap();
        assert!(matches!(config, BackendConfig::Sql(_)));

        assert!(BackendConfig::from_vars(vars(&[("BIOLOOKUP_BACKEND", "redis")])).is_err());
    }
}
