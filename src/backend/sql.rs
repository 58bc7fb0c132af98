//! Backend over precomputed SQL tables.
//!
//! Expects the tables named in [`TableNames`], each with a
//! `{table}_summary(prefix, identifier_count)` companion, and a derived
//! table joining names, definitions and species on `(prefix, identifier)`.
//!
//! Every statement borrows a pooled connection for that one call. Prefix
//! and identifier are always bound; only validated table names are
//! interpolated into SQL text.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::{debug, info};

use crate::backend::{Backend, BackendKind};
use crate::cache::MemoCache;
use crate::config::{SqlConfig, TableNames};
use crate::error::BackendResult;
use crate::model::{Relation, SummaryCounter, Xref};

/// Columns of the derived table served by the single-value getters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Definition,
    Species,
}

impl Column {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Definition => "definition",
            Self::Species => "species",
        }
    }
}

/// Base tables that carry a summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Table {
    Refs,
    Alts,
    Defs,
    Species,
    Synonyms,
    Xrefs,
    Rels,
}

impl Table {
    fn name(self, tables: &TableNames) -> &str {
        match self {
            Self::Refs => &tables.refs,
            Self::Alts => &tables.alts,
            Self::Defs => &tables.defs,
            Self::Species => &tables.species,
            Self::Synonyms => &tables.synonyms,
            Self::Xrefs => &tables.xrefs,
            Self::Rels => &tables.rels,
        }
    }
}

/// What a memoized count measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tally {
    Prefixes,
    Rows(Table),
}

/// Backend over a SQL database of identifier tables.
pub struct SqlBackend {
    pool: AnyPool,
    tables: TableNames,
    prefixes: MemoCache<String, bool>,
    primary_ids: MemoCache<(String, String), String>,
    attributes: MemoCache<(Column, String, String), Option<String>>,
    summaries: MemoCache<Table, SummaryCounter>,
    counts: MemoCache<Tally, Option<u64>>,
}

impl std::fmt::Debug for SqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlBackend")
            .field("tables", &self.tables)
            .field("cached_attributes", &self.attributes.len())
            .finish_non_exhaustive()
    }
}

impl SqlBackend {
    /// Connects a pool to `config.url`.
    ///
    /// The URL scheme picks the driver (`postgres://`, `sqlite://`).
    pub async fn connect(config: SqlConfig) -> BackendResult<Self> {
        let config = config.validate()?;
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "connected sql backend");
        Self::from_pool(pool, config.tables, config.cache_capacity)
    }

    /// Wraps an existing pool.
    pub fn from_pool(
        pool: AnyPool,
        tables: TableNames,
        cache_capacity: usize,
    ) -> BackendResult<Self> {
        let tables = tables.validate()?;
        Ok(Self {
            pool,
            tables,
            prefixes: MemoCache::new(cache_capacity),
            primary_ids: MemoCache::new(cache_capacity),
            attributes: MemoCache::new(cache_capacity),
            summaries: MemoCache::new(cache_capacity),
            counts: MemoCache::new(cache_capacity),
        })
    }

    /// The pool statements run on.
    #[must_use]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Table names in use.
    #[must_use]
    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    async fn attribute(
        &self,
        column: Column,
        prefix: &str,
        identifier: &str,
    ) -> BackendResult<Option<String>> {
        let key = (column, prefix.to_string(), identifier.to_string());
        if let Some(hit) = self.attributes.get(&key) {
            return Ok(hit);
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE prefix = $1 AND identifier = $2",
            column.as_str(),
            self.tables.derived
        );
        let row: Option<(Option<String>,)> = sqlx::query_as(&sql)
            .bind(prefix)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(self.attributes.insert(key, row.and_then(|(value,)| value)))
    }

    async fn summarize(&self, table: Table) -> BackendResult<SummaryCounter> {
        if let Some(hit) = self.summaries.get(&table) {
            return Ok(hit);
        }
        let sql = format!(
            "SELECT prefix, identifier_count FROM {}_summary ORDER BY prefix",
            table.name(&self.tables)
        );
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        let counter = rows
            .into_iter()
            .map(|(prefix, count)| (prefix, u64::try_from(count).unwrap_or(0)))
            .collect();
        Ok(self.summaries.insert(table, counter))
    }

    async fn count(&self, tally: Tally) -> BackendResult<Option<u64>> {
        if let Some(hit) = self.counts.get(&tally) {
            return Ok(hit);
        }
        let sql = match tally {
            Tally::Prefixes => format!(
                "SELECT COUNT(DISTINCT prefix) FROM {}_summary",
                self.tables.refs
            ),
            Tally::Rows(Table::Alts) => format!("SELECT COUNT(*) FROM {}", self.tables.alts),
            Tally::Rows(table) => format!(
                "SELECT CAST(SUM(identifier_count) AS BIGINT) FROM {}_summary",
                table.name(&self.tables)
            ),
        };
        let started = Instant::now();
        let (value,): (Option<i64>,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        let value = value.and_then(|v| u64::try_from(v).ok());
        info!(?tally, count = ?value, elapsed = ?started.elapsed(), "counted");
        Ok(self.counts.insert(tally, value))
    }
}

#[async_trait]
impl Backend for SqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sql
    }

    async fn has_prefix(&self, prefix: &str) -> BackendResult<bool> {
        if let Some(hit) = self.prefixes.get(&prefix.to_string()) {
            return Ok(hit);
        }
        let sql = format!(
            "SELECT prefix FROM {} WHERE prefix = $1 LIMIT 1",
            self.tables.derived
        );
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(prefix)
            .fetch_optional(&self.pool)
            .await?;
        debug!(prefix, found = row.is_some(), "checked prefix");
        Ok(self.prefixes.insert(prefix.to_string(), row.is_some()))
    }

    async fn get_primary_id(&self, prefix: &str, identifier: &str) -> BackendResult<String> {
        let key = (prefix.to_string(), identifier.to_string());
        if let Some(hit) = self.primary_ids.get(&key) {
            return Ok(hit);
        }
        let sql = format!(
            "SELECT identifier FROM {} WHERE prefix = $1 AND alt = $2",
            self.tables.alts
        );
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(prefix)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        let primary = row
            .map(|(primary,)| primary)
            .filter(|primary| !primary.is_empty())
            .unwrap_or_else(|| identifier.to_string());
        Ok(self.primary_ids.insert(key, primary))
    }

    async fn get_name(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>> {
        self.attribute(Column::Name, prefix, identifier).await
    }

    async fn get_definition(
        &self,
        prefix: &str,
        identifier: &str,
    ) -> BackendResult<Option<String>> {
        self.attribute(Column::Definition, prefix, identifier).await
    }

    async fn get_species(&self, prefix: &str, identifier: &str) -> BackendResult<Option<String>> {
        self.attribute(Column::Species, prefix, identifier).await
    }

    async fn get_synonyms(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<String>> {
        let sql = format!(
            "SELECT synonym FROM {} WHERE prefix = $1 AND identifier = $2 ORDER BY synonym",
            self.tables.synonyms
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(prefix)
            .bind(identifier)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(synonym,)| synonym).collect())
    }

    async fn get_xrefs(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<Xref>> {
        let sql = format!(
            "SELECT xref_prefix, xref_identifier, provenance FROM {} \
             WHERE prefix = $1 AND identifier = $2 \
             ORDER BY xref_prefix, xref_identifier",
            self.tables.xrefs
        );
        let rows: Vec<(String, String, String)> = sqlx::query_as(&sql)
            .bind(prefix)
            .bind(identifier)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(xref_prefix, xref_identifier, provenance)| Xref {
                xref_prefix,
                xref_identifier,
                provenance,
            })
            .collect())
    }

    async fn get_rels(&self, prefix: &str, identifier: &str) -> BackendResult<Vec<Relation>> {
        let sql = format!(
            "SELECT relation_prefix, relation_identifier, target_prefix, target_identifier FROM {} \
             WHERE prefix = $1 AND identifier = $2 \
             ORDER BY relation_prefix, relation_identifier, target_prefix, target_identifier",
            self.tables.rels
        );
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(&sql)
            .bind(prefix)
            .bind(identifier)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(relation_prefix, relation_identifier, target_prefix, target_identifier)| {
                Relation {
                    relation_prefix,
                    relation_identifier,
                    target_prefix,
                    target_identifier,
                }
            })
            .collect())
    }

    async fn summarize_names(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Refs).await
    }

    async fn summarize_alts(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Alts).await
    }

    async fn summarize_definitions(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Defs).await
    }

    async fn summarize_species(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Species).await
    }

    async fn summarize_synonyms(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Synonyms).await
    }

    async fn summarize_xrefs(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Xrefs).await
    }

    async fn summarize_rels(&self) -> BackendResult<SummaryCounter> {
        self.summarize(Table::Rels).await
    }

    async fn count_prefixes(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Prefixes).await
    }

    async fn count_names(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Refs)).await
    }

    async fn count_alts(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Alts)).await
    }

    async fn count_definitions(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Defs)).await
    }

    async fn count_species(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Species)).await
    }

    async fn count_synonyms(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Synonyms)).await
    }

    async fn count_xrefs(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Xrefs)).await
    }

    async fn count_rels(&self) -> BackendResult<Option<u64>> {
        self.count(Tally::Rows(Table::Rels)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(Column::Name.as_str(), "name");
        assert_eq!(Column::Definition.as_str(), "definition");
        assert_eq!(Column::Species.as_str(), "species");
    }

    #[test]
    fn test_table_names_follow_config() {
        let tables = TableNames {
            refs: "my_refs".to_string(),
            ..TableNames::default()
        };
        assert_eq!(Table::Refs.name(&tables), "my_refs");
        assert_eq!(Table::Alts.name(&tables), "obo_alt");
        assert_eq!(Table::Rels.name(&tables), "relations");
    }
}
