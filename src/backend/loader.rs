//! Bulk data loading for the in-memory backend.
//!
//! Bootstrap files are gzip-compressed, tab-separated, with one header row:
//!
//! ```text
//! prefix<TAB>identifier<TAB>name
//! go<TAB>0000073<TAB>initial mitotic spindle pole body separation
//! ```
//!
//! Rows are grouped into `prefix -> identifier -> value`. For single-valued
//! attributes a later row for the same `(prefix, identifier)` replaces an
//! earlier one; synonyms accumulate. Alternate-id files list
//! `prefix, identifier, alt` and are grouped by `alt`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use tracing::{debug, info};

use crate::backend::memory::{PrefixMap, PrefixProvider};
use crate::cache::MemoCache;
use crate::error::{BackendError, BackendResult};
use crate::model::SummaryCounter;

/// A value type that rows can be folded into.
pub trait RowValue: Clone + Send + Sync + 'static {
    /// Folds one row's value into the per-prefix mapping.
    fn absorb(mapping: &mut HashMap<String, Self>, identifier: String, value: String);

    /// How many records this value counts as in summaries.
    fn weight(&self) -> u64;
}

impl RowValue for String {
    fn absorb(mapping: &mut HashMap<String, Self>, identifier: String, value: String) {
        mapping.insert(identifier, value);
    }

    fn weight(&self) -> u64 {
        1
    }
}

impl RowValue for Vec<String> {
    fn absorb(mapping: &mut HashMap<String, Self>, identifier: String, value: String) {
        mapping.entry(identifier).or_default().push(value);
    }

    fn weight(&self) -> u64 {
        self.len() as u64
    }
}

/// Which of the two trailing columns is the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `identifier, value`
    Forward,
    /// `identifier, alt`, keyed by `alt`
    Reversed,
}

impl Layout {
    fn order(self, identifier: String, value: String) -> (String, String) {
        match self {
            Self::Forward => (identifier, value),
            Self::Reversed => (value, identifier),
        }
    }
}

/// Calls `f` with the fields of every data row of a gzip TSV file.
fn for_each_row(
    path: &Path,
    columns: usize,
    mut f: impl FnMut(Vec<String>),
) -> BackendResult<usize> {
    let file = File::open(path).map_err(|e| BackendError::io(path, e))?;
    let reader = BufReader::new(MultiGzDecoder::new(file));

    let mut rows = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| BackendError::io(path, e))?;
        // header
        if index == 0 {
            continue;
        }
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split('\t').map(str::to_string).collect();
        if fields.len() != columns {
            return Err(BackendError::MalformedData {
                path: path.display().to_string(),
                line: index + 1,
                reason: format!("expected {columns} columns, found {}", fields.len()),
            });
        }
        f(fields);
        rows += 1;
    }
    Ok(rows)
}

fn load_grouped<V: RowValue>(path: &Path, layout: Layout) -> BackendResult<PrefixMap<V>> {
    let start = Instant::now();
    let mut lookup: PrefixMap<V> = HashMap::new();
    let rows = for_each_row(path, 3, |fields| {
        let mut fields = fields.into_iter();
        let (Some(prefix), Some(identifier), Some(value)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return;
        };
        let (key, value) = layout.order(identifier, value);
        V::absorb(lookup.entry(prefix).or_default(), key, value);
    })?;
    info!(
        path = %path.display(),
        rows,
        prefixes = lookup.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded mappings"
    );
    Ok(lookup)
}

fn group_rows<V, I, P, K, W>(rows: I, layout: Layout) -> PrefixMap<V>
where
    V: RowValue,
    I: IntoIterator<Item = (P, K, W)>,
    P: Into<String>,
    K: Into<String>,
    W: Into<String>,
{
    let mut lookup: PrefixMap<V> = HashMap::new();
    for (prefix, identifier, value) in rows {
        let (key, value) = layout.order(identifier.into(), value.into());
        V::absorb(lookup.entry(prefix.into()).or_default(), key, value);
    }
    lookup
}

/// Loads a `prefix, identifier, value` file.
pub fn load_prefix_map(path: impl AsRef<Path>) -> BackendResult<PrefixMap<String>> {
    load_grouped(path.as_ref(), Layout::Forward)
}

/// Loads a `prefix, identifier, alt` file as `prefix -> alt -> identifier`.
pub fn load_alt_map(path: impl AsRef<Path>) -> BackendResult<PrefixMap<String>> {
    load_grouped(path.as_ref(), Layout::Reversed)
}

/// Loads a `prefix, identifier, synonym` file, keeping every synonym.
pub fn load_synonym_map(path: impl AsRef<Path>) -> BackendResult<PrefixMap<Vec<String>>> {
    load_grouped(path.as_ref(), Layout::Forward)
}

/// Groups in-memory `(prefix, identifier, value)` rows.
pub fn prefix_map_from_rows<I, P, K, W>(rows: I) -> PrefixMap<String>
where
    I: IntoIterator<Item = (P, K, W)>,
    P: Into<String>,
    K: Into<String>,
    W: Into<String>,
{
    group_rows(rows, Layout::Forward)
}

/// Groups in-memory `(prefix, identifier, alt)` rows by alt.
pub fn alt_map_from_rows<I, P, K, W>(rows: I) -> PrefixMap<String>
where
    I: IntoIterator<Item = (P, K, W)>,
    P: Into<String>,
    K: Into<String>,
    W: Into<String>,
{
    group_rows(rows, Layout::Reversed)
}

/// Groups in-memory `(prefix, identifier, synonym)` rows.
pub fn synonym_map_from_rows<I, P, K, W>(rows: I) -> PrefixMap<Vec<String>>
where
    I: IntoIterator<Item = (P, K, W)>,
    P: Into<String>,
    K: Into<String>,
    W: Into<String>,
{
    group_rows(rows, Layout::Forward)
}

/// Lazy per-prefix provider over a directory tree.
///
/// Reads `<root>/<prefix>/<file_name>`, a gzip TSV of `identifier, value`
/// with a header row, the first time a prefix is asked for, then keeps it.
/// A missing file means the prefix is unknown; at most
/// [`MISSING_PREFIX_CAPACITY`] such misses are remembered. Summaries only
/// cover prefixes loaded so far.
#[derive(Debug)]
pub struct TsvDirectoryProvider<V> {
    root: PathBuf,
    file_name: String,
    layout: Layout,
    loaded: RwLock<HashMap<String, Arc<HashMap<String, V>>>>,
    missing: MemoCache<String, ()>,
}

/// Number of unknown prefixes a [`TsvDirectoryProvider`] remembers.
pub const MISSING_PREFIX_CAPACITY: usize = 4_096;

impl<V: RowValue> TsvDirectoryProvider<V> {
    /// Provider reading `<root>/<prefix>/<file_name>`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
            layout: Layout::Forward,
            loaded: RwLock::new(HashMap::new()),
            missing: MemoCache::new(MISSING_PREFIX_CAPACITY),
        }
    }

    /// Provider for `identifier, alt` files, keyed by alt.
    #[must_use]
    pub fn alts(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            layout: Layout::Reversed,
            ..Self::new(root, file_name)
        }
    }

    fn path_for(&self, prefix: &str) -> Option<PathBuf> {
        // prefixes name a directory; refuse anything that could escape root
        if prefix.is_empty() || prefix.chars().any(|c| matches!(c, '/' | '\\' | '.')) {
            return None;
        }
        Some(self.root.join(prefix).join(&self.file_name))
    }

    fn cached(&self, prefix: &str) -> Option<Arc<HashMap<String, V>>> {
        self.loaded
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(prefix)
            .cloned()
    }

    fn read_prefix(path: &Path, layout: Layout) -> BackendResult<Option<HashMap<String, V>>> {
        if !path.is_file() {
            return Ok(None);
        }
        let mut mapping = HashMap::new();
        for_each_row(path, 2, |fields| {
            let mut fields = fields.into_iter();
            let (Some(identifier), Some(value)) = (fields.next(), fields.next()) else {
                return;
            };
            let (key, value) = layout.order(identifier, value);
            V::absorb(&mut mapping, key, value);
        })?;
        Ok(Some(mapping))
    }
}

#[async_trait]
impl<V: RowValue> PrefixProvider<V> for TsvDirectoryProvider<V> {
    async fn mapping(&self, prefix: &str) -> BackendResult<Option<Arc<HashMap<String, V>>>> {
        if let Some(hit) = self.cached(prefix) {
            return Ok(Some(hit));
        }
        let key = prefix.to_string();
        if self.missing.get(&key).is_some() {
            return Ok(None);
        }
        let Some(path) = self.path_for(prefix) else {
            return Ok(None);
        };

        debug!(path = %path.display(), "reading prefix file");
        let layout = self.layout;
        let read_path = path.clone();
        let mapping = tokio::task::spawn_blocking(move || Self::read_prefix(&read_path, layout))
            .await
            .map_err(|e| BackendError::io(&path, std::io::Error::other(e)))??;
        let Some(mapping) = mapping else {
            self.missing.insert(key, ());
            return Ok(None);
        };

        let mut loaded = self
            .loaded
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(Some(Arc::clone(loaded.entry(key).or_insert_with(|| Arc::new(mapping)))))
    }

    async fn summarize(&self) -> BackendResult<SummaryCounter> {
        let loaded = self
            .loaded
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(loaded
            .iter()
            .map(|(prefix, mapping)| {
                (prefix.clone(), mapping.values().map(RowValue::weight).sum::<u64>())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    use super::*;

    fn write_gz(path: &Path, lines: &[&str]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        for line in lines {
            writeln!(encoder, "{line}").unwrap();
        }
        encoder.finish().unwrap();
    }

    #[test]
    fn test_load_prefix_map_last_write_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.tsv.gz");
        write_gz(
            &path,
            &[
                "prefix\tidentifier\tname",
                "go\t0000073\tfirst",
                "hgnc\t10020\tRIPK2",
                "go\t0000073\tinitial mitotic spindle pole body separation",
            ],
        );

        let lookup = load_prefix_map(&path).unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(
            lookup["go"]["0000073"],
            "initial mitotic spindle pole body separation"
        );
        assert_eq!(lookup["hgnc"]["10020"], "RIPK2");
    }

    #[test]
    fn test_load_alt_map_keys_by_alt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alts.tsv.gz");
        write_gz(&path, &["prefix\tidentifier\talt", "go\t0000073\t0030475"]);

        let lookup = load_alt_map(&path).unwrap();
        assert_eq!(lookup["go"]["0030475"], "0000073");
        assert!(!lookup["go"].contains_key("0000073"));
    }

    #[test]
    fn test_load_synonym_map_accumulates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("synonyms.tsv.gz");
        write_gz(
            &path,
            &[
                "prefix\tidentifier\tsynonym",
                "hgnc\t10020\tRICK",
                "hgnc\t10020\tRIP2",
            ],
        );

        let lookup = load_synonym_map(&path).unwrap();
        assert_eq!(lookup["hgnc"]["10020"], vec!["RICK".to_string(), "RIP2".to_string()]);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tsv.gz");
        write_gz(&path, &["prefix\tidentifier\tname", "go\t0000073\tok", "go\t0000075"]);

        let err = load_prefix_map(&path).unwrap_err();
        match err {
            BackendError::MalformedData { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_prefix_map(dir.path().join("absent.tsv.gz")).unwrap_err();
        assert!(matches!(err, BackendError::Io { .. }));
    }

    #[test]
    fn test_rows_grouping() {
        let names = prefix_map_from_rows(vec![
            ("go", "0000073", "a"),
            ("go", "0000073", "b"),
            ("hgnc", "10020", "RIPK2"),
        ]);
        assert_eq!(names["go"]["0000073"], "b");
        assert_eq!(names["go"].len(), 1);

        let alts = alt_map_from_rows([("go", "0000073", "0030475")]);
        assert_eq!(alts["go"]["0030475"], "0000073");

        let synonyms =
            synonym_map_from_rows([("hgnc", "10020", "RICK"), ("hgnc", "10020", "RIP2")]);
        assert_eq!(synonyms["hgnc"]["10020"].len(), 2);
    }

    #[tokio::test]
    async fn test_directory_provider_loads_on_demand() {
        let dir = tempdir().unwrap();
        write_gz(
            &dir.path().join("go").join("names.tsv.gz"),
            &["identifier\tname", "0000073\tinitial mitotic spindle pole body separation"],
        );

        let provider: TsvDirectoryProvider<String> =
            TsvDirectoryProvider::new(dir.path(), "names.tsv.gz");
        assert!(provider.summarize().await.unwrap().is_empty());

        let go = provider.mapping("go").await.unwrap().unwrap();
        assert_eq!(go["0000073"], "initial mitotic spindle pole body separation");
        assert!(provider.mapping("hgnc").await.unwrap().is_none());
        assert!(provider.mapping("../etc").await.unwrap().is_none());

        let summary = provider.summarize().await.unwrap();
        assert_eq!(summary.get("go"), 1);
        assert_eq!(summary.len(), 1);
    }

    #[tokio::test]
    async fn test_directory_provider_alts() {
        let dir = tempdir().unwrap();
        write_gz(
            &dir.path().join("go").join("alts.tsv.gz"),
            &["identifier\talt", "0000073\t0030475"],
        );

        let provider: TsvDirectoryProvider<String> =
            TsvDirectoryProvider::alts(dir.path(), "alts.tsv.gz");
        let go = provider.mapping("go").await.unwrap().unwrap();
        assert_eq!(go["0030475"], "0000073");
    }

    #[tokio::test]
    async fn test_directory_provider_bounds_unknown_prefixes() {
        let dir = tempdir().unwrap();
        let provider: TsvDirectoryProvider<String> =
            TsvDirectoryProvider::new(dir.path(), "names.tsv.gz");

        for i in 0..MISSING_PREFIX_CAPACITY + 1_000 {
            assert!(provider.mapping(&format!("junk{i}")).await.unwrap().is_none());
        }
        assert_eq!(provider.missing.len(), MISSING_PREFIX_CAPACITY);
        assert!(provider.loaded.read().unwrap().is_empty());

        // a remembered miss still answers without a file
        let last = format!("junk{}", MISSING_PREFIX_CAPACITY + 999);
        assert!(provider.mapping(&last).await.unwrap().is_none());
        assert!(provider.summarize().await.unwrap().is_empty());
    }
}
