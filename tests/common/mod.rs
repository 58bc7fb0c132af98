#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use biolookup::{Backend, LookupOptions, Registry, SummaryCounter};
use flate2::write::GzEncoder;
use flate2::Compression;

pub const REFS: &[(&str, &str, &str)] = &[
    ("go", "0000073", "initial mitotic spindle pole body separation"),
    ("go", "0000075", "cell cycle checkpoint"),
    ("go", "0000076", "DNA replication checkpoint"),
    ("hgnc", "10020", "RIPK2"),
    ("hgnc", "10021", "RIPK3"),
    ("hgnc", "10023", "RIT1"),
];

pub const ALTS: &[(&str, &str, &str)] = &[("go", "0000073", "0030475")];

pub const DEF_1: &str = "The release of duplicated mitotic spindle pole bodies (SPBs) that \
    begins with the nucleation of microtubules from each SPB within the \
    nucleus, leading to V-shaped spindle microtubules. Interpolar microtubules \
    that elongate from each pole are interconnected, forming overlapping \
    microtubules. Capturing and antiparallel sliding apart of microtubules \
    promotes the initial separation of the SPB.";

pub const DEF_2: &str = "receptor interacting serine/threonine kinase 2";

pub const DEFS: &[(&str, &str, &str)] = &[
    ("go", "0000073", DEF_1),
    ("go", "0000075", "def_12"),
    ("go", "0000076", "def_13"),
    ("hgnc", "10020", DEF_2),
    ("hgnc", "10021", "def_22"),
];

pub const SPECIES: &[(&str, &str, &str)] = &[
    ("hgnc", "10020", "9606"),
    ("hgnc", "10021", "9606"),
    ("hgnc", "10023", "9606"),
];

pub const SYNONYMS: &[(&str, &str, &str)] = &[("hgnc", "10020", "RIP2"), ("hgnc", "10020", "RICK")];

/// Writes a gzip TSV with a header row.
pub fn write_gz(path: &Path, header: &[&str], rows: &[(&str, &str, &str)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    writeln!(encoder, "{}", header.join("\t")).unwrap();
    for (a, b, c) in rows {
        writeln!(encoder, "{a}\t{b}\t{c}").unwrap();
    }
    encoder.finish().unwrap();
}

/// Writes `<root>/<prefix>/<file_name>` files of `identifier, value` rows.
pub fn write_prefix_dirs(root: &Path, file_name: &str, header: &str, rows: &[(&str, &str, &str)]) {
    let mut prefixes: Vec<&str> = rows.iter().map(|(prefix, _, _)| *prefix).collect();
    prefixes.dedup();
    for prefix in prefixes {
        let path = root.join(prefix).join(file_name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, "identifier\t{header}").unwrap();
        for (_, identifier, value) in rows.iter().filter(|(p, _, _)| *p == prefix) {
            writeln!(encoder, "{identifier}\t{value}").unwrap();
        }
        encoder.finish().unwrap();
    }
}

pub fn counter(pairs: &[(&str, u64)]) -> SummaryCounter {
    pairs.iter().map(|(prefix, count)| (*prefix, *count)).collect()
}

/// The shared scenario every backend holding the fixture must satisfy.
pub async fn check_backend(backend: &dyn Backend, counts: bool) {
    if counts {
        assert_eq!(backend.count_names().await.unwrap(), Some(6));
        assert_eq!(backend.count_definitions().await.unwrap(), Some(5));
        assert_eq!(backend.count_alts().await.unwrap(), Some(1));
        assert_eq!(backend.count_species().await.unwrap(), Some(3), "wrong number of species");

        assert_eq!(backend.summarize_names().await.unwrap(), counter(&[("go", 3), ("hgnc", 3)]));
        assert_eq!(
            backend.summarize_definitions().await.unwrap(),
            counter(&[("go", 3), ("hgnc", 2)])
        );
        assert_eq!(backend.summarize_alts().await.unwrap(), counter(&[("go", 1)]));
        assert_eq!(backend.summarize_species().await.unwrap(), counter(&[("hgnc", 3)]));
    }

    // names
    assert_eq!(
        backend.get_name("go", "0000073").await.unwrap().as_deref(),
        Some("initial mitotic spindle pole body separation")
    );
    assert_eq!(backend.get_name("hgnc", "10023").await.unwrap().as_deref(), Some("RIT1"));

    // definitions
    assert_eq!(backend.get_definition("go", "0000073").await.unwrap().as_deref(), Some(DEF_1));
    assert_eq!(backend.get_definition("hgnc", "1002310101010101").await.unwrap(), None);

    // species
    assert_eq!(backend.get_species("hgnc", "10020").await.unwrap().as_deref(), Some("9606"));
    assert_eq!(backend.get_species("go", "0030475").await.unwrap(), None);

    // alternate identifiers
    assert_eq!(backend.get_primary_id("go", "0030475").await.unwrap(), "0000073");
    assert_eq!(backend.get_primary_id("go", "unknown").await.unwrap(), "unknown");
    assert_eq!(backend.get_primary_id("doid", "14330").await.unwrap(), "14330");
    assert_eq!(backend.get_name("go", "0030475").await.unwrap(), None);
    assert_eq!(backend.get_definition("go", "0030475").await.unwrap(), None);

    let registry = Registry::permissive();

    let result = backend.lookup(&registry, "go:0000073", LookupOptions::default()).await.unwrap();
    assert_go_example(&result, "go:0000073");

    let result = backend.lookup(&registry, "go:0030475", LookupOptions::default()).await.unwrap();
    assert_go_example(&result, "go:0030475");

    let result = backend.lookup(&registry, "hgnc:10020", LookupOptions::default()).await.unwrap();
    assert!(result.success);
    assert_eq!(result.prefix.as_deref(), Some("hgnc"));
    assert_eq!(result.identifier.as_deref(), Some("10020"));
    assert_eq!(result.name.as_deref(), Some("RIPK2"));
    assert_eq!(result.definition.as_deref(), Some(DEF_2));
    assert_eq!(result.species.as_deref(), Some("9606"));
    assert_eq!(result.query, "hgnc:10020");
}

/// The canonical GO entity, reached directly or through its alternate id.
pub fn assert_go_example(result: &biolookup::LookupResult, query: &str) {
    assert!(result.success, "lookup of {query} failed: {:?}", result.message);
    assert_eq!(result.prefix.as_deref(), Some("go"));
    assert_eq!(result.identifier.as_deref(), Some("0000073"));
    assert_eq!(result.name.as_deref(), Some("initial mitotic spindle pole body separation"));
    assert_eq!(result.definition.as_deref(), Some(DEF_1));
    assert_eq!(result.query, query);
    assert_eq!(result.species, None);
}
