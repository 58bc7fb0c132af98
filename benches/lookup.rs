use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use biolookup::{Backend, LookupOptions, MemoryBackend, Registry};

fn make_backend() -> MemoryBackend {
    // 10k names per prefix, every tenth identifier also reachable through an alt.
    let mut names = Vec::new();
    let mut alts = Vec::new();
    for prefix in ["go", "hgnc", "doid"] {
        for i in 0..10_000u32 {
            let identifier = format!("{i:07}");
            if i % 10 == 0 {
                alts.push((prefix, identifier.clone(), format!("alt{i:07}")));
            }
            names.push((prefix, identifier, format!("{prefix} entity {i}")));
        }
    }
    MemoryBackend::builder()
        .names_from_rows(names)
        .alts_from_rows(alts)
        .build()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn bench_lookup(c: &mut Criterion) {
    let backend = make_backend();
    let registry = Registry::permissive();
    let rt = runtime();

    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(1));

    group.bench_function("memory_direct", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            rt.block_on(async {
                for i in 0..iters {
                    let curie = format!("go:{:07}", i % 10_000);
                    let result = backend
                        .lookup(&registry, &curie, LookupOptions::default())
                        .await
                        .unwrap();
                    black_box(result);
                }
            });
            start.elapsed()
        })
    });

    group.bench_function("memory_alternate", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            rt.block_on(async {
                for i in 0..iters {
                    let curie = format!("hgnc:alt{:07}", (i % 1_000) * 10);
                    let result = backend
                        .lookup(&registry, &curie, LookupOptions::default())
                        .await
                        .unwrap();
                    black_box(result);
                }
            });
            start.elapsed()
        })
    });

    group.bench_function("memory_unknown_prefix", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    backend
                        .lookup(&registry, "chebi:15377", LookupOptions::default())
                        .await
                        .unwrap(),
                )
            })
        })
    });

    group.finish();
}

criterion_group!(lookup, bench_lookup);
criterion_main!(lookup);
