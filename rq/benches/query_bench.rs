//! Search engine benchmarks
//!
//! The UI contract is ~100ms per query and ~10ms per suggestion pass over
//! a 10,000-record index.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use resq::{Record, SearchEngine, SearchQuery, suggestions};

const TYPES: &[&str] = &[
    "Microsoft.Compute/virtualMachines",
    "Microsoft.Storage/storageAccounts",
    "Microsoft.KeyVault/vaults",
    "Microsoft.Network/virtualNetworks",
    "Microsoft.ContainerService/managedClusters",
];

const LOCATIONS: &[&str] = &["eastus", "westus", "westeurope", "northeurope"];

fn build_engine(count: usize) -> SearchEngine {
    let records = (0..count)
        .map(|i| {
            Record::new(
                format!("/subscriptions/s1/resources/{}", i),
                format!("resource-{:05}", i),
                TYPES[i % TYPES.len()],
                format!("rg-{}", i % 40),
                LOCATIONS[i % LOCATIONS.len()],
            )
            .with_tag("env", if i % 3 == 0 { "prod" } else { "dev" })
        })
        .collect();
    SearchEngine::with_records(records)
}

fn bench_search(c: &mut Criterion) {
    let engine = build_engine(10_000);

    let free_text = SearchQuery::parse("resource-004");
    c.bench_function("search_free_text_10k", |b| {
        b.iter(|| black_box(engine.search(&free_text)))
    });

    let filtered = SearchQuery::parse("type:vm location:eastus tag:env=prod");
    c.bench_function("search_filter_only_10k", |b| {
        b.iter(|| black_box(engine.search(&filtered)))
    });

    let wildcard = SearchQuery::parse("resource-00*");
    c.bench_function("search_wildcard_10k", |b| {
        b.iter(|| black_box(engine.search(&wildcard)))
    });
}

fn bench_suggestions(c: &mut Criterion) {
    let engine = build_engine(10_000);
    c.bench_function("suggestions_10k", |b| {
        b.iter(|| black_box(suggestions(&engine, "resource-0")))
    });
}

criterion_group!(benches, bench_search, bench_suggestions);
criterion_main!(benches);
