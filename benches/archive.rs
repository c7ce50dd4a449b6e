#![allow(missing_docs)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use packfold::{Archivable, Archive, PackerRegistry};
use std::collections::HashMap;
use std::hint::black_box;

#[derive(Archivable, Clone, Debug, Default)]
struct BenchTown {
    #[archive]
    name: String,
    #[archive]
    mayor: Option<String>,
    #[archive]
    balance: f64,
    #[archive]
    plots: HashMap<String, i32>,
    #[archive]
    residents: Vec<String>,
}

fn generate_town(plots: usize) -> BenchTown {
    BenchTown {
        name: "Benchmark".into(),
        mayor: Some("alice".into()),
        balance: 1_000.0,
        plots: (0..plots).map(|i| (format!("{i},{i}"), i as i32)).collect(),
        residents: (0..plots / 10).map(|i| format!("resident-{i}")).collect(),
    }
}

fn registry() -> PackerRegistry {
    PackerRegistry::builder()
        .with_primitives()
        .map::<String, i32>()
        .list::<String>()
        .build()
        .expect("registry must build")
}

// --- BENCHMARKS ---

fn init_tracing() {
    // RUST_LOG=packfold=debug shows registry and record events while benchmarking.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn bench_records(c: &mut Criterion) {
    init_tracing();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let archive = Archive::builder(dir.path())
        .registry(registry())
        .build()
        .expect("Failed to open archive");
    let towns = archive.folder("towns").expect("Failed to open folder");

    let mut group = c.benchmark_group("Record");
    for plots in [10usize, 1_000, 10_000] {
        let town = generate_town(plots);
        group.throughput(Throughput::Elements(plots as u64));

        group.bench_function(format!("write/{plots}"), |b| {
            b.iter(|| towns.write("bench", black_box(&town)).expect("write failed"));
        });

        towns.write("bench", &town).expect("write failed");
        group.bench_function(format!("read/{plots}"), |b| {
            b.iter(|| {
                let mut loaded = BenchTown::default();
                towns.read("bench", &mut loaded).expect("read failed");
                black_box(loaded)
            });
        });
    }
    group.finish();
}

fn bench_field_cache(c: &mut Criterion) {
    let archive = Archive::builder(std::env::temp_dir())
        .registry(registry())
        .build()
        .expect("Failed to open archive");
    let cx = archive.context();
    cx.fields_of::<BenchTown>().expect("scan failed");

    c.bench_function("field_cache_hit", |b| {
        b.iter(|| black_box(cx.fields_of::<BenchTown>().expect("lookup failed")));
    });
}

criterion_group!(benches, bench_records, bench_field_cache);
criterion_main!(benches);
