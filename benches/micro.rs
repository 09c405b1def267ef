//! Micro-benchmark queries under criterion

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use lakebench::bench::{register_tpcds_views, VIEW_QUERIES};
use lakebench::table::{generate_rows, synthetic_schema};
use lakebench::{ComputeSession, SqlEngine, TableIdent, TpcdsGenerator, WarehouseCatalog};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn create_session(rt: &tokio::runtime::Runtime, sf: f64) -> (TempDir, ComputeSession) {
    let dir = tempfile::tempdir().unwrap();
    let tpcds_dir = dir.path().join("tpcds");
    TpcdsGenerator::new(sf).generate_to_parquet(&tpcds_dir).unwrap();

    let session = ComputeSession::new();
    rt.block_on(register_tpcds_views(&session, &tpcds_dir)).unwrap();
    (dir, session)
}

fn benchmark_queries(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (_dir, session) = create_session(&rt, 0.5);

    let mut group = c.benchmark_group("micro");
    group.sample_size(10);

    for query in VIEW_QUERIES {
        group.bench_with_input(BenchmarkId::new("query", query.name), &query.sql, |b, sql| {
            b.to_async(&rt).iter(|| async {
                let batches = session.preview(sql, 6).await.unwrap();
                black_box(batches.len())
            });
        });
    }

    group.finish();
}

fn benchmark_table_write(c: &mut Criterion) {
    let rows = generate_rows(100_000, 8192, &mut StdRng::seed_from_u64(42)).unwrap();

    c.bench_function("table_create_100k", |b| {
        b.iter_batched(
            || tempfile::tempdir().unwrap(),
            |dir| {
                let catalog = WarehouseCatalog::new(dir.path());
                let ident: TableIdent = "demo.foo.bar".parse().unwrap();
                let table = catalog
                    .create_table(&ident, synthetic_schema(), &rows)
                    .unwrap();
                black_box(table.record_count())
            },
            BatchSize::PerIteration,
        );
    });
}

criterion_group!(benches, benchmark_queries, benchmark_table_write);
criterion_main!(benches);
