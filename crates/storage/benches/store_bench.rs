//! Benchmarks for buffered commits.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tabula_core::schema::TableBuilder;
use tabula_core::{DataType, Value};
use tabula_storage::Store;

fn create_store() -> Store {
    let mut store = Store::new();
    let schema = TableBuilder::new("quotes")
        .unwrap()
        .add_column("id", DataType::Integer)
        .unwrap()
        .add_column("price", DataType::Float)
        .unwrap()
        .add_column("sector", DataType::String)
        .unwrap()
        .primary_key("id")
        .unwrap()
        .add_index("price")
        .unwrap()
        .add_index("sector")
        .unwrap()
        .build()
        .unwrap();
    store.create_table(schema).unwrap();
    store
}

fn populate(store: &mut Store, count: usize) {
    let sectors = ["Tech", "Finance", "Health", "Energy", "Consumer"];
    for i in 0..count {
        let row = store
            .table("quotes")
            .unwrap()
            .record(&[
                ("price", Value::Float(100.0 + i as f64 * 0.1)),
                ("sector", sectors[i % sectors.len()].into()),
            ])
            .unwrap();
        store.add("quotes", row).unwrap();
    }
    store.commit().unwrap();
}

/// Benchmark: committing a batch of inserts
fn commit_insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_insert");

    for count in [100usize, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                create_store,
                |mut store| {
                    populate(&mut store, count);
                    black_box(store.len("quotes"))
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark: in-place field writes folded into indexes at commit
fn commit_mutation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_mutation");

    for count in [100usize, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || {
                    let mut store = create_store();
                    populate(&mut store, 10000);
                    store
                },
                |mut store| {
                    let ids: Vec<u64> = store
                        .data("quotes")
                        .unwrap()
                        .row_ids()
                        .take(count)
                        .collect();
                    for id in ids {
                        store.set_field("quotes", id, "sector", "Utilities".into()).unwrap();
                    }
                    black_box(store.commit().unwrap().mutated_count())
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark: deleting by primary key
fn commit_delete_benchmark(c: &mut Criterion) {
    c.bench_function("commit_delete_1000_of_10000", |b| {
        b.iter_batched(
            || {
                let mut store = create_store();
                populate(&mut store, 10000);
                store
            },
            |mut store| {
                for pk in 1..=1000 {
                    store.delete_by_pk("quotes", Value::Integer(pk)).unwrap();
                }
                black_box(store.commit().unwrap().deleted_count())
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    commit_insert_benchmark,
    commit_mutation_benchmark,
    commit_delete_benchmark
);
criterion_main!(benches);
