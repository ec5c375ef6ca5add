//! Benchmarks for tabula-index using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tabula_core::{CompareOp, DataType, Row, Value};
use tabula_core::schema::TableBuilder;
use tabula_index::{BTreeIndex, HashIndex, Index, IndexManager, KeyRange, RangeIndex};

fn btree_range_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_range");

    let mut tree = BTreeIndex::new();
    for i in 0..100_000i64 {
        tree.add(i, i as u64);
    }

    for range_size in [100, 1000, 10000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(range_size),
            range_size,
            |b, &range_size| {
                let range = KeyRange::bound(1000i64, 1000 + range_size as i64, false, false);
                b.iter(|| black_box(tree.get_range(&range)));
            },
        );
    }

    group.finish();
}

fn hash_churn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_churn");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut index = HashIndex::new();
                for i in 0..size {
                    index.add(i % 16, i as u64);
                }
                for i in (0..size).step_by(2) {
                    index.remove(&(i % 16), i as u64);
                }
                black_box(index)
            });
        });
    }

    group.finish();
}

fn manager_lookup_benchmark(c: &mut Criterion) {
    let table = TableBuilder::new("items")
        .and_then(|b| b.add_column("id", DataType::Integer))
        .and_then(|b| b.add_column("score", DataType::Integer))
        .and_then(|b| b.primary_key("id"))
        .and_then(|b| b.add_index("score"))
        .and_then(|b| b.build())
        .unwrap();

    let mut manager = IndexManager::new();
    manager.register_table(&table);
    for i in 0..10_000i64 {
        let row = Row::new(vec![Value::Integer(i), Value::Integer(i % 100)]);
        manager.on_insert("items", &row);
    }

    c.bench_function("manager_eq_lookup", |b| {
        b.iter(|| black_box(manager.query("items", "score", CompareOp::Eq, &[42.into()])))
    });
    c.bench_function("manager_between_lookup", |b| {
        b.iter(|| {
            black_box(manager.query(
                "items",
                "id",
                CompareOp::Between,
                &[100.into(), 600.into()],
            ))
        })
    });
}

criterion_group!(
    benches,
    btree_range_benchmark,
    hash_churn_benchmark,
    manager_lookup_benchmark
);
criterion_main!(benches);
