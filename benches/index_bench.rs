//! Insert/delete cost of the tree index across key representations, under
//! sequential and column-major (shuffled) insertion orders. Mirrors the
//! comparison the engine cares about: indirect reference keys against
//! value-inlined keys of one and two columns.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use larch::catalog::{Column, DataType, Schema, SchemaRef};
use larch::config::ArenaConfig;
use larch::index::{IndexScheme, KeyRepresentation, TableIndex};
use larch::storage::{RowRef, Tuple};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const PLACES: u32 = 14;

fn bigint_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Column::new("a", DataType::Int64, false),
        Column::new("b", DataType::Int64, false),
        Column::new("c", DataType::Int64, false),
    ]))
}

fn build_rows(schema: &SchemaRef, count: usize) -> Vec<RowRef> {
    let mut rng = StdRng::seed_from_u64(12345);
    (0..count)
        .map(|_| {
            RowRef::new(Tuple::new(
                schema.clone(),
                vec![
                    12345i64.into(),
                    45688i64.into(),
                    rng.random_range(0..i64::MAX).into(),
                ],
            ))
        })
        .collect()
}

fn new_index(schema: &SchemaRef, representation: KeyRepresentation) -> TableIndex {
    let columns = match representation {
        KeyRepresentation::Inline { width: 2 } => vec![0, 1],
        _ => vec![0],
    };
    TableIndex::try_new_with_config(
        IndexScheme {
            name: "idx_bench".to_string(),
            table_schema: schema.clone(),
            column_indices: columns,
            unique: false,
            representation,
        },
        ArenaConfig {
            initial_capacity: 1 << PLACES,
        },
    )
    .unwrap()
}

fn representations() -> Vec<(&'static str, KeyRepresentation)> {
    vec![
        ("reference", KeyRepresentation::Reference),
        ("inline1", KeyRepresentation::Inline { width: 1 }),
        ("inline2", KeyRepresentation::Inline { width: 2 }),
    ]
}

/// Column-major position of `i` in a square matrix of `1 << places` cells.
fn transposed(i: usize, places: u32) -> usize {
    let half = 1usize << (places / 2);
    ((i % half) << (places / 2)) + (i / half)
}

fn bench_insert(c: &mut Criterion) {
    let schema = bigint_schema();
    let count = 1usize << PLACES;
    let rows = build_rows(&schema, count);

    let mut group = c.benchmark_group("insert_sequential");
    group.throughput(Throughput::Elements(count as u64));
    group.sample_size(10);
    for (name, representation) in representations() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || new_index(&schema, representation),
                |mut index| {
                    for row in rows.iter() {
                        index.add_entry(row);
                    }
                    index
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();

    let mut group = c.benchmark_group("insert_transposed");
    group.throughput(Throughput::Elements(count as u64));
    group.sample_size(10);
    for (name, representation) in representations() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || new_index(&schema, representation),
                |mut index| {
                    for i in 0..count {
                        index.add_entry(&rows[transposed(i, PLACES)]);
                    }
                    index
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let schema = bigint_schema();
    let count = 1usize << PLACES;
    let rows = build_rows(&schema, count);
    // a handful of widely spaced victims out of a full index
    let victims = 8usize;
    let gap = count / victims;

    let mut group = c.benchmark_group("delete_sparse");
    group.throughput(Throughput::Elements(victims as u64));
    group.sample_size(10);
    for (name, representation) in representations() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let mut index = new_index(&schema, representation);
                    for row in rows.iter() {
                        index.add_entry(row);
                    }
                    index
                },
                |mut index| {
                    for i in 0..victims {
                        index.delete_entry(&rows[gap * i]);
                    }
                    index
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_delete);
criterion_main!(benches);
