//! Performance benchmarks for the FastSchema validation engine
//!
//! Measures single-value validation on the reference engine and through the
//! dispatcher, and batch throughput of the sequential and parallel runners.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fastschema_core::config::DispatcherConfig;
use fastschema_service::dispatch::HybridDispatcher;
use fastschema_service::prelude::*;
use serde_json::{Value, json};

/// Flat object schema
fn create_simple_schema() -> Schema {
    object([
        ("name", string().min_length(1).build()),
        ("age", integer().nonnegative().optional()),
        ("email", string().email().optional()),
    ])
    .build()
}

/// Nested schema with unions, arrays and formats
fn create_complex_schema() -> Schema {
    let address = object([
        ("street", string().build()),
        ("city", string().build()),
        ("zip", string().length(5).build()),
    ])
    .build();
    let contact = discriminated_union(
        "kind",
        [
            object([("kind", literal("email")), ("value", string().email().build())]).build(),
            object([("kind", literal("phone")), ("value", string().min_length(7).build())]).build(),
        ],
    )
    .unwrap();

    object([
        ("id", string().uuid().build()),
        ("created_at", string().format("date-time").unwrap().build()),
        ("name", string().trim().min_length(2).build()),
        ("address", address),
        ("contacts", array(contact).max_items(10).build()),
        ("tags", array(string().build()).unique().build()),
        ("status", enumeration(["active", "suspended"])),
    ])
    .strict()
    .build()
}

fn generate_test_data(count: usize, complex: bool) -> Vec<Value> {
    (0..count)
        .map(|i| {
            if complex {
                json!({
                    "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                    "created_at": "2024-01-01T00:00:00Z",
                    "name": format!("  Person {i} "),
                    "address": {"street": "1 Main St", "city": "Springfield", "zip": "12345"},
                    "contacts": [
                        {"kind": "email", "value": format!("person{i}@example.com")},
                        {"kind": "phone", "value": "+1-555-1234"}
                    ],
                    "tags": ["a", "b", "c"],
                    "status": if i % 10 == 0 { "unknown" } else { "active" }
                })
            } else {
                json!({
                    "name": format!("Person {i}"),
                    "age": 20 + (i % 60),
                    "email": format!("person{i}@example.com")
                })
            }
        })
        .collect()
}

/// Benchmark single validation performance
fn bench_single_validation(c: &mut Criterion) {
    let simple_schema = create_simple_schema();
    let complex_schema = create_complex_schema();
    let simple_data = generate_test_data(1, false).remove(0);
    let complex_data = generate_test_data(1, true).remove(0);
    let dispatcher = HybridDispatcher::new(DispatcherConfig::default());

    let mut group = c.benchmark_group("single_validation");

    group.bench_function("simple_schema", |b| {
        b.iter(|| black_box(simple_schema.validate(black_box(&simple_data))));
    });

    group.bench_function("complex_schema", |b| {
        b.iter(|| black_box(complex_schema.validate(black_box(&complex_data))));
    });

    group.bench_function("complex_schema_dispatched", |b| {
        b.iter(|| black_box(dispatcher.validate(&complex_schema, black_box(&complex_data))));
    });

    group.finish();
}

/// Benchmark batch validation performance
fn bench_batch_validation(c: &mut Criterion) {
    let complex_schema = create_complex_schema();
    let batch_sizes = vec![10, 100, 1000];

    let mut group = c.benchmark_group("batch_validation");

    for size in batch_sizes {
        group.throughput(Throughput::Elements(u64::try_from(size).unwrap_or(0)));
        let data = generate_test_data(size, true);

        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |b, &_size| {
            b.iter(|| black_box(complex_schema.validate_many(black_box(&data))));
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &size, |b, &_size| {
            b.iter(|| black_box(complex_schema.validate_many_parallel(black_box(&data))));
        });
    }

    group.finish();
}

/// Benchmark schema introspection that the dispatcher caches
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("introspection");

    group.bench_function("fingerprint_fresh_tree", |b| {
        b.iter(|| black_box(create_complex_schema().fingerprint()));
    });

    group.bench_function("describe", |b| {
        let schema = create_complex_schema();
        b.iter(|| black_box(schema.describe()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_validation,
    bench_batch_validation,
    bench_fingerprint
);
criterion_main!(benches);
