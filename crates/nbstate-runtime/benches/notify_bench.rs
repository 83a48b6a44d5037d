//! Benchmarks for state notification fan-out.
//!
//! Run with: cargo bench -p nbstate-runtime --bench notify_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nbstate_runtime::{Observable, StateHandler};
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Doc {
    version: u64,
    cells: Vec<String>,
}

fn doc(cells: usize) -> Doc {
    Doc {
        version: 0,
        cells: (0..cells).map(|i| format!("cell {i}")).collect(),
    }
}

// =============================================================================
// Observer fan-out
// =============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/fan_out");

    for observers in [1usize, 16, 256] {
        let handler = StateHandler::new(0u64);
        let hits = Rc::new(Cell::new(0u64));
        for _ in 0..observers {
            let hits = Rc::clone(&hits);
            handler
                .add_observer(move |new, _| hits.set(hits.get().wrapping_add(*new)))
                .unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(observers), &handler, |b, h| {
            b.iter(|| black_box(h.update(|n| n + 1).unwrap()))
        });
    }

    group.finish();
}

// =============================================================================
// Suppressed updates (structural equality on the hot path)
// =============================================================================

fn bench_suppressed(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/suppressed");

    for cells in [10usize, 1_000] {
        let handler = StateHandler::new(doc(cells));
        handler.add_observer(|_, _| {}).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(cells), &handler, |b, h| {
            b.iter(|| black_box(h.update(Doc::clone).unwrap()))
        });
    }

    group.finish();
}

// =============================================================================
// Views
// =============================================================================

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/views");

    let handler = StateHandler::new(doc(100));
    let views: Vec<_> = (0..32)
        .map(|_| handler.view(|d: &Doc| &d.cells).unwrap())
        .collect();
    group.bench_function("unrelated_field_change", |b| {
        b.iter(|| {
            black_box(
                handler
                    .update(|d| Doc {
                        version: d.version + 1,
                        cells: d.cells.clone(),
                    })
                    .unwrap(),
            )
        })
    });
    drop(views);

    group.bench_function("create_and_dispose", |b| {
        b.iter(|| {
            let view = handler.view(|d: &Doc| &d.version).unwrap();
            view.dispose();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fan_out, bench_suppressed, bench_views);
criterion_main!(benches);
