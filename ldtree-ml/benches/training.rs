//! Benchmarks for ID3 training and evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ldtree_ml::{train, Rng, State, Table};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// Synthetic agent history: `features` (at least 2) columns with 4 states each, action
/// derived from the first two features plus noise, heavy duplication.
fn synthetic_table(features: usize, samples: usize) -> Table {
    let names: Vec<String> = (0..features)
        .map(|i| format!("f{}", i))
        .chain(std::iter::once("action".to_string()))
        .collect();
    let mut table = Table::with_columns(&names).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let mut row: Vec<State> = vec![0; features + 1];
    for _ in 0..samples {
        for value in row.iter_mut().take(features) {
            *value = rng.gen_range(0..4);
        }
        let noise = if rng.gen_bool(0.1) { 1 } else { 0 };
        row[features] = (row[0] + row[1] + noise) % 3;
        table.add_row(&row).unwrap();
    }
    table
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("id3_train");

    for features in [2usize, 4, 6].iter() {
        let table = synthetic_table(*features, 2_000);
        group.bench_with_input(BenchmarkId::from_parameter(features), features, |b, _| {
            b.iter(|| train(black_box(&table)).unwrap());
        });
    }

    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("id3_eval");

    for features in [2usize, 4, 6].iter() {
        let table = synthetic_table(*features, 2_000);
        let tree = train(&table).unwrap();
        let rows: Vec<Vec<State>> = (0..table.table_row_count())
            .filter_map(|i| table.row(i))
            .map(|mut row| {
                row.pop();
                row
            })
            .collect();

        let mut rng = Rng::new(1);
        group.bench_with_input(BenchmarkId::from_parameter(features), features, |b, _| {
            b.iter(|| {
                for row in &rows {
                    black_box(tree.eval(black_box(row), &mut rng));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_train, bench_eval);
criterion_main!(benches);
