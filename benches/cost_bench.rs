use criterion::{criterion_group, criterion_main, Criterion};
use qapforge::layouts::KnownLayout;
use qapforge::optimizer::{Evaluator, Population};
use qapforge::scorer::flow::build_flow_matrix;
use qapforge::scorer::CostModel;
use std::hint::black_box;
use std::sync::Arc;

fn setup_model() -> CostModel {
    let alphabet: Vec<char> = ('a'..='z').collect();
    // Deterministic pseudo-frequencies, skewed like real bigram counts.
    let oracle = |key: &str| {
        let bytes = key.as_bytes();
        let a = (bytes[0] - b'a') as f64;
        let b = (bytes[1] - b'a') as f64;
        1.0e9 / (1.0 + a * 3.0 + b)
    };
    let flow = build_flow_matrix(&alphabet, &oracle).expect("flow matrix");
    let distance = KnownLayout::TileGroups.distance_matrix(26);
    CostModel::new(distance, flow).expect("cost model")
}

fn criterion_benchmark(c: &mut Criterion) {
    let model = Arc::new(setup_model());
    let assignment: Vec<usize> = (0..26).rev().collect();

    c.bench_function("cost (26 symbols)", |b| {
        b.iter(|| model.cost(black_box(&assignment)))
    });

    let evaluator = Evaluator::new(model.clone(), 4).expect("worker pool");
    let mut rng = fastrand::Rng::with_seed(1);
    let population = Population::initialize(26, 400, &mut rng).expect("population");

    c.bench_function("evaluate generation (400 individuals)", |b| {
        b.iter(|| {
            let mut pop = population.clone();
            evaluator.evaluate(black_box(&mut pop)).expect("evaluation")
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
