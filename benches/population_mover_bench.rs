use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use microsim_stats_core::mover::{Member, PopulationMover};
use microsim_stats_core::num::matrix::Matrix;
use microsim_stats_core::rng::SplitMix64;

fn five_range_mover() -> PopulationMover {
    let transition = Matrix::from_rows(&[
        vec![0.6, 0.2, 0.05, 0.0, 0.0],
        vec![0.3, 0.5, 0.2, 0.1, 0.05],
        vec![0.07, 0.2, 0.5, 0.2, 0.1],
        vec![0.02, 0.08, 0.2, 0.5, 0.3],
        vec![0.01, 0.02, 0.05, 0.2, 0.55],
    ]);
    PopulationMover::new(transition, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0], 1e-8).unwrap()
}

fn bench_move_1000_members(c: &mut Criterion) {
    let mover = five_range_mover();
    c.bench_function("population_mover_move_1000_members", |b| {
        b.iter_batched(
            || {
                let rng = SplitMix64::seed_from_u64(1);
                let population: Vec<Member> = (0..1000)
                    .map(|i| Member { range_index: i % 5, value: 10.0 * (i % 5) as f64 + 1.0 })
                    .collect();
                (rng, population)
            },
            |(mut rng, mut population)| {
                mover.move_between_ranges(&mut population, &mut rng).unwrap();
                black_box(&population);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_move_1000_members);
criterion_main!(benches);
