use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use molar_glass::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// Random silica-like configuration at the density of vitreous silica
fn random_sio2(n_si: usize, seed: u64) -> Frame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // 0.0661 atoms per cubic angstrom
    let l = (3.0 * n_si as f32 / 0.0661).cbrt();
    let atoms = (0..3 * n_si)
        .map(|i| {
            let el = if i < n_si { "Si" } else { "O" };
            Atom::new(
                i,
                el,
                Pos::new(rng.gen_range(0.0..l), rng.gen_range(0.0..l), rng.gen_range(0.0..l)),
            )
        })
        .collect();
    Frame::new(0, atoms, PeriodicBox::new(l, l, l).unwrap()).unwrap()
}

fn search_benchmark(c: &mut Criterion) {
    let table = Settings::sio2().cutoff_table().unwrap();
    let mut group = c.benchmark_group("neighbor_search");

    for n_si in [100, 300, 1000] {
        let fr = random_sio2(n_si, 42);
        group.bench_with_input(BenchmarkId::new("grid", 3 * n_si), &fr, |b, fr| {
            b.iter(|| NeighborFinder::new(&table).find(black_box(fr)).unwrap())
        });
        // Quadratic, only for small systems
        if n_si <= 300 {
            group.bench_with_input(BenchmarkId::new("brute_force", 3 * n_si), &fr, |b, fr| {
                b.iter(|| {
                    NeighborFinder::new(&table)
                        .with_method(SearchMethod::BruteForce)
                        .find(black_box(fr))
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}

fn frame_benchmark(c: &mut Criterion) {
    let an = TrajectoryAnalyzer::new(Settings::sio2()).unwrap();
    let fr = random_sio2(300, 7);
    c.bench_function("analyze_frame", |b| {
        b.iter(|| an.analyze_frame(black_box(&fr)).unwrap())
    });
}

criterion_group! {
    name = neighbor_search;
    config = Criterion::default().sample_size(20).warm_up_time(Duration::from_secs(3));
    targets = search_benchmark, frame_benchmark
}
criterion_main!(neighbor_search);
