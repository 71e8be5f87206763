use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tarrasch::{EngineColor, GameController};

fn perft_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft_opening_position");
    group.significance_level(0.1).sample_size(20);

    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut controller = GameController::new(EngineColor::White);
                black_box(controller.perft(depth))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, perft_benchmark);
criterion_main!(benches);
