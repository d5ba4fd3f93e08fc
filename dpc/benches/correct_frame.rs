use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dpc::synthetic::{inject_defects, random_frame};
use dpc::{correct_frame, correct_frame_sequential, DpcParams};

fn bench_correct_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("correct_frame");

    for &(width, height) in &[(640usize, 480usize), (1920, 1080)] {
        let mut image = random_frame(width, height, 12, 1)
            .unwrap_or_else(|e| panic!("Failed to generate {width}x{height} frame: {e}"));
        inject_defects(&mut image, width * height / 1000, 12, 2)
            .unwrap_or_else(|e| panic!("Failed to inject defects: {e}"));
        let params = DpcParams::new(true, 30);
        let label = format!("{width}x{height}");

        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(BenchmarkId::new("parallel", &label), &image, |b, image| {
            b.iter(|| black_box(correct_frame(black_box(image), params)))
        });
        group.bench_with_input(BenchmarkId::new("sequential", &label), &image, |b, image| {
            b.iter(|| black_box(correct_frame_sequential(black_box(image), params)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_correct_frame);
criterion_main!(benches);
