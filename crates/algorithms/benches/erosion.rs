//! Benchmarks for the RUSLE rasters

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hydromorph_algorithms::config::RusleParams;
use hydromorph_algorithms::erosion::rusle;
use hydromorph_algorithms::terrain::{slope, SlopeParams};
use hydromorph_core::{GeoTransform, Raster};

/// Valley surface draining to the bottom edge, with flow piling up along the centre column
fn create_inputs(size: usize) -> (Raster<f64>, Raster<f64>) {
    let mut dem = Raster::new(size, size);
    dem.set_transform(GeoTransform::new(0.0, size as f64 * 30.0, 30.0, -30.0));
    let mut acc = dem.like(1.0);
    let center = size / 2;
    for row in 0..size {
        for col in 0..size {
            let across = (col as f64 - center as f64).abs();
            let noise = ((row * 7 + col * 13) % 17) as f64 * 0.05;
            dem.set(row, col, 500.0 + 2.0 * (size - row) as f64 + 4.0 * across + noise).unwrap();
            if col == center {
                acc.set(row, col, ((row + 1) * size) as f64).unwrap();
            }
        }
    }
    (dem, acc)
}

fn bench_rusle(c: &mut Criterion) {
    let mut group = c.benchmark_group("erosion/rusle");
    let params = RusleParams::default();
    for size in [256, 512, 1024] {
        let (dem, acc) = create_inputs(size);
        let slope_deg = slope(&dem, SlopeParams::default()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| rusle(black_box(&dem), black_box(&acc), black_box(&slope_deg), &params).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rusle);
criterion_main!(benches);
