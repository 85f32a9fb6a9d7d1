//! Benchmarks for burn metrics and thresholding

use burnscar_algorithms::classification::{OtsuThreshold, ThresholdingStrategy};
use burnscar_algorithms::imagery::{compute_burn_metrics, median_composite, ReducedImagery};
use burnscar_core::{GeoTransform, Raster};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn create_band(size: usize, base: f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64 * 20.0, 20.0, -20.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * 13) % 200) as f64 * 1e-3;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn imagery(size: usize, nir: f64, swir: f64) -> ReducedImagery {
    ReducedImagery::new(create_band(size, nir), create_band(size, swir)).unwrap()
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("burn/metric_stack");
    for size in [256, 512, 1024, 2048] {
        let pre = imagery(size, 0.35, 0.12);
        let post = imagery(size, 0.18, 0.25);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| compute_burn_metrics(black_box(&pre), black_box(&post)).unwrap())
        });
    }
    group.finish();
}

fn bench_median_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("burn/median_composite");
    for size in [256, 512, 1024] {
        let series: Vec<Raster<f64>> = (0..5).map(|i| create_band(size, 0.1 * i as f64)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| median_composite(black_box(&series)).unwrap())
        });
    }
    group.finish();
}

fn bench_otsu(c: &mut Criterion) {
    let mut group = c.benchmark_group("burn/otsu");
    let otsu = OtsuThreshold::default();
    for size in [256, 512, 1024, 2048] {
        let layer = create_band(size, 0.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| otsu.apply(black_box(&layer)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_metrics, bench_median_composite, bench_otsu);
criterion_main!(benches);
