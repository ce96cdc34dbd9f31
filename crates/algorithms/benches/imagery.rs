//! Benchmarks for index computation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bandclip_algorithms::imagery::{normalized_difference, IndexParams};
use bandclip_core::{GeoTransform, Raster};

fn create_band(size: usize, base: f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(394365.0, 5574015.0, 30.0, -30.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * 13) % 2000) as f64;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn bench_ndvi(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/normalized_difference");
    let params = IndexParams::default();
    for size in [256, 512, 1024, 2048] {
        let nir = create_band(size, 3000.0);
        let red = create_band(size, 1000.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| normalized_difference(black_box(&nir), black_box(&red), &params).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ndvi);
criterion_main!(benches);
