use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use twoview_linalg::{normalize::normalize_points_2d, svd, Point2d};

fn make_points(n: usize) -> Vec<Point2d> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            Point2d::new(320.0 + 100.0 * (0.37 * t).sin(), 240.0 + 80.0 * (0.11 * t).cos())
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_points_2d");
    for &n in &[8, 100, 1000] {
        let points = make_points(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| std::hint::black_box(normalize_points_2d(&points)));
        });
    }
    group.finish();
}

fn bench_null_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("null_vector");
    for &rows in &[8, 64, 512] {
        let a = faer::Mat::<f64>::from_fn(rows, 9, |i, j| ((i * 9 + j) as f64 * 0.7).sin());
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| std::hint::black_box(svd::null_vector(&a)));
        });
    }
    group.finish();
}

fn bench_svd3(c: &mut Criterion) {
    let m = [[4.0, 1.0, 0.5], [2.0, 3.0, 1.0], [0.0, 1.0, 5.0]];
    c.bench_function("enforce_rank2", |b| {
        b.iter(|| std::hint::black_box(svd::enforce_rank2(&m)))
    });
}

criterion_group!(benches, bench_normalize, bench_null_vector, bench_svd3);
criterion_main!(benches);
