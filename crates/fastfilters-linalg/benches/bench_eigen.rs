use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fastfilters_linalg::{eigenvalues2d, eigenvalues3d};
use rand::Rng;
use std::hint::black_box;

fn random_field(len: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
}

fn bench_eigen(c: &mut Criterion) {
    let mut group = c.benchmark_group("Eigenvalues");

    for len in [1 << 12, 1 << 16, 1 << 20].iter() {
        group.throughput(criterion::Throughput::Elements(*len as u64));

        let (xx, xy, yy) = (random_field(*len), random_field(*len), random_field(*len));
        let mut small = vec![0.0; *len];
        let mut big = vec![0.0; *len];

        group.bench_with_input(BenchmarkId::new("ev2d", len), len, |b, _| {
            b.iter(|| black_box(eigenvalues2d(&xx, &xy, &yy, &mut small, &mut big)))
        });

        let (xz, yz, zz) = (random_field(*len), random_field(*len), random_field(*len));
        let mut ev0 = vec![0.0; *len];
        let mut ev1 = vec![0.0; *len];
        let mut ev2 = vec![0.0; *len];

        group.bench_with_input(BenchmarkId::new("ev3d", len), len, |b, _| {
            b.iter(|| {
                black_box(eigenvalues3d(
                    &xx, &xy, &xz, &yy, &yz, &zz, &mut ev0, &mut ev1, &mut ev2,
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_eigen);
criterion_main!(benches);
