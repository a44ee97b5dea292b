use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fastfilters_image::{Array2, CpuAllocator};
use fastfilters_imgproc::{
    cpu::{CpuFeature, CpuFeatures},
    filter::{convolve2d, FilterOptions},
    Context,
};
use rand::Rng;
use std::hint::black_box;

fn random_image(width: usize, height: usize) -> Array2 {
    let mut rng = rand::rng();
    let data: Vec<f32> = (0..width * height)
        .map(|_| rng.random_range(0.0..1.0))
        .collect();
    Array2::from_shape_slice([width, height], 1, &data, CpuAllocator).unwrap()
}

fn bench_convolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("Gaussian Convolve2d");

    let detected = CpuFeatures::detect();
    let mut avx_only = detected;
    avx_only.enable(CpuFeature::Fma, false);
    let tables = [
        ("scalar", CpuFeatures::scalar()),
        ("avx", avx_only),
        ("detected", detected),
    ];

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        for sigma in [1.0, 2.0, 5.0].iter() {
            group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

            let parameter_string = format!("{}x{}x{}", width, height, sigma);
            let src = random_image(*width, *height);
            let dst = Array2::zeros([*width, *height], 1, CpuAllocator).unwrap();

            for (name, table) in tables.iter() {
                let ctx = Context::new().with_features(*table);
                let kernel = ctx.kernel_fir_gaussian(0, *sigma, 0.0).unwrap();

                group.bench_with_input(
                    BenchmarkId::new(format!("fir_{name}"), &parameter_string),
                    &(&src, &dst),
                    |b, i| {
                        let (src, mut dst) = (i.0, i.1.clone());
                        let options = FilterOptions::default();
                        b.iter(|| {
                            black_box(convolve2d(
                                &ctx,
                                &src.view(),
                                &kernel,
                                &kernel,
                                &mut dst.view_mut(),
                                &options,
                            ))
                        })
                    },
                );
            }

            let ctx = Context::new();
            let kernel = ctx.kernel_iir_gaussian(0, *sigma, 0.0).unwrap();
            group.bench_with_input(
                BenchmarkId::new("iir", &parameter_string),
                &(&src, &dst),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    let options = FilterOptions::default();
                    b.iter(|| {
                        black_box(convolve2d(
                            &ctx,
                            &src.view(),
                            &kernel,
                            &kernel,
                            &mut dst.view_mut(),
                            &options,
                        ))
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_convolve);
criterion_main!(benches);
