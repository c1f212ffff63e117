use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kproto::{HammingDissimilarity, InitMethod, KModes};
use ndarray::Array2;
use rand::prelude::*;

fn generate_categorical_data(n_samples: usize, n_features: usize, n_categories: usize) -> Array2<String> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data = Vec::with_capacity(n_samples * n_features);

    for _ in 0..n_samples {
        for _ in 0..n_features {
            let category = rng.gen_range(0..n_categories);
            data.push(format!("cat_{}", category));
        }
    }

    Array2::from_shape_vec((n_samples, n_features), data).unwrap()
}

fn bench_kmodes_small(c: &mut Criterion) {
    let data = generate_categorical_data(100, 5, 10);
    let mut group = c.benchmark_group("kmodes_small");

    for &n_clusters in &[2, 5, 10] {
        for method in [InitMethod::Huang, InitMethod::Cao] {
            group.bench_with_input(
                BenchmarkId::new(format!("{}_init", method), n_clusters),
                &n_clusters,
                |b, &k| {
                    let kmodes = KModes::new(k)
                        .init_method(method)
                        .random_state(42)
                        .n_init(1)
                        .max_iter(50);

                    b.iter(|| black_box(kmodes.fit(black_box(data.view()), None).unwrap()));
                },
            );
        }
    }

    group.finish();
}

fn bench_kmodes_weighted(c: &mut Criterion) {
    let data = generate_categorical_data(500, 8, 6);
    let weights: Vec<f64> = (0..500).map(|i| 1.0 + (i % 5) as f64).collect();

    let kmodes = KModes::new(6).max_iter(50);
    c.bench_function("kmodes_weighted_500", |b| {
        b.iter(|| black_box(kmodes.fit(black_box(data.view()), Some(&weights)).unwrap()))
    });

    let hamming = KModes::new(6).max_iter(50).cat_dissim(HammingDissimilarity);
    c.bench_function("kmodes_hamming_500", |b| {
        b.iter(|| black_box(hamming.fit(black_box(data.view()), None).unwrap()))
    });
}

fn bench_kmodes_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmodes_scaling");
    group.sample_size(10);

    for &n_samples in &[200, 1000, 5000] {
        let data = generate_categorical_data(n_samples, 6, 8);
        group.bench_with_input(BenchmarkId::from_parameter(n_samples), &data, |b, data| {
            let kmodes = KModes::new(8).max_iter(30);
            b.iter(|| black_box(kmodes.fit(black_box(data.view()), None).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kmodes_small, bench_kmodes_weighted, bench_kmodes_scaling);
criterion_main!(benches);
