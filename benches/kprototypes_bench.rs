use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kproto::{InitMethod, KPrototypes, MixedValue, NgDissimilarity};
use ndarray::Array2;
use rand::prelude::*;

/// Numerical columns first, then categorical ones
fn generate_mixed_data(
    n_samples: usize,
    n_numerical: usize,
    n_categorical: usize,
) -> (Array2<MixedValue<String>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data = Vec::with_capacity(n_samples * (n_categorical + n_numerical));

    for _ in 0..n_samples {
        // Three loose groups so the loop has something to do
        let group = rng.gen_range(0..3);
        for _ in 0..n_numerical {
            let value = group as f64 * 30.0 + rng.gen_range(0.0..40.0);
            data.push(MixedValue::Numerical(value));
        }
        for _ in 0..n_categorical {
            let category = if rng.gen_bool(0.7) { group } else { rng.gen_range(0..10) };
            data.push(MixedValue::Categorical(format!("cat_{}", category)));
        }
    }

    let categorical: Vec<usize> = (n_numerical..n_numerical + n_categorical).collect();
    let array = Array2::from_shape_vec((n_samples, n_categorical + n_numerical), data).unwrap();
    (array, categorical)
}

fn bench_init_methods(c: &mut Criterion) {
    let (data, categorical) = generate_mixed_data(300, 3, 4);
    let mut group = c.benchmark_group("init_methods");

    for method in [InitMethod::Random, InitMethod::Huang, InitMethod::Cao] {
        group.bench_with_input(BenchmarkId::from_parameter(method), &method, |b, &method| {
            let kproto = KPrototypes::new(5)
                .init_method(method)
                .random_state(42)
                .n_init(3)
                .max_iter(50);

            b.iter(|| black_box(kproto.fit(black_box(data.view()), &categorical, None).unwrap()));
        });
    }

    group.finish();
}

fn bench_dissimilarities(c: &mut Criterion) {
    let (data, categorical) = generate_mixed_data(300, 3, 4);
    let mut group = c.benchmark_group("categorical_dissimilarity");

    let matching = KPrototypes::new(5).max_iter(50);
    group.bench_function("matching", |b| {
        b.iter(|| black_box(matching.fit(black_box(data.view()), &categorical, None).unwrap()))
    });

    let ng = KPrototypes::new(5).max_iter(50).cat_dissim(NgDissimilarity);
    group.bench_function("ng", |b| {
        b.iter(|| black_box(ng.fit(black_box(data.view()), &categorical, None).unwrap()))
    });

    group.finish();
}

fn bench_parallel_restarts(c: &mut Criterion) {
    let (data, categorical) = generate_mixed_data(500, 4, 4);
    let mut group = c.benchmark_group("restarts");
    group.sample_size(10);

    for n_jobs in [1, 0] {
        let label = if n_jobs == 1 { "sequential" } else { "all_cores" };
        group.bench_function(label, |b| {
            let kproto = KPrototypes::new(5)
                .init_method(InitMethod::Huang)
                .n_init(8)
                .random_state(42)
                .n_jobs(n_jobs);
            b.iter(|| black_box(kproto.fit(black_box(data.view()), &categorical, None).unwrap()));
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let (data, categorical) = generate_mixed_data(1000, 4, 4);
    let model = KPrototypes::new(5).fit(data.view(), &categorical, None).unwrap();

    c.bench_function("predict_1000", |b| {
        b.iter(|| black_box(model.predict(black_box(data.view())).unwrap()))
    });
}

fn bench_kprototypes_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("kprototypes_scaling");
    group.sample_size(10);

    let sizes = [(100, 2, 3), (200, 3, 4), (500, 5, 5), (1000, 5, 5)];

    for &(n_samples, n_num, n_cat) in &sizes {
        let (data, categorical) = generate_mixed_data(n_samples, n_num, n_cat);

        group.bench_with_input(
            BenchmarkId::new("scaling", format!("{}x{}+{}", n_samples, n_num, n_cat)),
            &data,
            |b, data| {
                let kproto = KPrototypes::new(5).max_iter(30);
                b.iter(|| black_box(kproto.fit(black_box(data.view()), &categorical, None).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_init_methods,
    bench_dissimilarities,
    bench_parallel_restarts,
    bench_predict,
    bench_kprototypes_scaling
);
criterion_main!(benches);
