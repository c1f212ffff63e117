//! K-prototypes clustering for mixed categorical and numerical data
//!
//! Clusters a small customer table, compares automatic and explicit gamma,
//! and assigns new customers with the fitted model.
//!
//! Run with `RUST_LOG=debug` to see the per-restart and per-pass events.

use kproto::utils::cluster_sizes;
use kproto::{InitMethod, KPrototypes, MixedValue};
use ndarray::Array2;
use tracing_subscriber::EnvFilter;

type Customer = (&'static str, &'static str, f64, f64, f64);

fn to_rows(customers: &[Customer]) -> Array2<MixedValue<String>> {
    let cells = customers
        .iter()
        .flat_map(|&(segment, region, age, income, satisfaction)| {
            [
                MixedValue::Categorical(segment.to_string()),
                MixedValue::Categorical(region.to_string()),
                MixedValue::Numerical(age),
                MixedValue::Numerical(income / 1000.0),
                MixedValue::Numerical(satisfaction),
            ]
        })
        .collect();
    Array2::from_shape_vec((customers.len(), 5), cells).expect("five values per customer")
}

fn describe(value: &MixedValue<String>) -> String {
    match value {
        MixedValue::Categorical(s) => format!("'{}'", s),
        MixedValue::Numerical(n) => format!("{:.1}", n),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let customers: [Customer; 15] = [
        ("professional", "urban", 28.0, 75000.0, 8.5),
        ("professional", "urban", 32.0, 82000.0, 7.8),
        ("professional", "urban", 29.0, 78000.0, 8.2),
        ("family", "suburban", 45.0, 95000.0, 7.2),
        ("family", "suburban", 42.0, 88000.0, 7.5),
        ("family", "suburban", 47.0, 102000.0, 6.9),
        ("family", "suburban", 44.0, 92000.0, 7.1),
        ("retired", "rural", 68.0, 45000.0, 6.2),
        ("retired", "rural", 72.0, 38000.0, 5.8),
        ("retired", "rural", 65.0, 42000.0, 6.0),
        ("student", "urban", 22.0, 25000.0, 7.8),
        ("student", "urban", 20.0, 20000.0, 8.1),
        ("student", "suburban", 23.0, 22000.0, 7.5),
        ("professional", "rural", 35.0, 65000.0, 6.0),
        ("family", "urban", 38.0, 85000.0, 7.3),
    ];
    let data = to_rows(&customers);
    // segment and region; age, income (thousands) and satisfaction are numerical
    let categorical = [0, 1];

    println!("=== Automatic gamma, Cao initialization ===");
    let kproto = KPrototypes::new(4).verbose(1);
    let model = kproto.fit(data.view(), &categorical, None)?;

    println!("gamma:      {:.3}", model.gamma());
    println!("converged:  {} after {} passes", model.converged(), model.n_iter());
    println!("cost:       {:.3}", model.cost());
    println!("labels:     {:?}", model.labels().to_vec());
    println!("sizes:      {:?}", cluster_sizes(model.labels().view(), 4));
    for (i, centroid) in model.cluster_centroids().rows().into_iter().enumerate() {
        let values: Vec<String> = centroid.iter().map(describe).collect();
        println!("  cluster {}: [{}]", i, values.join(", "));
    }
    println!();

    println!("=== Effect of gamma ===");
    for gamma in [0.1, 1.0, 10.0, 100.0] {
        let model = KPrototypes::new(4)
            .gamma(gamma)
            .init_method(InitMethod::Huang)
            .n_init(5)
            .random_state(42)
            .fit(data.view(), &categorical, None)?;
        println!("gamma {:>6.1}: labels {:?}", gamma, model.labels().to_vec());
    }
    println!();

    println!("=== Loyal customers count double ===");
    let weights: Vec<f64> = (0..customers.len())
        .map(|i| if i % 3 == 0 { 2.0 } else { 1.0 })
        .collect();
    let weighted = kproto.fit(data.view(), &categorical, Some(&weights))?;
    println!("labels: {:?}", weighted.labels().to_vec());
    println!();

    println!("=== New customers ===");
    let newcomers = to_rows(&[
        ("student", "rural", 21.0, 18000.0, 7.9),
        ("retired", "urban", 70.0, 41000.0, 6.1),
        ("freelancer", "urban", 31.0, 70000.0, 8.0),
    ]);
    let (labels, cost) = model.predict_with_cost(newcomers.view(), None)?;
    println!("labels: {:?} (cost {:.3})", labels.to_vec(), cost);

    Ok(())
}
