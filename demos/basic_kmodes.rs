//! Basic k-modes clustering example
//!
//! Clusters purely categorical records and compares the initialization
//! methods.

use kproto::{InitMethod, KModes};
use ndarray::Array2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Features: [color, size, shape]
    let data = Array2::from_shape_vec(
        (12, 3),
        vec![
            "red", "small", "circle",
            "red", "small", "circle",
            "red", "medium", "circle",
            "blue", "large", "square",
            "blue", "large", "square",
            "blue", "medium", "square",
            "green", "small", "triangle",
            "green", "small", "triangle",
            "green", "medium", "triangle",
            "red", "large", "circle",
            "blue", "small", "square",
            "green", "large", "triangle",
        ],
    )?;

    println!("Data shape: {:?}", data.dim());
    println!();

    let model = KModes::new(3).fit(data.view(), None)?;
    println!("=== Cao initialization ===");
    println!("Converged: {} after {} passes", model.converged(), model.n_iter());
    println!("Cost: {}", model.cost());
    println!("Labels: {:?}", model.labels().to_vec());
    println!("Modes:");
    for (i, mode) in model.cluster_centroids().rows().into_iter().enumerate() {
        println!("  cluster {}: {:?}", i, mode.to_vec());
    }
    println!();

    println!("=== Comparing initialization methods ===");
    for method in [InitMethod::Random, InitMethod::Huang, InitMethod::Cao] {
        let model = KModes::new(3)
            .init_method(method)
            .n_init(5)
            .random_state(42)
            .fit(data.view(), None)?;
        println!(
            "{:>6}: cost {:>4}, passes {}, labels {:?}",
            method.to_string(),
            model.cost(),
            model.n_iter(),
            model.labels().to_vec()
        );
    }
    println!();

    println!("=== Predicting new records ===");
    let fresh = Array2::from_shape_vec(
        (3, 3),
        vec!["red", "tiny", "circle", "green", "large", "triangle", "purple", "medium", "square"],
    )?;
    println!("Labels: {:?}", model.predict(fresh.view())?.to_vec());

    Ok(())
}
