//! Plugging custom dissimilarities into k-prototypes and k-modes
//!
//! Any type implementing `NumericDissimilarity` or `CategoricalDissimilarity`
//! can replace the built-in measures. The same instance is used for
//! initialization, the assignment loop and prediction.

use kproto::{
    CategoricalDissimilarity, HammingDissimilarity, KModes, KPrototypes, MatchingDissimilarity,
    MixedValue, NgDissimilarity, NumericDissimilarity,
};
use ndarray::{Array2, ArrayView1};

/// Sum of absolute differences
#[derive(Debug)]
struct Manhattan;

impl NumericDissimilarity for Manhattan {
    fn dissim(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
    }
}

/// Matching dissimilarity where each attribute carries its own cost
#[derive(Debug)]
struct WeightedMatching {
    costs: Vec<f64>,
}

impl CategoricalDissimilarity for WeightedMatching {
    fn dissim(
        &self,
        point: ArrayView1<usize>,
        centroid: ArrayView1<usize>,
        _mode_freqs: Option<ArrayView1<f64>>,
    ) -> f64 {
        point
            .iter()
            .zip(centroid.iter())
            .zip(self.costs.iter())
            .filter(|((x, c), _)| x != c)
            .map(|(_, cost)| cost)
            .sum()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Features: [music, food, sport]
    let preferences = Array2::from_shape_vec(
        (8, 3),
        vec![
            "Rock", "Italian", "Soccer",
            "Rock", "Italian", "Basketball",
            "Pop", "Chinese", "Tennis",
            "Pop", "Chinese", "Swimming",
            "Jazz", "Mexican", "Soccer",
            "Jazz", "Mexican", "Basketball",
            "Rock", "Italian", "Tennis",
            "Pop", "Chinese", "Soccer",
        ],
    )?;

    println!("=== K-modes with different categorical dissimilarities ===");
    let runs: [(&str, KModes<&str>); 4] = [
        ("matching", KModes::new(3).cat_dissim(MatchingDissimilarity)),
        ("hamming", KModes::new(3).cat_dissim(HammingDissimilarity)),
        ("ng", KModes::new(3).cat_dissim(NgDissimilarity)),
        (
            "sport-heavy",
            KModes::new(3).cat_dissim(WeightedMatching {
                costs: vec![1.0, 1.0, 3.0],
            }),
        ),
    ];
    for (name, kmodes) in runs {
        let model = kmodes.fit(preferences.view(), None)?;
        println!(
            "{:>12}: cost {:.3}, labels {:?}",
            name,
            model.cost(),
            model.labels().to_vec()
        );
    }
    println!();

    println!("=== K-prototypes with Manhattan numeric distance ===");
    let rows: [(f64, &str); 8] = [
        (1.0, "a"),
        (1.5, "a"),
        (2.0, "b"),
        (8.0, "b"),
        (8.5, "c"),
        (9.0, "c"),
        (30.0, "a"),
        (31.0, "c"),
    ];
    let cells = rows
        .iter()
        .flat_map(|&(x, c)| [MixedValue::Numerical(x), MixedValue::Categorical(c)])
        .collect();
    let data = Array2::from_shape_vec((rows.len(), 2), cells)?;

    for (name, kproto) in [
        ("squared euclidean", KPrototypes::new(3)),
        ("manhattan", KPrototypes::new(3).num_dissim(Manhattan)),
    ] {
        let model = kproto.fit(data.view(), &[1], None)?;
        println!(
            "{:>18}: gamma {:.3}, cost {:.3}, labels {:?}",
            name,
            model.gamma(),
            model.cost(),
            model.labels().to_vec()
        );
    }

    Ok(())
}
