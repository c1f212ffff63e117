//! # K-prototypes and K-modes Clustering
//!
//! This crate clusters records that mix numerical and categorical attributes.
//!
//! ## Features
//!
//! - **K-prototypes**: squared Euclidean distance on the numerical attributes
//!   plus `gamma` times a categorical dissimilarity
//! - **K-modes**: the purely categorical special case
//! - Incremental prototypes: samples move one at a time and cluster means and
//!   modes are updated in place
//! - Random, Huang and Cao initialization, or explicit centroids
//! - Optional sample weights
//! - Parallel restarts via Rayon, reproducible for a fixed seed
//!
//! ## Example
//!
//! ```rust
//! use kproto::{KPrototypes, MixedValue};
//! use ndarray::Array2;
//!
//! let rows = vec![
//!     MixedValue::Numerical(1.0), MixedValue::Categorical("red"),
//!     MixedValue::Numerical(1.5), MixedValue::Categorical("red"),
//!     MixedValue::Numerical(9.0), MixedValue::Categorical("blue"),
//!     MixedValue::Numerical(9.5), MixedValue::Categorical("blue"),
//! ];
//! let data = Array2::from_shape_vec((4, 2), rows).unwrap();
//!
//! // Column 1 is categorical, column 0 numerical
//! let model = KPrototypes::new(2)
//!     .random_state(42)
//!     .fit(data.view(), &[1], None)
//!     .unwrap();
//!
//! let labels = model.labels();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! ```

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod distance;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod initialization;
pub mod kmodes;
pub mod kprototypes;
pub mod prototypes;
pub mod utils;

pub use distance::{
    CategoricalDissimilarity, HammingDissimilarity, MatchingDissimilarity, NgDissimilarity,
    NumericDissimilarity, SquaredEuclidean,
};
pub use engine::{LoopState, MAX_INIT_TRIES};
pub use error::{Error, Result};
pub use initialization::{Init, InitArray, InitMethod};
pub use kmodes::{KModes, KModesModel};
pub use kprototypes::{KPrototypes, KPrototypesModel, MixedValue};

/// Re-export commonly used types from ndarray
pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_functionality() {
        let config = KPrototypes::<String>::default();
        assert_eq!(config.n_clusters, 8);
        assert_eq!(config.init, Init::Method(InitMethod::Cao));
        assert_eq!(config.gamma, None);
    }
}
