//! Integer encoding of categorical attributes
//!
//! The clustering engine only compares categories for equality, so every
//! attribute's tokens are mapped to dense codes `0..n_levels` in the order in
//! which they are first seen. Frequency tables can then be plain vectors, and
//! "lowest code" is a stable tie-break meaning "first seen".

use ndarray::{Array1, Array2, ArrayView2};
use std::collections::HashMap;
use std::hash::Hash;

/// Code given to tokens that were not present when the encoder was fitted.
/// It never equals a centroid code, so it always counts as a mismatch.
pub const UNKNOWN_CODE: usize = usize::MAX;

/// Per-attribute bidirectional mapping between tokens and codes
#[derive(Debug, Clone)]
pub struct CategoricalEncoder<T> {
    levels: Vec<Vec<T>>,
    lookup: Vec<HashMap<T, usize>>,
}

impl<T: Clone + Eq + Hash> CategoricalEncoder<T> {
    /// Build the encoder from `data` (rows × categorical attributes) and
    /// return the encoded matrix alongside it.
    pub fn fit_transform(data: ArrayView2<T>) -> (Self, Array2<usize>) {
        let n_attrs = data.ncols();
        let mut levels: Vec<Vec<T>> = vec![Vec::new(); n_attrs];
        let mut lookup: Vec<HashMap<T, usize>> = vec![HashMap::new(); n_attrs];

        let codes = Array2::from_shape_fn(data.dim(), |(row, attr)| {
            let value = &data[[row, attr]];
            if let Some(&code) = lookup[attr].get(value) {
                return code;
            }
            let code = levels[attr].len();
            levels[attr].push(value.clone());
            lookup[attr].insert(value.clone(), code);
            code
        });

        (Self { levels, lookup }, codes)
    }

    /// Encode `data` with the fitted mapping. Unseen tokens become
    /// [`UNKNOWN_CODE`].
    pub fn transform(&self, data: ArrayView2<T>) -> Array2<usize> {
        Array2::from_shape_fn(data.dim(), |(row, attr)| {
            self.encode(attr, &data[[row, attr]])
        })
    }

    /// Encode a single token of attribute `attr`
    pub fn encode(&self, attr: usize, value: &T) -> usize {
        self.lookup
            .get(attr)
            .and_then(|map| map.get(value))
            .copied()
            .unwrap_or(UNKNOWN_CODE)
    }

    /// Token behind `code` for attribute `attr`, if any
    pub fn decode(&self, attr: usize, code: usize) -> Option<&T> {
        self.levels.get(attr).and_then(|values| values.get(code))
    }

    /// Number of categorical attributes
    pub fn n_attributes(&self) -> usize {
        self.levels.len()
    }

    /// Number of distinct tokens seen per attribute
    pub fn n_levels(&self) -> Vec<usize> {
        self.levels.iter().map(Vec::len).collect()
    }
}

/// Validated, encoded input consumed by the clustering engine
#[derive(Debug, Clone)]
pub(crate) struct EncodedData {
    /// Rows × numerical attributes
    pub numeric: Array2<f64>,
    /// Rows × categorical attributes (codes)
    pub categorical: Array2<usize>,
    /// One non-negative weight per row
    pub weights: Array1<f64>,
    /// Distinct codes per categorical attribute
    pub n_levels: Vec<usize>,
}

impl EncodedData {
    pub fn n_samples(&self) -> usize {
        self.weights.len()
    }

    pub fn n_numeric(&self) -> usize {
        self.numeric.ncols()
    }

    pub fn n_categorical(&self) -> usize {
        self.categorical.ncols()
    }
}
