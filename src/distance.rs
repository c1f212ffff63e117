//! Dissimilarity measures for numerical and categorical attributes
//!
//! Both families are strategy traits so a configuration can carry any
//! implementation behind an `Arc<dyn ...>`. The same instance is used for
//! initialization, the main loop, cost evaluation and prediction.

use ndarray::ArrayView1;
use std::fmt::Debug;

/// Dissimilarity between two numerical vectors of equal length
pub trait NumericDissimilarity: Debug + Send + Sync {
    /// Compute the dissimilarity between `a` and `b`
    fn dissim(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64;
}

/// Dissimilarity between an encoded categorical point and a centroid
pub trait CategoricalDissimilarity: Debug + Send + Sync {
    /// Compute the dissimilarity between `point` and `centroid`.
    ///
    /// `mode_freqs`, when available, holds for every attribute the relative
    /// weighted frequency of the centroid's value inside the centroid's
    /// cluster. Measures that do not weight matches ignore it.
    fn dissim(
        &self,
        point: ArrayView1<usize>,
        centroid: ArrayView1<usize>,
        mode_freqs: Option<ArrayView1<f64>>,
    ) -> f64;
}

/// Squared Euclidean distance, the k-means part of k-prototypes
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl NumericDissimilarity for SquaredEuclidean {
    fn dissim(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

/// Simple matching distance for categorical data.
/// Each attribute contributes 0 if categories match, 1 if they don't.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingDissimilarity;

impl CategoricalDissimilarity for MatchingDissimilarity {
    fn dissim(
        &self,
        point: ArrayView1<usize>,
        centroid: ArrayView1<usize>,
        _mode_freqs: Option<ArrayView1<f64>>,
    ) -> f64 {
        mismatches(point, centroid)
    }
}

/// Hamming distance for categorical data (matching distance normalized by the
/// number of attributes)
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingDissimilarity;

impl CategoricalDissimilarity for HammingDissimilarity {
    fn dissim(
        &self,
        point: ArrayView1<usize>,
        centroid: ArrayView1<usize>,
        _mode_freqs: Option<ArrayView1<f64>>,
    ) -> f64 {
        if point.is_empty() {
            return 0.0;
        }
        mismatches(point, centroid) / point.len() as f64
    }
}

/// Frequency-weighted matching after Ng et al. (2007).
///
/// A mismatch costs 1. A match costs `1 - f`, where `f` is the share of the
/// cluster holding the centroid's value, so matching a weakly represented
/// mode is still penalized. Without cluster statistics a match costs 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NgDissimilarity;

impl CategoricalDissimilarity for NgDissimilarity {
    fn dissim(
        &self,
        point: ArrayView1<usize>,
        centroid: ArrayView1<usize>,
        mode_freqs: Option<ArrayView1<f64>>,
    ) -> f64 {
        debug_assert_eq!(point.len(), centroid.len());
        match mode_freqs {
            None => mismatches(point, centroid),
            Some(freqs) => point
                .iter()
                .zip(centroid.iter())
                .zip(freqs.iter())
                .map(|((x, c), f)| if x == c { 1.0 - f } else { 1.0 })
                .sum(),
        }
    }
}

/// Relative gap below which two accumulated quantities count as equal
pub(crate) const TIE_TOLERANCE: f64 = 1e-9;

/// `a < b` by more than accumulated rounding noise
pub(crate) fn clearly_less(a: f64, b: f64) -> bool {
    if !b.is_finite() {
        return a < b;
    }
    b - a > TIE_TOLERANCE * a.abs().max(b.abs())
}

fn mismatches(a: ArrayView1<usize>, b: ArrayView1<usize>) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() as f64
}

/// Combined k-prototypes dissimilarity: `num + gamma * cat`
#[derive(Debug, Clone, Copy)]
pub(crate) struct MixedDissimilarity<'a> {
    pub numeric: &'a dyn NumericDissimilarity,
    pub categorical: &'a dyn CategoricalDissimilarity,
    pub gamma: f64,
}

impl MixedDissimilarity<'_> {
    pub fn dissim(
        &self,
        point_num: ArrayView1<f64>,
        point_cat: ArrayView1<usize>,
        centroid_num: ArrayView1<f64>,
        centroid_cat: ArrayView1<usize>,
        mode_freqs: Option<ArrayView1<f64>>,
    ) -> f64 {
        // Skip the numeric call for categorical-only data (k-modes)
        let num = if point_num.is_empty() {
            0.0
        } else {
            self.numeric.dissim(point_num, centroid_num)
        };
        let cat = if point_cat.is_empty() {
            0.0
        } else {
            self.categorical.dissim(point_cat, centroid_cat, mode_freqs)
        };
        num + self.gamma * cat
    }
}
