//! Initialization methods for k-modes and k-prototypes clustering

use crate::distance::{clearly_less, MixedDissimilarity};
use crate::encoding::{CategoricalEncoder, EncodedData};
use crate::error::{Error, Result};
use crate::utils::weighted_column_stats;
use ndarray::{Array2, ArrayView1};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::StandardNormal;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Named initialization policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InitMethod {
    /// Numeric centroids jittered around the attribute means, categorical
    /// centroids drawn from each attribute's empirical distribution
    Random,
    /// Like `Random`, but each categorical centroid is moved onto the closest
    /// observed combination of categories (Huang, 1998)
    Huang,
    /// Deterministic density-based selection of observed samples (Cao et al., 2009)
    Cao,
}

impl InitMethod {
    /// Whether the policy produces the same centroids on every restart
    pub fn is_deterministic(self) -> bool {
        matches!(self, InitMethod::Cao)
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitMethod::Random => write!(f, "random"),
            InitMethod::Huang => write!(f, "huang"),
            InitMethod::Cao => write!(f, "cao"),
        }
    }
}

impl FromStr for InitMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "huang" => Ok(Self::Huang),
            "cao" => Ok(Self::Cao),
            other => Err(Error::not_implemented(format!(
                "unknown initialization method '{other}'"
            ))),
        }
    }
}

/// One user-supplied centroid array
#[derive(Debug, Clone, PartialEq)]
pub enum InitArray<T> {
    /// `n_clusters × n_numerical` centroid values
    Numeric(Array2<f64>),
    /// `n_clusters × n_categorical` centroid values
    Categorical(Array2<T>),
}

/// How the first centroids of a run are obtained
#[derive(Debug, Clone, PartialEq)]
pub enum Init<T> {
    /// One of the built-in policies
    Method(InitMethod),
    /// Explicit centroids: exactly `[Numeric, Categorical]`, in that order
    Manual(Vec<InitArray<T>>),
}

impl<T> Init<T> {
    /// Whether every restart would start from the same centroids
    pub fn is_deterministic(&self) -> bool {
        match self {
            Init::Method(method) => method.is_deterministic(),
            Init::Manual(_) => true,
        }
    }
}

impl<T> Default for Init<T> {
    fn default() -> Self {
        Init::Method(InitMethod::Cao)
    }
}

impl<T> From<InitMethod> for Init<T> {
    fn from(method: InitMethod) -> Self {
        Init::Method(method)
    }
}

/// Encoded centroids: numeric values and categorical codes
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Centroids {
    pub numeric: Array2<f64>,
    pub categorical: Array2<usize>,
}

impl Centroids {
    pub fn n_clusters(&self) -> usize {
        self.categorical.nrows()
    }

    /// Whether centroid `cluster` is exactly the sample at `row`
    fn equals_row(&self, cluster: usize, data: &EncodedData, row: usize) -> bool {
        self.numeric.row(cluster) == data.numeric.row(row)
            && self.categorical.row(cluster) == data.categorical.row(row)
    }
}

/// Initialization resolved against a concrete dataset
#[derive(Debug, Clone)]
pub(crate) enum InitPlan {
    Method(InitMethod),
    Fixed(Centroids),
}

/// Check user-supplied centroid arrays and encode them with the data's encoder
pub(crate) fn validate_manual<T>(
    arrays: &[InitArray<T>],
    n_clusters: usize,
    n_numeric: usize,
    encoder: &CategoricalEncoder<T>,
) -> Result<Centroids>
where
    T: Clone + Eq + Hash,
{
    let (numeric, categorical) = match arrays {
        [InitArray::Numeric(numeric), InitArray::Categorical(categorical)] => {
            (numeric, categorical)
        }
        [_, _] => {
            return Err(Error::invalid_parameter(
                "initial centroids must be given in [numeric, categorical] order",
            ))
        }
        _ => {
            return Err(Error::invalid_parameter(format!(
                "expected exactly 2 initial centroid arrays, got {}",
                arrays.len()
            )))
        }
    };

    if numeric.dim() != (n_clusters, n_numeric) {
        return Err(Error::invalid_parameter(format!(
            "wrong shape of numeric initial centroids: expected ({}, {}), got {:?}",
            n_clusters,
            n_numeric,
            numeric.dim()
        )));
    }
    let n_categorical = encoder.n_attributes();
    if categorical.dim() != (n_clusters, n_categorical) {
        return Err(Error::invalid_parameter(format!(
            "wrong shape of categorical initial centroids: expected ({}, {}), got {:?}",
            n_clusters,
            n_categorical,
            categorical.dim()
        )));
    }
    if numeric.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_data(
            "initial centroids contain NaN or infinite values",
        ));
    }

    Ok(Centroids {
        numeric: numeric.clone(),
        categorical: encoder.transform(categorical.view()),
    })
}

/// Check user-supplied modes for purely categorical data: exactly one
/// `Categorical` array
pub(crate) fn validate_manual_modes<T>(
    arrays: &[InitArray<T>],
    n_clusters: usize,
    encoder: &CategoricalEncoder<T>,
) -> Result<Centroids>
where
    T: Clone + Eq + Hash,
{
    let modes = match arrays {
        [InitArray::Categorical(modes)] => modes,
        _ => {
            return Err(Error::invalid_parameter(
                "k-modes expects exactly one categorical initial centroid array",
            ))
        }
    };
    if modes.dim() != (n_clusters, encoder.n_attributes()) {
        return Err(Error::invalid_parameter(format!(
            "wrong shape of initial modes: expected ({}, {}), got {:?}",
            n_clusters,
            encoder.n_attributes(),
            modes.dim()
        )));
    }

    Ok(Centroids {
        numeric: Array2::zeros((n_clusters, 0)),
        categorical: encoder.transform(modes.view()),
    })
}

/// Produce `n_clusters` initial centroids with a named policy
pub(crate) fn initialize_centroids<R: Rng>(
    data: &EncodedData,
    n_clusters: usize,
    method: InitMethod,
    dissim: &MixedDissimilarity,
    rng: &mut R,
) -> Result<Centroids> {
    if n_clusters == 0 {
        return Err(Error::invalid_parameter("Number of clusters must be > 0"));
    }
    if n_clusters > data.n_samples() {
        return Err(Error::invalid_parameter(
            "Number of clusters cannot exceed number of data points",
        ));
    }

    match method {
        InitMethod::Random => random_init(data, n_clusters, rng),
        InitMethod::Huang => huang_init(data, n_clusters, rng),
        InitMethod::Cao => cao_init(data, n_clusters, dissim),
    }
}

/// Random initialization: jittered numeric means and categories drawn
/// independently from each attribute's weighted marginal distribution
fn random_init<R: Rng>(data: &EncodedData, n_clusters: usize, rng: &mut R) -> Result<Centroids> {
    let numeric = jittered_means(data, n_clusters, rng);
    let categorical = sample_marginals(data, n_clusters, rng)?;
    Ok(Centroids {
        numeric,
        categorical,
    })
}

/// Huang initialization: marginal draws snapped to the closest observed
/// category combinations, distinct ones where possible
fn huang_init<R: Rng>(data: &EncodedData, n_clusters: usize, rng: &mut R) -> Result<Centroids> {
    let numeric = jittered_means(data, n_clusters, rng);
    let mut categorical = sample_marginals(data, n_clusters, rng)?;

    let candidates = weighted_rows(data);
    for cluster in 0..n_clusters {
        let drawn = categorical.row(cluster).to_owned();
        let mut ranked: Vec<(usize, usize)> = candidates
            .iter()
            .map(|&row| (mismatch_count(data.categorical.row(row), drawn.view()), row))
            .collect();
        ranked.sort_unstable();

        let taken = |row: usize| {
            (0..cluster).any(|other| categorical.row(other) == data.categorical.row(row))
        };
        let chosen = ranked
            .iter()
            .map(|&(_, row)| row)
            .find(|&row| !taken(row))
            .or_else(|| ranked.first().map(|&(_, row)| row));

        if let Some(row) = chosen {
            categorical.row_mut(cluster).assign(&data.categorical.row(row));
        }
    }

    Ok(Centroids {
        numeric,
        categorical,
    })
}

/// Cao initialization: pick observed samples that are both dense (frequent
/// categories) and far from the centroids chosen so far
fn cao_init(
    data: &EncodedData,
    n_clusters: usize,
    dissim: &MixedDissimilarity,
) -> Result<Centroids> {
    let candidates = weighted_rows(data);
    let density = categorical_density(data);

    let mut first = *candidates
        .first()
        .ok_or_else(|| Error::invalid_data("no samples with non-zero weight"))?;
    for &row in &candidates {
        if clearly_less(density[first], density[row]) {
            first = row;
        }
    }
    let mut chosen: Vec<usize> = Vec::with_capacity(n_clusters);
    chosen.push(first);

    // Smallest dissimilarity of each candidate to the chosen centroids
    let mut nearest = vec![f64::INFINITY; data.n_samples()];
    while chosen.len() < n_clusters {
        let last = chosen[chosen.len() - 1];
        let mut best: Option<(usize, f64)> = None;
        for &row in &candidates {
            let d = dissim.dissim(
                data.numeric.row(row),
                data.categorical.row(row),
                data.numeric.row(last),
                data.categorical.row(last),
                None,
            );
            nearest[row] = nearest[row].min(d);
            let score = density[row] * nearest[row];
            if best.map_or(true, |(_, top)| clearly_less(top, score)) {
                best = Some((row, score));
            }
        }
        chosen.push(best.map_or(first, |(row, _)| row));
    }

    Ok(Centroids {
        numeric: Array2::from_shape_fn((n_clusters, data.n_numeric()), |(c, j)| {
            data.numeric[[chosen[c], j]]
        }),
        categorical: Array2::from_shape_fn((n_clusters, data.n_categorical()), |(c, j)| {
            data.categorical[[chosen[c], j]]
        }),
    })
}

/// Replace the centroid of `cluster` with a random weighted sample, preferring
/// samples that no current centroid sits on
pub(crate) fn redraw_centroid<R: Rng>(
    data: &EncodedData,
    centroids: &mut Centroids,
    cluster: usize,
    rng: &mut R,
) {
    let candidates = weighted_rows(data);
    let fresh: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&row| (0..centroids.n_clusters()).all(|c| !centroids.equals_row(c, data, row)))
        .collect();
    let pool = if fresh.is_empty() { &candidates } else { &fresh };

    if let Some(&row) = pool.choose(rng) {
        centroids
            .numeric
            .row_mut(cluster)
            .assign(&data.numeric.row(row));
        centroids
            .categorical
            .row_mut(cluster)
            .assign(&data.categorical.row(row));
    }
}

/// Weighted attribute means plus standard-normal noise scaled by the
/// attribute's standard deviation
fn jittered_means<R: Rng>(data: &EncodedData, n_clusters: usize, rng: &mut R) -> Array2<f64> {
    let (means, stds) = weighted_column_stats(data.numeric.view(), data.weights.view());
    Array2::from_shape_fn((n_clusters, data.n_numeric()), |(_, j)| {
        let noise: f64 = rng.sample(StandardNormal);
        means[j] + noise * stds[j]
    })
}

/// Draw every (cluster, attribute) category independently, with probability
/// proportional to the weight of the rows carrying it
fn sample_marginals<R: Rng>(
    data: &EncodedData,
    n_clusters: usize,
    rng: &mut R,
) -> Result<Array2<usize>> {
    let rows = WeightedIndex::new(data.weights.iter())
        .map_err(|e| Error::invalid_data(format!("cannot sample from sample weights: {e}")))?;
    Ok(Array2::from_shape_fn(
        (n_clusters, data.n_categorical()),
        |(_, attr)| data.categorical[[rows.sample(rng), attr]],
    ))
}

/// Per-row density: mean relative (weighted) frequency of the row's categories
fn categorical_density(data: &EncodedData) -> Vec<f64> {
    let n_attrs = data.n_categorical();
    let total: f64 = data.weights.sum();
    let mut density = vec![0.0; data.n_samples()];
    if n_attrs == 0 || total <= 0.0 {
        return density;
    }

    for (attr, &levels) in data.n_levels.iter().enumerate() {
        let mut freq = vec![0.0; levels];
        for (row, &code) in data.categorical.column(attr).iter().enumerate() {
            freq[code] += data.weights[row];
        }
        for (row, &code) in data.categorical.column(attr).iter().enumerate() {
            density[row] += freq[code] / total / n_attrs as f64;
        }
    }
    density
}

fn weighted_rows(data: &EncodedData) -> Vec<usize> {
    data.weights
        .iter()
        .enumerate()
        .filter(|(_, &w)| w > 0.0)
        .map(|(row, _)| row)
        .collect()
}

fn mismatch_count(a: ArrayView1<usize>, b: ArrayView1<usize>) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}
