//! K-prototypes clustering algorithm for mixed categorical and numerical data

use crate::distance::{
    CategoricalDissimilarity, MatchingDissimilarity, MixedDissimilarity, NumericDissimilarity,
    SquaredEuclidean,
};
use crate::encoding::{CategoricalEncoder, EncodedData};
use crate::engine::{nearest_cluster, partition_cost, run_restarts, EngineConfig, LoopState};
use crate::error::{Error, Result};
use crate::initialization::{validate_manual, Init, InitArray, InitMethod, InitPlan};
use crate::prototypes::PrototypeStore;
use crate::utils::{
    auto_gamma, count_distinct_rows, split_column_indices, split_mixed, validate_data,
    validate_parameters, validate_sample_weight,
};
use ndarray::{Array1, Array2, ArrayView2};
use std::hash::Hash;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Data type for mixed categorical and numerical features
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MixedValue<T> {
    /// Categorical value
    Categorical(T),
    /// Numerical value
    Numerical(f64),
}

/// K-prototypes clustering configuration
///
/// The dissimilarity between a sample and a prototype is
/// `num_dissim(numeric part) + gamma * cat_dissim(categorical part)`.
#[derive(Debug, Clone)]
pub struct KPrototypes<T> {
    /// Number of clusters
    pub n_clusters: usize,
    /// How the initial centroids are obtained
    pub init: Init<T>,
    /// Maximum number of assignment passes per run
    pub max_iter: usize,
    /// Number of restarts; forced to 1 for deterministic initializations
    pub n_init: usize,
    /// Weight of the categorical part; `None` derives it from the data
    pub gamma: Option<f64>,
    /// Random seed for reproducibility
    pub random_state: Option<u64>,
    /// Number of worker threads for restarts (`Some(0)` uses every core)
    pub n_jobs: Option<usize>,
    /// Logging level: 0 silent, 1 per restart, 2 per pass
    pub verbose: u8,
    /// Dissimilarity for the numerical attributes
    pub num_dissim: Arc<dyn NumericDissimilarity>,
    /// Dissimilarity for the categorical attributes
    pub cat_dissim: Arc<dyn CategoricalDissimilarity>,
}

impl<T> Default for KPrototypes<T> {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            init: Init::default(),
            max_iter: 100,
            n_init: 10,
            gamma: None,
            random_state: None,
            n_jobs: None,
            verbose: 0,
            num_dissim: Arc::new(SquaredEuclidean),
            cat_dissim: Arc::new(MatchingDissimilarity),
        }
    }
}

impl<T> KPrototypes<T> {
    /// Create a new k-prototypes clusterer
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    /// Set the initialization method
    pub fn init_method(mut self, method: InitMethod) -> Self {
        self.init = Init::Method(method);
        self
    }

    /// Start from explicit centroids, given as `[Numeric, Categorical]`
    pub fn init_centroids(mut self, arrays: Vec<InitArray<T>>) -> Self {
        self.init = Init::Manual(arrays);
        self
    }

    /// Set the maximum number of iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the number of initialization runs
    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the categorical weight explicitly
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Set the random seed for reproducibility
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set the number of parallel jobs
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Set the logging level
    pub fn verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the numerical dissimilarity
    pub fn num_dissim(mut self, dissim: impl NumericDissimilarity + 'static) -> Self {
        self.num_dissim = Arc::new(dissim);
        self
    }

    /// Set the categorical dissimilarity
    pub fn cat_dissim(mut self, dissim: impl CategoricalDissimilarity + 'static) -> Self {
        self.cat_dissim = Arc::new(dissim);
        self
    }

    fn dissimilarity(&self, gamma: f64) -> MixedDissimilarity<'_> {
        MixedDissimilarity {
            numeric: self.num_dissim.as_ref(),
            categorical: self.cat_dissim.as_ref(),
            gamma,
        }
    }
}

/// Validated and encoded training input
struct Prepared<T> {
    data: EncodedData,
    encoder: CategoricalEncoder<T>,
    categorical: Vec<usize>,
    numerical: Vec<usize>,
    n_columns: usize,
    gamma: f64,
}

impl<T> KPrototypes<T>
where
    T: Clone + Eq + Hash,
{
    /// Fit the model to `data`.
    ///
    /// `categorical` lists the indices of the categorical columns; every
    /// other column is numerical. `sample_weight` defaults to 1 per row.
    pub fn fit(
        &self,
        data: ArrayView2<MixedValue<T>>,
        categorical: &[usize],
        sample_weight: Option<&[f64]>,
    ) -> Result<KPrototypesModel<T>> {
        let prepared = self.prepare(data, categorical, sample_weight)?;

        let distinct = count_distinct_rows(
            prepared.data.numeric.view(),
            prepared.data.categorical.view(),
            prepared.data.weights.view(),
        );
        if distinct < self.n_clusters {
            return Err(Error::invalid_data(format!(
                "cannot find {} clusters in {} distinct weighted samples",
                self.n_clusters, distinct
            )));
        }

        let plan = match &self.init {
            Init::Method(method) => InitPlan::Method(*method),
            Init::Manual(arrays) => InitPlan::Fixed(validate_manual(
                arrays,
                self.n_clusters,
                prepared.numerical.len(),
                &prepared.encoder,
            )?),
        };

        let n_init = if self.init.is_deterministic() {
            1
        } else {
            self.n_init
        };
        if self.verbose >= 1 {
            tracing::info!(
                n_clusters = self.n_clusters,
                n_init,
                gamma = prepared.gamma,
                samples = prepared.data.n_samples(),
                "fitting k-prototypes"
            );
        }

        let config = EngineConfig {
            n_clusters: self.n_clusters,
            max_iter: self.max_iter,
            n_init,
            random_state: self.random_state,
            n_jobs: self.n_jobs,
            verbose: self.verbose,
            dissim: self.dissimilarity(prepared.gamma),
        };
        let run = run_restarts(&prepared.data, &plan, &config)?;

        let categorical_centroids =
            decode_modes(&prepared.encoder, run.categorical_centroids.view())?;
        Ok(KPrototypesModel {
            numeric_centroids: run.numeric_centroids,
            categorical_codes: run.categorical_centroids,
            categorical_centroids,
            mode_freqs: run.mode_freqs,
            labels: to_labels(&run.labels)?,
            cost: run.cost,
            n_iter: run.n_iter,
            state: run.state,
            epoch_costs: run.epoch_costs,
            gamma: prepared.gamma,
            categorical_indices: prepared.categorical,
            numerical_indices: prepared.numerical,
            n_columns: prepared.n_columns,
            encoder: prepared.encoder,
            num_dissim: Arc::clone(&self.num_dissim),
            cat_dissim: Arc::clone(&self.cat_dissim),
        })
    }

    /// Fit the model and return the cluster of every training sample
    pub fn fit_predict(
        &self,
        data: ArrayView2<MixedValue<T>>,
        categorical: &[usize],
        sample_weight: Option<&[f64]>,
    ) -> Result<Array1<u16>> {
        self.fit(data, categorical, sample_weight)?.predict(data)
    }

    /// Cost of an arbitrary labelling under this configuration.
    ///
    /// Prototypes are the weighted means and modes of the given partition.
    /// Useful to compare partitions produced with different dissimilarities
    /// on a common scale.
    pub fn cost_of_labels(
        &self,
        data: ArrayView2<MixedValue<T>>,
        categorical: &[usize],
        labels: &[usize],
        sample_weight: Option<&[f64]>,
    ) -> Result<f64> {
        let prepared = self.prepare(data, categorical, sample_weight)?;
        if labels.len() != prepared.data.n_samples() {
            return Err(Error::invalid_parameter(format!(
                "expected {} labels, got {}",
                prepared.data.n_samples(),
                labels.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&label| label >= self.n_clusters) {
            return Err(Error::invalid_parameter(format!(
                "label {label} is out of range for {} clusters",
                self.n_clusters
            )));
        }

        let store = PrototypeStore::from_partition(&prepared.data, labels, self.n_clusters);
        Ok(partition_cost(
            &prepared.data,
            labels,
            &store,
            &self.dissimilarity(prepared.gamma),
        ))
    }

    fn prepare(
        &self,
        data: ArrayView2<MixedValue<T>>,
        categorical: &[usize],
        sample_weight: Option<&[f64]>,
    ) -> Result<Prepared<T>> {
        validate_parameters(self.n_clusters, self.max_iter, self.n_init)?;
        validate_data(data)?;
        let (categorical, numerical) = split_column_indices(categorical, data.ncols())?;

        if let Some(gamma) = self.gamma {
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(Error::invalid_parameter(format!(
                    "gamma must be a finite number > 0, got {gamma}"
                )));
            }
        }
        if self.n_clusters > data.nrows() {
            return Err(Error::invalid_parameter(format!(
                "cannot have more clusters ({}) than samples ({})",
                self.n_clusters,
                data.nrows()
            )));
        }

        let weights = validate_sample_weight(sample_weight, data.nrows(), self.n_clusters)?;
        let (numeric, raw) = split_mixed(data, &categorical, &numerical)?;
        let (encoder, codes) = CategoricalEncoder::fit_transform(raw.view());
        let gamma = self.gamma.unwrap_or_else(|| auto_gamma(numeric.view()));

        Ok(Prepared {
            data: EncodedData {
                numeric,
                categorical: codes,
                weights,
                n_levels: encoder.n_levels(),
            },
            encoder,
            categorical,
            numerical,
            n_columns: data.ncols(),
            gamma,
        })
    }
}

/// Fitted k-prototypes model
#[derive(Debug, Clone)]
pub struct KPrototypesModel<T> {
    numeric_centroids: Array2<f64>,
    categorical_codes: Array2<usize>,
    categorical_centroids: Array2<T>,
    mode_freqs: Array2<f64>,
    labels: Array1<u16>,
    cost: f64,
    n_iter: usize,
    state: LoopState,
    epoch_costs: Vec<f64>,
    gamma: f64,
    categorical_indices: Vec<usize>,
    numerical_indices: Vec<usize>,
    n_columns: usize,
    encoder: CategoricalEncoder<T>,
    num_dissim: Arc<dyn NumericDissimilarity>,
    cat_dissim: Arc<dyn CategoricalDissimilarity>,
}

impl<T> KPrototypesModel<T>
where
    T: Clone + Eq + Hash,
{
    /// Centroids in the column order of the training data
    pub fn cluster_centroids(&self) -> Array2<MixedValue<T>> {
        Array2::from_shape_fn(
            (self.numeric_centroids.nrows(), self.n_columns),
            |(cluster, col)| match self.categorical_indices.binary_search(&col) {
                Ok(attr) => {
                    MixedValue::Categorical(self.categorical_centroids[[cluster, attr]].clone())
                }
                Err(_) => {
                    let attr = self.numerical_indices.binary_search(&col).unwrap_or_else(|pos| pos);
                    MixedValue::Numerical(self.numeric_centroids[[cluster, attr]])
                }
            },
        )
    }

    /// Numerical part of the centroids (`n_clusters × n_numerical`)
    pub fn numeric_centroids(&self) -> ArrayView2<f64> {
        self.numeric_centroids.view()
    }

    /// Categorical part of the centroids (`n_clusters × n_categorical`)
    pub fn categorical_centroids(&self) -> ArrayView2<T> {
        self.categorical_centroids.view()
    }

    /// Cluster of every training sample
    pub fn labels(&self) -> &Array1<u16> {
        &self.labels
    }

    /// Weighted cost of the selected run
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of assignment passes of the selected run
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the selected run converged before `max_iter`
    pub fn converged(&self) -> bool {
        self.state == LoopState::Converged
    }

    /// Final state of the selected run
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Cost after initialization followed by the cost after every pass
    pub fn epoch_costs(&self) -> &[f64] {
        &self.epoch_costs
    }

    /// Categorical weight used during fitting
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Indices of the categorical columns, sorted
    pub fn categorical_indices(&self) -> &[usize] {
        &self.categorical_indices
    }

    /// Assign each row of `data` to its closest centroid.
    ///
    /// `data` must have the training column layout. Categories not seen
    /// during fitting are accepted and never match a centroid.
    pub fn predict(&self, data: ArrayView2<MixedValue<T>>) -> Result<Array1<u16>> {
        self.predict_with_cost(data, None).map(|(labels, _)| labels)
    }

    /// Assign each row of `data` and return the weighted cost of that
    /// assignment
    pub fn predict_with_cost(
        &self,
        data: ArrayView2<MixedValue<T>>,
        sample_weight: Option<&[f64]>,
    ) -> Result<(Array1<u16>, f64)> {
        if data.ncols() != self.n_columns {
            return Err(Error::invalid_parameter(format!(
                "expected {} columns, got {}",
                self.n_columns,
                data.ncols()
            )));
        }
        validate_data(data)?;
        // Prediction never needs a minimum number of weighted rows
        let weights = validate_sample_weight(sample_weight, data.nrows(), 0)?;
        let (numeric, raw) = split_mixed(data, &self.categorical_indices, &self.numerical_indices)?;
        let codes = self.encoder.transform(raw.view());

        let dissim = MixedDissimilarity {
            numeric: self.num_dissim.as_ref(),
            categorical: self.cat_dissim.as_ref(),
            gamma: self.gamma,
        };
        let mut cost = 0.0;
        let mut labels = Vec::with_capacity(data.nrows());
        for row in 0..data.nrows() {
            let (cluster, d) = nearest_cluster(
                &dissim,
                numeric.row(row),
                codes.row(row),
                self.numeric_centroids.view(),
                self.categorical_codes.view(),
                Some(self.mode_freqs.view()),
            );
            cost += weights[row] * d;
            labels.push(cluster);
        }
        Ok((to_labels(&labels)?, cost))
    }

    /// Weighted cost of assigning `data` to the fitted centroids
    pub fn score(
        &self,
        data: ArrayView2<MixedValue<T>>,
        sample_weight: Option<&[f64]>,
    ) -> Result<f64> {
        self.predict_with_cost(data, sample_weight).map(|(_, cost)| cost)
    }
}

/// Map encoded modes back to the caller's category values
pub(crate) fn decode_modes<T: Clone + Eq + Hash>(
    encoder: &CategoricalEncoder<T>,
    codes: ArrayView2<usize>,
) -> Result<Array2<T>> {
    let mut values = Vec::with_capacity(codes.len());
    for ((_, attr), &code) in codes.indexed_iter() {
        let value = encoder.decode(attr, code).ok_or_else(|| {
            Error::computation_error(format!(
                "centroid code {code} of attribute {attr} has no category"
            ))
        })?;
        values.push(value.clone());
    }
    Array2::from_shape_vec(codes.dim(), values).map_err(|e| Error::computation_error(e.to_string()))
}

pub(crate) fn to_labels(labels: &[usize]) -> Result<Array1<u16>> {
    labels
        .iter()
        .map(|&label| {
            u16::try_from(label)
                .map_err(|_| Error::computation_error(format!("label {label} does not fit in u16")))
        })
        .collect()
}
