//! K-modes clustering algorithm implementation
//!
//! K-modes is k-prototypes without numerical attributes: the same engine runs
//! with an empty numeric block, so the cost is the plain categorical
//! dissimilarity to the cluster modes.

use crate::distance::{
    CategoricalDissimilarity, MatchingDissimilarity, MixedDissimilarity, SquaredEuclidean,
};
use crate::encoding::{CategoricalEncoder, EncodedData};
use crate::engine::{nearest_cluster, run_restarts, EngineConfig, LoopState};
use crate::error::{Error, Result};
use crate::initialization::{validate_manual_modes, Init, InitArray, InitMethod, InitPlan};
use crate::kprototypes::{decode_modes, to_labels};
use crate::utils::{count_distinct_rows, validate_data, validate_parameters, validate_sample_weight};
use ndarray::{Array1, Array2, ArrayView2};
use std::hash::Hash;
use std::sync::Arc;

/// K-modes clustering configuration for categorical data
#[derive(Debug, Clone)]
pub struct KModes<T> {
    /// Number of clusters
    pub n_clusters: usize,
    /// How the initial modes are obtained
    pub init: Init<T>,
    /// Maximum number of assignment passes per run
    pub max_iter: usize,
    /// Number of initialization runs
    pub n_init: usize,
    /// Random seed for reproducibility
    pub random_state: Option<u64>,
    /// Number of parallel jobs (`Some(0)` for all cores)
    pub n_jobs: Option<usize>,
    /// Logging level: 0 silent, 1 per restart, 2 per pass
    pub verbose: u8,
    /// Categorical dissimilarity
    pub cat_dissim: Arc<dyn CategoricalDissimilarity>,
}

impl<T> Default for KModes<T> {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            init: Init::default(),
            max_iter: 100,
            n_init: 10,
            random_state: None,
            n_jobs: None,
            verbose: 0,
            cat_dissim: Arc::new(MatchingDissimilarity),
        }
    }
}

impl<T> KModes<T> {
    /// Create a new k-modes clusterer with specified number of clusters
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

    /// Start from explicit modes (`n_clusters × n_attributes`)
    pub fn init_modes(mut self, modes: Array2<T>) -> Self {
        self.init = Init::Manual(vec![InitArray::Categorical(modes)]);
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

    /// Set the categorical dissimilarity
    pub fn cat_dissim(mut self, dissim: impl CategoricalDissimilarity + 'static) -> Self {
        self.cat_dissim = Arc::new(dissim);
        self
    }
}

impl<T> KModes<T>
where
    T: Clone + Eq + Hash,
{
    /// Fit the k-modes algorithm to the data
    pub fn fit(
        &self,
        data: ArrayView2<T>,
        sample_weight: Option<&[f64]>,
    ) -> Result<KModesModel<T>> {
        validate_parameters(self.n_clusters, self.max_iter, self.n_init)?;
        validate_data(data)?;
        if self.n_clusters > data.nrows() {
            return Err(Error::invalid_parameter(format!(
                "cannot have more clusters ({}) than samples ({})",
                self.n_clusters,
                data.nrows()
            )));
        }
        let weights = validate_sample_weight(sample_weight, data.nrows(), self.n_clusters)?;

        let (encoder, codes) = CategoricalEncoder::fit_transform(data);
        let encoded = EncodedData {
            numeric: Array2::zeros((data.nrows(), 0)),
            categorical: codes,
            weights,
            n_levels: encoder.n_levels(),
        };

        let distinct = count_distinct_rows(
            encoded.numeric.view(),
            encoded.categorical.view(),
            encoded.weights.view(),
        );
        if distinct < self.n_clusters {
            return Err(Error::invalid_data(format!(
                "cannot find {} clusters in {} distinct weighted samples",
                self.n_clusters, distinct
            )));
        }

        let plan = match &self.init {
            Init::Method(method) => InitPlan::Method(*method),
            Init::Manual(arrays) => {
                InitPlan::Fixed(validate_manual_modes(arrays, self.n_clusters, &encoder)?)
            }
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
                samples = encoded.n_samples(),
                "fitting k-modes"
            );
        }

        let config = EngineConfig {
            n_clusters: self.n_clusters,
            max_iter: self.max_iter,
            n_init,
            random_state: self.random_state,
            n_jobs: self.n_jobs,
            verbose: self.verbose,
            dissim: categorical_only(self.cat_dissim.as_ref()),
        };
        let run = run_restarts(&encoded, &plan, &config)?;

        Ok(KModesModel {
            centroids: decode_modes(&encoder, run.categorical_centroids.view())?,
            codes: run.categorical_centroids,
            mode_freqs: run.mode_freqs,
            labels: to_labels(&run.labels)?,
            cost: run.cost,
            n_iter: run.n_iter,
            state: run.state,
            epoch_costs: run.epoch_costs,
            encoder,
            cat_dissim: Arc::clone(&self.cat_dissim),
        })
    }

    /// Fit the model and predict cluster assignments
    pub fn fit_predict(
        &self,
        data: ArrayView2<T>,
        sample_weight: Option<&[f64]>,
    ) -> Result<Array1<u16>> {
        self.fit(data, sample_weight)?.predict(data)
    }
}

fn categorical_only(categorical: &dyn CategoricalDissimilarity) -> MixedDissimilarity<'_> {
    MixedDissimilarity {
        numeric: &SquaredEuclidean,
        categorical,
        gamma: 1.0,
    }
}

/// Fitted k-modes model
#[derive(Debug, Clone)]
pub struct KModesModel<T> {
    centroids: Array2<T>,
    codes: Array2<usize>,
    mode_freqs: Array2<f64>,
    labels: Array1<u16>,
    cost: f64,
    n_iter: usize,
    state: LoopState,
    epoch_costs: Vec<f64>,
    encoder: CategoricalEncoder<T>,
    cat_dissim: Arc<dyn CategoricalDissimilarity>,
}

impl<T> KModesModel<T>
where
    T: Clone + Eq + Hash,
{
    /// Cluster modes (`n_clusters × n_attributes`)
    pub fn cluster_centroids(&self) -> ArrayView2<T> {
        self.centroids.view()
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

    /// Assign each row of `data` to its closest mode
    pub fn predict(&self, data: ArrayView2<T>) -> Result<Array1<u16>> {
        self.predict_with_cost(data, None).map(|(labels, _)| labels)
    }

    /// Assign each row of `data` and return the weighted cost of that
    /// assignment
    pub fn predict_with_cost(
        &self,
        data: ArrayView2<T>,
        sample_weight: Option<&[f64]>,
    ) -> Result<(Array1<u16>, f64)> {
        if data.ncols() != self.encoder.n_attributes() {
            return Err(Error::invalid_parameter(format!(
                "expected {} columns, got {}",
                self.encoder.n_attributes(),
                data.ncols()
            )));
        }
        validate_data(data)?;
        let weights = validate_sample_weight(sample_weight, data.nrows(), 0)?;
        let codes = self.encoder.transform(data);
        let empty = Array2::zeros((data.nrows(), 0));
        let no_centroid_numerics = Array2::zeros((self.codes.nrows(), 0));

        let dissim = categorical_only(self.cat_dissim.as_ref());
        let mut cost = 0.0;
        let mut labels = Vec::with_capacity(data.nrows());
        for row in 0..data.nrows() {
            let (cluster, d) = nearest_cluster(
                &dissim,
                empty.row(row),
                codes.row(row),
                no_centroid_numerics.view(),
                self.codes.view(),
                Some(self.mode_freqs.view()),
            );
            cost += weights[row] * d;
            labels.push(cluster);
        }
        Ok((to_labels(&labels)?, cost))
    }

    /// Weighted cost of assigning `data` to the fitted modes
    pub fn score(&self, data: ArrayView2<T>, sample_weight: Option<&[f64]>) -> Result<f64> {
        self.predict_with_cost(data, sample_weight).map(|(_, cost)| cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::HammingDissimilarity;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_kmodes_creation() {
        let kmodes = KModes::<&str>::new(3);
        assert_eq!(kmodes.n_clusters, 3);
        assert_eq!(kmodes.init, Init::Method(InitMethod::Cao));
    }

    #[test]
    fn test_kmodes_builder_pattern() {
        let kmodes = KModes::<&str>::new(5)
            .init_method(InitMethod::Random)
            .max_iter(50)
            .n_init(5)
            .random_state(42)
            .verbose(2);

        assert_eq!(kmodes.n_clusters, 5);
        assert_eq!(kmodes.init, Init::Method(InitMethod::Random));
        assert_eq!(kmodes.max_iter, 50);
        assert_eq!(kmodes.n_init, 5);
        assert_eq!(kmodes.random_state, Some(42));
        assert_eq!(kmodes.verbose, 2);
    }

    #[test]
    fn test_kmodes_simple_clustering() {
        let data = Array2::from_shape_vec(
            (6, 2),
            vec!["A", "X", "A", "X", "B", "Y", "B", "Y", "A", "X", "B", "Y"],
        )
        .unwrap();

        let kmodes = KModes::new(2)
            .init_method(InitMethod::Huang)
            .random_state(42)
            .n_init(3)
            .max_iter(10);

        let model = kmodes.fit(data.view(), None).unwrap();

        let labels = model.labels();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[4]);
        assert_ne!(labels[0], labels[2]);
        assert_eq!(model.cluster_centroids().dim(), (2, 2));
        assert_eq!(model.cost(), 0.0);
        assert!(model.n_iter() <= 10);
    }

    #[test]
    fn test_kmodes_convergence() {
        let data = Array2::from_shape_vec((4, 1), vec!["A", "A", "B", "B"]).unwrap();

        let model = KModes::new(2).max_iter(100).fit(data.view(), None).unwrap();

        assert!(model.converged());
        assert_eq!(model.state(), LoopState::Converged);
        assert!(model.n_iter() < 100);
    }

    #[test]
    fn test_kmodes_fit_predict() {
        let data = Array2::from_shape_vec((4, 2), vec!["A", "X", "A", "X", "B", "Y", "B", "Y"])
            .unwrap();

        let kmodes = KModes::new(2).random_state(42);
        let labels = kmodes.fit_predict(data.view(), None).unwrap();

        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|&label| label < 2));
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
    }

    #[test]
    fn test_manual_modes() {
        let data = Array2::from_shape_vec((4, 2), vec!["A", "X", "A", "X", "B", "Y", "B", "Y"])
            .unwrap();

        let model = KModes::new(2)
            .init_modes(arr2(&[["B", "Y"], ["A", "X"]]))
            .fit(data.view(), None)
            .unwrap();
        assert_eq!(model.labels().to_vec(), vec![1, 1, 0, 0]);

        let wrong_shape = KModes::new(2).init_modes(arr2(&[["B"], ["A"]])).fit(data.view(), None);
        assert!(matches!(wrong_shape, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_predict_with_unknown_categories() {
        let data = Array2::from_shape_vec((4, 2), vec!["A", "X", "A", "X", "B", "Y", "B", "Y"])
            .unwrap();
        let model = KModes::new(2)
            .cat_dissim(HammingDissimilarity)
            .fit(data.view(), None)
            .unwrap();

        let fresh = Array2::from_shape_vec((2, 2), vec!["A", "Q", "Q", "Y"]).unwrap();
        let (labels, cost) = model.predict_with_cost(fresh.view(), None).unwrap();
        assert_eq!(labels[0], model.labels()[0]);
        assert_eq!(labels[1], model.labels()[2]);
        assert!((cost - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_parameters() {
        let data = Array2::from_shape_vec((2, 1), vec!["A", "B"]).unwrap();

        // Too many clusters
        let kmodes = KModes::new(3);
        assert!(matches!(
            kmodes.fit(data.view(), None),
            Err(Error::InvalidParameter { .. })
        ));

        // Zero clusters
        let kmodes = KModes::new(0);
        assert!(kmodes.fit(data.view(), None).is_err());
    }

    #[test]
    fn test_empty_data() {
        let data = Array2::from_shape_vec((0, 0), Vec::<&str>::new()).unwrap();
        let kmodes = KModes::new(1);
        assert!(matches!(
            kmodes.fit(data.view(), None),
            Err(Error::InvalidData { .. })
        ));
    }
}
