//! Assignment/update loop and multi-restart selection
//!
//! A single run assigns every sample to its nearest initial centroid, builds
//! the [`PrototypeStore`] from that partition and then visits samples in row
//! order, moving a sample as soon as another cluster is strictly closer. The
//! store is updated on every move, so later samples in the same pass already
//! see the new prototypes.

use crate::distance::{clearly_less, MixedDissimilarity};
use crate::encoding::EncodedData;
use crate::error::{Error, Result};
use crate::initialization::{initialize_centroids, redraw_centroid, Centroids, InitPlan};
use crate::prototypes::PrototypeStore;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use rayon::prelude::*;

/// Number of initial partitions tried before a run gives up
pub const MAX_INIT_TRIES: usize = 10;

/// States of a single clustering run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopState {
    /// Drawing centroids and building the first partition
    Initializing,
    /// Running assignment passes
    Assigning,
    /// A pass moved no sample, or did not lower the cost and was rolled back
    Converged,
    /// The pass budget ran out; the last partition is kept
    MaxIterReached,
    /// No usable initial partition was found
    Failed,
}

/// Settings shared by every run of one fit
#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineConfig<'a> {
    pub n_clusters: usize,
    pub max_iter: usize,
    pub n_init: usize,
    pub random_state: Option<u64>,
    pub n_jobs: Option<usize>,
    pub verbose: u8,
    pub dissim: MixedDissimilarity<'a>,
}

/// Frozen result of one run
#[derive(Debug, Clone)]
pub(crate) struct RunOutcome {
    pub numeric_centroids: Array2<f64>,
    pub categorical_centroids: Array2<usize>,
    pub mode_freqs: Array2<f64>,
    pub labels: Vec<usize>,
    pub cost: f64,
    pub n_iter: usize,
    pub state: LoopState,
    pub epoch_costs: Vec<f64>,
}

/// Run the loop `n_init` times and keep the cheapest run.
///
/// Restart seeds are drawn up front from the master seed, so the outcome does
/// not depend on whether restarts run sequentially or on a worker pool.
pub(crate) fn run_restarts(
    data: &EncodedData,
    plan: &InitPlan,
    config: &EngineConfig,
) -> Result<RunOutcome> {
    let mut master = match config.random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let seeds: Vec<u64> = (0..config.n_init).map(|_| master.next_u64()).collect();

    let run = |(restart, seed): (usize, u64)| {
        let outcome = run_single(data, plan, config, seed);
        if config.verbose >= 1 {
            match &outcome {
                Ok(run) => tracing::info!(
                    restart,
                    cost = run.cost,
                    iterations = run.n_iter,
                    state = ?run.state,
                    "restart finished"
                ),
                Err(err) => tracing::info!(restart, error = %err, "restart failed"),
            }
        }
        outcome
    };

    let results: Vec<Result<RunOutcome>> = match worker_threads(config.n_jobs, config.n_init) {
        None => seeds.iter().copied().enumerate().map(run).collect(),
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::computation_error(format!("cannot start workers: {e}")))?;
            pool.install(|| seeds.par_iter().copied().enumerate().map(run).collect())
        }
    };

    select_best(results, config.verbose)
}

/// `None` means run sequentially; `Some(0)` lets rayon pick the thread count
fn worker_threads(n_jobs: Option<usize>, n_init: usize) -> Option<usize> {
    match n_jobs {
        _ if n_init <= 1 => None,
        None | Some(1) => None,
        Some(threads) => Some(threads),
    }
}

/// Lowest cost wins, ties go to the earliest restart. Failed restarts are
/// skipped; if all failed, the earliest error is returned.
fn select_best(results: Vec<Result<RunOutcome>>, verbose: u8) -> Result<RunOutcome> {
    let mut best: Option<(usize, RunOutcome)> = None;
    let mut first_error: Option<Error> = None;

    for (restart, result) in results.into_iter().enumerate() {
        match result {
            Ok(run) => {
                if best.as_ref().map_or(true, |(_, top)| run.cost < top.cost) {
                    best = Some((restart, run));
                }
            }
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match (best, first_error) {
        (Some((restart, run)), _) => {
            if verbose >= 1 {
                tracing::info!(restart, cost = run.cost, "selected best restart");
            }
            Ok(run)
        }
        (None, Some(err)) => Err(err),
        (None, None) => Err(Error::invalid_parameter("n_init must be > 0")),
    }
}

/// One complete run from initialization to convergence
pub(crate) fn run_single(
    data: &EncodedData,
    plan: &InitPlan,
    config: &EngineConfig,
    seed: u64,
) -> Result<RunOutcome> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dissim = &config.dissim;
    let n_clusters = config.n_clusters;

    if config.verbose >= 2 {
        tracing::debug!(state = ?LoopState::Initializing, seed, "run started");
    }
    let mut centroids = match plan {
        InitPlan::Method(method) => {
            initialize_centroids(data, n_clusters, *method, dissim, &mut rng)?
        }
        InitPlan::Fixed(centroids) => centroids.clone(),
    };

    let mut tries = 0;
    let (mut labels, mut store) = loop {
        tries += 1;
        let labels = assign_to_centroids(data, &centroids, dissim);
        let store = PrototypeStore::from_partition(data, &labels, n_clusters);

        let empty = store.empty_clusters();
        if empty.is_empty() {
            break (labels, store);
        }
        if tries >= MAX_INIT_TRIES {
            if config.verbose >= 2 {
                tracing::debug!(
                    state = ?LoopState::Failed,
                    tries,
                    "initialization exhausted its retries"
                );
            }
            return Err(Error::initialization_failure(
                "clustering algorithm could not initialize without empty clusters; \
                 consider assigning the initial clusters manually",
            ));
        }
        if config.verbose >= 2 {
            tracing::debug!(
                attempt = tries,
                ?empty,
                "empty clusters after initial assignment, redrawing"
            );
        }
        for cluster in empty {
            redraw_centroid(data, &mut centroids, cluster, &mut rng);
        }
    };

    let mut state = LoopState::Assigning;
    let mut cost = partition_cost(data, &labels, &store, dissim);
    let mut epoch_costs = vec![cost];
    let mut n_iter = 0;

    while state == LoopState::Assigning {
        if n_iter >= config.max_iter {
            state = LoopState::MaxIterReached;
            break;
        }
        n_iter += 1;

        let snapshot = (labels.clone(), store.clone());
        let moves = assignment_pass(data, &mut labels, &mut store, dissim);
        let new_cost = partition_cost(data, &labels, &store, dissim);
        epoch_costs.push(new_cost);
        if config.verbose >= 2 {
            tracing::debug!(iteration = n_iter, moves, cost = new_cost, "assignment pass");
        }

        if moves == 0 {
            state = LoopState::Converged;
            cost = new_cost;
        } else if clearly_less(new_cost, cost) {
            cost = new_cost;
        } else {
            // Moves that did not pay off signal a cycle; keep the cheaper partition
            (labels, store) = snapshot;
            state = LoopState::Converged;
        }
    }

    Ok(RunOutcome {
        numeric_centroids: store.means().to_owned(),
        categorical_centroids: store.modes().to_owned(),
        mode_freqs: store.all_mode_freqs().to_owned(),
        labels,
        cost,
        n_iter,
        state,
        epoch_costs,
    })
}

/// Initial pass: nearest centroid for every sample, lowest index on ties
fn assign_to_centroids(
    data: &EncodedData,
    centroids: &Centroids,
    dissim: &MixedDissimilarity,
) -> Vec<usize> {
    (0..data.n_samples())
        .map(|row| {
            nearest_cluster(
                dissim,
                data.numeric.row(row),
                data.categorical.row(row),
                centroids.numeric.view(),
                centroids.categorical.view(),
                None,
            )
            .0
        })
        .collect()
}

/// Visit samples in row order and move each one whose nearest prototype is
/// strictly closer than its own. Returns the number of moves.
fn assignment_pass(
    data: &EncodedData,
    labels: &mut [usize],
    store: &mut PrototypeStore,
    dissim: &MixedDissimilarity,
) -> usize {
    let mut moves = 0;
    for row in 0..data.n_samples() {
        let numeric = data.numeric.row(row);
        let categorical = data.categorical.row(row);
        let weight = data.weights[row];
        let current = labels[row];

        let (best, best_dissim) = nearest_cluster(
            dissim,
            numeric,
            categorical,
            store.means(),
            store.modes(),
            Some(store.all_mode_freqs()),
        );
        if best == current {
            continue;
        }

        let (means, modes) = store.prototype(current);
        let current_dissim = dissim.dissim(
            numeric,
            categorical,
            means,
            modes,
            Some(store.mode_freqs(current)),
        );
        // Never take the last weighted member out of a cluster
        if clearly_less(best_dissim, current_dissim) && !store.would_empty(current, weight) {
            store.move_sample(current, best, numeric, categorical, weight);
            labels[row] = best;
            moves += 1;
        }
    }
    moves
}

/// Weighted sum of dissimilarities of every sample to its cluster's prototype
pub(crate) fn partition_cost(
    data: &EncodedData,
    labels: &[usize],
    store: &PrototypeStore,
    dissim: &MixedDissimilarity,
) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(row, &cluster)| {
            let (means, modes) = store.prototype(cluster);
            data.weights[row]
                * dissim.dissim(
                    data.numeric.row(row),
                    data.categorical.row(row),
                    means,
                    modes,
                    Some(store.mode_freqs(cluster)),
                )
        })
        .sum()
}

/// Closest centroid and its dissimilarity; ties go to the lowest index
pub(crate) fn nearest_cluster(
    dissim: &MixedDissimilarity,
    numeric: ArrayView1<f64>,
    categorical: ArrayView1<usize>,
    centroid_numeric: ArrayView2<f64>,
    centroid_categorical: ArrayView2<usize>,
    mode_freqs: Option<ArrayView2<f64>>,
) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for cluster in 0..centroid_categorical.nrows() {
        let d = dissim.dissim(
            numeric,
            categorical,
            centroid_numeric.row(cluster),
            centroid_categorical.row(cluster),
            mode_freqs.as_ref().map(|freqs| freqs.row(cluster)),
        );
        if clearly_less(d, best.1) {
            best = (cluster, d);
        }
    }
    best
}
