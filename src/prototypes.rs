//! Incremental per-cluster aggregates
//!
//! The store keeps, for every cluster, weighted numeric sums and weighted
//! category frequency tables, together with the prototype derived from them
//! (numeric means and categorical modes). Moving a sample touches only the two
//! clusters involved, so reading a prototype never requires a rescan of the
//! data.

use crate::distance::TIE_TOLERANCE;
use crate::encoding::EncodedData;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Mutable aggregate state for `k` clusters
#[derive(Debug, Clone)]
pub struct PrototypeStore {
    numeric_sums: Array2<f64>,
    weight_sums: Vec<f64>,
    weighted_members: Vec<usize>,
    /// One `k × n_levels` table per categorical attribute
    frequencies: Vec<Array2<f64>>,
    means: Array2<f64>,
    modes: Array2<usize>,
    mode_freqs: Array2<f64>,
}

impl PrototypeStore {
    /// Create an empty store for `n_clusters` clusters
    pub fn new(n_clusters: usize, n_numeric: usize, n_levels: &[usize]) -> Self {
        Self {
            numeric_sums: Array2::zeros((n_clusters, n_numeric)),
            weight_sums: vec![0.0; n_clusters],
            weighted_members: vec![0; n_clusters],
            frequencies: n_levels
                .iter()
                .map(|&levels| Array2::zeros((n_clusters, levels)))
                .collect(),
            means: Array2::zeros((n_clusters, n_numeric)),
            modes: Array2::zeros((n_clusters, n_levels.len())),
            mode_freqs: Array2::zeros((n_clusters, n_levels.len())),
        }
    }

    /// Build a store from a complete partition of `data`
    pub(crate) fn from_partition(data: &EncodedData, labels: &[usize], n_clusters: usize) -> Self {
        let mut store = Self::new(n_clusters, data.n_numeric(), &data.n_levels);
        for (row, &cluster) in labels.iter().enumerate() {
            store.add(
                cluster,
                data.numeric.row(row),
                data.categorical.row(row),
                data.weights[row],
            );
        }
        store
    }

    /// Number of clusters tracked
    pub fn n_clusters(&self) -> usize {
        self.weight_sums.len()
    }

    /// Add a sample with the given weight to `cluster`
    pub fn add(
        &mut self,
        cluster: usize,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<usize>,
        weight: f64,
    ) {
        let mut sums = self.numeric_sums.row_mut(cluster);
        sums.scaled_add(weight, &numeric);
        self.weight_sums[cluster] += weight;
        if weight > 0.0 {
            self.weighted_members[cluster] += 1;
        }

        let tol = self.tie_tolerance(cluster);
        for (attr, &code) in categorical.iter().enumerate() {
            let table = &mut self.frequencies[attr];
            table[[cluster, code]] += weight;

            // The mode is the most frequent code, lowest code on ties
            let mode = self.modes[[cluster, attr]];
            let gap = table[[cluster, code]] - table[[cluster, mode]];
            if gap > tol || (gap.abs() <= tol && code < mode) {
                self.modes[[cluster, attr]] = code;
            }
        }

        self.refresh(cluster);
    }

    /// Remove a sample previously added to `cluster` with the same weight
    pub fn remove(
        &mut self,
        cluster: usize,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<usize>,
        weight: f64,
    ) {
        debug_assert!(
            weight == 0.0 || self.weighted_members[cluster] > 0,
            "removing a weighted sample from cluster {cluster} without weighted members"
        );

        let mut sums = self.numeric_sums.row_mut(cluster);
        sums.scaled_add(-weight, &numeric);
        self.weight_sums[cluster] -= weight;
        if weight > 0.0 {
            self.weighted_members[cluster] -= 1;
        }
        if self.weighted_members[cluster] == 0 {
            // Drop accumulated rounding noise once nothing weighted is left
            self.weight_sums[cluster] = 0.0;
            self.numeric_sums.row_mut(cluster).fill(0.0);
        }

        let tol = self.tie_tolerance(cluster);
        for (attr, &code) in categorical.iter().enumerate() {
            let table = &mut self.frequencies[attr];
            table[[cluster, code]] -= weight;
            debug_assert!(table[[cluster, code]] > -1e-9 * weight.max(1.0));

            if self.modes[[cluster, attr]] == code {
                self.modes[[cluster, attr]] = argmax_lowest(table.row(cluster), tol);
            }
        }

        self.refresh(cluster);
    }

    /// Move a sample from one cluster to another
    pub fn move_sample(
        &mut self,
        from: usize,
        to: usize,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<usize>,
        weight: f64,
    ) {
        self.remove(from, numeric, categorical, weight);
        self.add(to, numeric, categorical, weight);
    }

    /// Current prototype of `cluster`: numeric means and categorical modes
    pub fn prototype(&self, cluster: usize) -> (ArrayView1<f64>, ArrayView1<usize>) {
        (self.means.row(cluster), self.modes.row(cluster))
    }

    /// Relative weighted frequency of each mode value inside `cluster`
    pub fn mode_freqs(&self, cluster: usize) -> ArrayView1<f64> {
        self.mode_freqs.row(cluster)
    }

    /// Numeric means of all clusters (`k × n_numeric`)
    pub fn means(&self) -> ArrayView2<f64> {
        self.means.view()
    }

    /// Categorical modes of all clusters (`k × n_categorical`)
    pub fn modes(&self) -> ArrayView2<usize> {
        self.modes.view()
    }

    /// Mode frequencies of all clusters (`k × n_categorical`)
    pub fn all_mode_freqs(&self) -> ArrayView2<f64> {
        self.mode_freqs.view()
    }

    /// Total weight assigned to `cluster`
    pub fn weight(&self, cluster: usize) -> f64 {
        self.weight_sums[cluster]
    }

    /// Number of members of `cluster` with non-zero weight
    pub fn weighted_members(&self, cluster: usize) -> usize {
        self.weighted_members[cluster]
    }

    /// Whether removing a sample of `weight` would leave `cluster` without
    /// weighted members
    pub fn would_empty(&self, cluster: usize, weight: f64) -> bool {
        weight > 0.0 && self.weighted_members[cluster] <= 1
    }

    /// Clusters that currently have no member with non-zero weight
    pub fn empty_clusters(&self) -> Vec<usize> {
        (0..self.n_clusters())
            .filter(|&cluster| self.weighted_members[cluster] == 0)
            .collect()
    }

    /// Frequencies of one cluster closer than this are tied. Tables are sums
    /// of weights, so the slack scales with the cluster's total weight.
    fn tie_tolerance(&self, cluster: usize) -> f64 {
        TIE_TOLERANCE * self.weight_sums[cluster].abs()
    }

    fn refresh(&mut self, cluster: usize) {
        let total = self.weight_sums[cluster];
        if self.weighted_members[cluster] == 0 || total <= 0.0 {
            self.means.row_mut(cluster).fill(0.0);
            self.mode_freqs.row_mut(cluster).fill(0.0);
            return;
        }

        let sums = self.numeric_sums.row(cluster);
        self.means
            .row_mut(cluster)
            .zip_mut_with(&sums, |mean, &sum| *mean = sum / total);

        for (attr, table) in self.frequencies.iter().enumerate() {
            let mode = self.modes[[cluster, attr]];
            self.mode_freqs[[cluster, attr]] = table[[cluster, mode]] / total;
        }
    }
}

/// Index of the largest value, lowest index on ties within `tol`
fn argmax_lowest(values: ArrayView1<f64>, tol: f64) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate() {
        if value > values[best] + tol {
            best = idx;
        }
    }
    best
}
