//! Validation and statistics helpers shared by k-modes and k-prototypes

use crate::error::{Error, Result};
use crate::kprototypes::MixedValue;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::collections::HashSet;

/// Validate clustering parameters
pub fn validate_parameters(n_clusters: usize, max_iter: usize, n_init: usize) -> Result<()> {
    if n_clusters == 0 {
        return Err(Error::invalid_parameter("n_clusters must be > 0"));
    }

    if n_clusters > u16::MAX as usize {
        return Err(Error::invalid_parameter(format!(
            "n_clusters must be <= {}",
            u16::MAX
        )));
    }

    if max_iter == 0 {
        return Err(Error::invalid_parameter("max_iter must be > 0"));
    }

    if n_init == 0 {
        return Err(Error::invalid_parameter("n_init must be > 0"));
    }

    Ok(())
}

/// Validate input data shape
pub fn validate_data<T>(data: ArrayView2<T>) -> Result<()> {
    if data.nrows() == 0 {
        return Err(Error::invalid_data("Data cannot be empty"));
    }

    if data.ncols() == 0 {
        return Err(Error::invalid_data("Data must have at least one feature"));
    }

    Ok(())
}

/// Normalize the categorical column list and derive the numerical columns.
///
/// Both returned lists are sorted, so centroid attributes follow the
/// original column order.
pub fn split_column_indices(
    categorical: &[usize],
    n_columns: usize,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if categorical.is_empty() {
        return Err(Error::not_implemented(
            "no categorical columns given; k-prototypes needs at least one, use k-means instead",
        ));
    }

    let mut sorted = categorical.to_vec();
    sorted.sort_unstable();
    if let Some(&idx) = sorted.iter().find(|&&idx| idx >= n_columns) {
        return Err(Error::invalid_parameter(format!(
            "categorical column index {idx} is out of range for {n_columns} columns"
        )));
    }
    if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(Error::invalid_parameter("duplicate categorical column indices"));
    }
    if sorted.len() == n_columns {
        return Err(Error::invalid_parameter(
            "all columns are categorical, use k-modes instead",
        ));
    }

    let numerical = (0..n_columns)
        .filter(|idx| sorted.binary_search(idx).is_err())
        .collect();
    Ok((sorted, numerical))
}

/// Split mixed data into a numerical matrix and a categorical matrix.
///
/// A cell whose kind disagrees with its column's declared kind is a caller
/// error; a non-finite numerical value is a data error.
pub fn split_mixed<T: Clone>(
    data: ArrayView2<MixedValue<T>>,
    categorical: &[usize],
    numerical: &[usize],
) -> Result<(Array2<f64>, Array2<T>)> {
    let mut numeric = Array2::zeros((data.nrows(), numerical.len()));
    for (j, &col) in numerical.iter().enumerate() {
        for (row, value) in data.column(col).iter().enumerate() {
            match value {
                MixedValue::Numerical(v) if v.is_finite() => numeric[[row, j]] = *v,
                MixedValue::Numerical(_) => {
                    return Err(Error::invalid_data(format!(
                        "numerical column {col} contains NaN or infinite values (row {row})"
                    )))
                }
                MixedValue::Categorical(_) => {
                    return Err(Error::invalid_parameter(format!(
                        "column {col} is numerical but row {row} holds a categorical value"
                    )))
                }
            }
        }
    }

    let mut cells = Vec::with_capacity(data.nrows() * categorical.len());
    for row in data.rows() {
        for &col in categorical {
            match &row[col] {
                MixedValue::Categorical(v) => cells.push(v.clone()),
                MixedValue::Numerical(_) => {
                    return Err(Error::invalid_parameter(format!(
                        "column {col} is declared categorical but holds a numerical value"
                    )))
                }
            }
        }
    }
    let categorical = Array2::from_shape_vec((data.nrows(), categorical.len()), cells)
        .map_err(|e| Error::invalid_data(e.to_string()))?;

    Ok((numeric, categorical))
}

/// Validate optional sample weights, returning one weight per sample
pub fn validate_sample_weight(
    sample_weight: Option<&[f64]>,
    n_samples: usize,
    n_clusters: usize,
) -> Result<Array1<f64>> {
    let weights = match sample_weight {
        None => return Ok(Array1::ones(n_samples)),
        Some(weights) => weights,
    };

    if weights.len() != n_samples {
        return Err(Error::invalid_data(
            "sample_weight should be of equal size as samples",
        ));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(Error::invalid_data(
            "sample_weight elements should be finite numbers",
        ));
    }
    if weights.iter().any(|&w| w < 0.0) {
        return Err(Error::invalid_data(
            "sample_weight elements should be positive",
        ));
    }
    if weights.iter().filter(|&&w| w > 0.0).count() < n_clusters {
        return Err(Error::invalid_data(
            "number of non-zero sample_weight elements should be at least the number of clusters",
        ));
    }

    Ok(Array1::from(weights.to_vec()))
}

/// Number of distinct rows among samples with non-zero weight
pub fn count_distinct_rows(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<usize>,
    weights: ArrayView1<f64>,
) -> usize {
    let mut seen = HashSet::new();
    for (row, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        // Normalize -0.0 so it hashes like 0.0
        let bits: Vec<u64> = numeric
            .row(row)
            .iter()
            .map(|&v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
            .collect();
        seen.insert((bits, categorical.row(row).to_vec()));
    }
    seen.len()
}

/// Weighted mean and (population) standard deviation of every column.
/// Columns without weight get a mean and deviation of zero.
pub fn weighted_column_stats(
    data: ArrayView2<f64>,
    weights: ArrayView1<f64>,
) -> (Array1<f64>, Array1<f64>) {
    let total = weights.sum();
    if total <= 0.0 {
        return (Array1::zeros(data.ncols()), Array1::zeros(data.ncols()));
    }

    let means = data.t().dot(&weights) / total;
    let stds = Array1::from_iter(data.axis_iter(Axis(1)).zip(means.iter()).map(
        |(column, &mean)| {
            let var = column
                .iter()
                .zip(weights.iter())
                .map(|(&x, &w)| w * (x - mean).powi(2))
                .sum::<f64>()
                / total;
            var.sqrt()
        },
    ));
    (means, stds)
}

/// Default categorical weight: half the mean per-attribute standard deviation
/// of the numerical data
pub fn auto_gamma(numeric: ArrayView2<f64>) -> f64 {
    if numeric.ncols() == 0 || numeric.nrows() == 0 {
        return 1.0;
    }
    let weights = Array1::ones(numeric.nrows());
    let (_, stds) = weighted_column_stats(numeric, weights.view());
    0.5 * stds.mean().unwrap_or(0.0)
}

/// Number of samples carrying each label
pub fn cluster_sizes(labels: ArrayView1<u16>, n_clusters: usize) -> Vec<usize> {
    let mut sizes = vec![0; n_clusters];

    for &label in labels.iter() {
        if let Some(size) = sizes.get_mut(label as usize) {
            *size += 1;
        }
    }

    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_validate_parameters() {
        assert!(validate_parameters(2, 100, 10).is_ok());
        assert!(validate_parameters(0, 100, 10).is_err()); // n_clusters = 0
        assert!(validate_parameters(2, 0, 10).is_err()); // max_iter = 0
        assert!(validate_parameters(2, 100, 0).is_err()); // n_init = 0
        assert!(validate_parameters(70_000, 100, 1).is_err()); // labels are u16
    }

    #[test]
    fn test_validate_data() {
        let good_data = Array2::from_shape_vec((2, 2), vec!["A", "X", "B", "Y"]).unwrap();
        assert!(validate_data(good_data.view()).is_ok());

        let empty_data = Array2::from_shape_vec((0, 2), Vec::<&str>::new()).unwrap();
        assert!(validate_data(empty_data.view()).is_err());
    }

    #[test]
    fn test_split_column_indices() {
        let (cat, num) = split_column_indices(&[2, 1], 3).unwrap();
        assert_eq!(cat, vec![1, 2]);
        assert_eq!(num, vec![0]);

        assert!(matches!(
            split_column_indices(&[], 3),
            Err(Error::NotImplemented { .. })
        ));
        assert!(matches!(
            split_column_indices(&[1, 3], 3),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            split_column_indices(&[0, 1, 2], 3),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            split_column_indices(&[1, 1], 3),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_split_mixed() {
        let data = arr2(&[
            [MixedValue::Numerical(1.5), MixedValue::Categorical("a")],
            [MixedValue::Numerical(2.5), MixedValue::Categorical("b")],
        ]);
        let (numeric, categorical) = split_mixed(data.view(), &[1], &[0]).unwrap();
        assert_eq!(numeric, arr2(&[[1.5], [2.5]]));
        assert_eq!(categorical, arr2(&[["a"], ["b"]]));

        assert!(matches!(
            split_mixed(data.view(), &[0], &[1]),
            Err(Error::InvalidParameter { .. })
        ));

        let nan = arr2(&[[MixedValue::Numerical(f64::NAN), MixedValue::Categorical("a")]]);
        assert!(matches!(
            split_mixed(nan.view(), &[1], &[0]),
            Err(Error::InvalidData { .. })
        ));
    }

    #[test]
    fn test_validate_sample_weight_messages() {
        let short = validate_sample_weight(Some(&[1.0; 3]), 4, 2).unwrap_err();
        let negative = validate_sample_weight(Some(&[-1.0, 1.0, 1.0, 1.0]), 4, 2).unwrap_err();
        let nan = validate_sample_weight(Some(&[f64::NAN, 1.0, 1.0, 1.0]), 4, 2).unwrap_err();
        let sparse = validate_sample_weight(Some(&[1.0, 0.0, 0.0, 0.0]), 4, 2).unwrap_err();

        let messages: HashSet<String> = [&short, &negative, &nan, &sparse]
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(messages.len(), 4);
        assert!([short, negative, nan, sparse].iter().all(Error::is_value_error));

        let ok = validate_sample_weight(Some(&[1.0, 0.0, 2.0, 0.0]), 4, 2).unwrap();
        assert_eq!(ok, arr1(&[1.0, 0.0, 2.0, 0.0]));
        assert_eq!(validate_sample_weight(None, 3, 2).unwrap(), arr1(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_count_distinct_rows() {
        let numeric = arr2(&[[0.0], [-0.0], [1.0], [1.0]]);
        let categorical = arr2(&[[0], [0], [0], [1]]);
        let weights = arr1(&[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(
            count_distinct_rows(numeric.view(), categorical.view(), weights.view()),
            2
        );
    }

    #[test]
    fn test_weighted_column_stats() {
        let data = arr2(&[[1.0, 10.0], [3.0, 10.0], [100.0, -5.0]]);
        let weights = arr1(&[1.0, 1.0, 0.0]);
        let (means, stds) = weighted_column_stats(data.view(), weights.view());
        assert_eq!(means, arr1(&[2.0, 10.0]));
        assert_eq!(stds, arr1(&[1.0, 0.0]));
    }

    #[test]
    fn test_auto_gamma() {
        let data = arr2(&[[1.0, 0.0], [3.0, 4.0]]);
        // stds are 1 and 2
        assert!((auto_gamma(data.view()) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_cluster_sizes() {
        let labels = arr1(&[0u16, 1, 0, 1, 2, 7]);
        let sizes = cluster_sizes(labels.view(), 3);

        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
