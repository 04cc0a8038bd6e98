use ndarray::{Array1, Array2, Axis};

/// Per-column statistics computed for one standardization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    /// Column means.
    pub means: Array1<f64>,
    /// Population standard deviations, with constant columns reported as `1.0`.
    pub scales: Array1<f64>,
    /// Columns whose spread is indistinguishable from rounding noise.
    pub constant: Vec<bool>,
}

/// Standardizes each column to zero mean and unit population standard
/// deviation. Constant columns become all zeros. Statistics come from
/// `matrix` alone; nothing is retained between calls.
///
/// `matrix` must have at least one row.
#[must_use]
pub fn standardize(matrix: &Array2<f64>) -> (Array2<f64>, ColumnStats) {
    let rows = matrix.nrows().max(1) as f64;
    let means = matrix.sum_axis(Axis(0)) / rows;
    let centered = matrix - &means;
    let variances = centered.mapv(|value| value * value).sum_axis(Axis(0)) / rows;

    let constant: Vec<bool> = variances
        .iter()
        .zip(means.iter())
        .map(|(variance, mean)| variance.sqrt() <= noise_floor(*mean))
        .collect();
    let scales: Array1<f64> = variances
        .iter()
        .zip(&constant)
        .map(|(variance, is_constant)| if *is_constant { 1.0 } else { variance.sqrt() })
        .collect();

    let mut standardized = &centered / &scales;
    for (mut column, is_constant) in standardized.axis_iter_mut(Axis(1)).zip(&constant) {
        if *is_constant {
            column.fill(0.0);
        }
    }
    (
        standardized,
        ColumnStats {
            means,
            scales,
            constant,
        },
    )
}

fn noise_floor(mean: f64) -> f64 {
    10.0 * f64::EPSILON * mean.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn columns_get_zero_mean_unit_variance() {
        let matrix = array![[1.0, 10.0], [2.0, 20.0], [3.0, 60.0]];
        let (scaled, stats) = standardize(&matrix);
        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.sum() / 3.0;
            let variance = column.mapv(|v| (v - mean).powi(2)).sum() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((variance - 1.0).abs() < 1e-12);
        }
        assert!((stats.means[1] - 30.0).abs() < 1e-12);
        assert!((stats.scales[0] - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_columns_become_zero() {
        let matrix = array![[0.1, 1.0], [0.1, 2.0], [0.1, 4.0]];
        let (scaled, stats) = standardize(&matrix);
        assert_eq!(stats.constant, vec![true, false]);
        assert!(scaled.column(0).iter().all(|value| *value == 0.0));
        assert_eq!(stats.scales[0], 1.0);
    }
}
