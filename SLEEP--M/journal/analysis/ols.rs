use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Axis};

use super::AnalysisError;

/// Ordinary least-squares fit with an intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// One coefficient per design column.
    pub coefficients: Array1<f64>,
    /// Intercept term.
    pub intercept: f64,
}

/// Fits `target ≈ intercept + design · β`.
///
/// The intercept is handled by centring both sides, then β is the
/// minimum-norm least-squares solution of the centred system, computed from
/// an SVD. This stays defined when there are fewer rows than columns or when
/// columns are collinear. Singular values below `max(rows, cols) · σ_max · ε`
/// are treated as zero.
pub fn fit_least_squares(
    design: &Array2<f64>,
    target: &Array1<f64>,
) -> Result<LinearFit, AnalysisError> {
    let (rows, cols) = design.dim();
    if rows == 0 || rows != target.len() {
        return Err(AnalysisError::Numerical(format!(
            "design has {rows} rows but target has {}",
            target.len()
        )));
    }
    let scale = rows as f64;
    let design_means = design.sum_axis(Axis(0)) / scale;
    let target_mean = target.sum() / scale;
    let centred = design - &design_means;

    let a = DMatrix::from_fn(rows, cols, |row, col| centred[[row, col]]);
    let b = DVector::from_iterator(rows, target.iter().map(|value| value - target_mean));
    let svd = a.svd(true, true);
    let sigma_max = svd
        .singular_values
        .iter()
        .fold(0.0_f64, |acc, value| acc.max(*value));
    let eps = rows.max(cols) as f64 * sigma_max * f64::EPSILON;
    let beta = svd
        .solve(&b, eps)
        .map_err(|reason| AnalysisError::Numerical(reason.to_owned()))?;
    if beta.iter().any(|value| !value.is_finite()) {
        return Err(AnalysisError::Numerical(
            "least-squares solution is not finite".into(),
        ));
    }

    let coefficients: Array1<f64> = beta.iter().copied().collect();
    let intercept = target_mean - design_means.dot(&coefficients);
    Ok(LinearFit {
        coefficients,
        intercept,
    })
}
