//! Ordinary least squares solver.
//!
//! Every candidate hypothesis is linear in its coefficients once the exponents
//! are fixed, so fitting a candidate is one small least squares problem:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Columns are scaled to unit Euclidean norm before the decomposition. PMNF
//!   columns such as `x^3` at `x = 10^4` differ from the intercept by many
//!   orders of magnitude; without scaling the condition number says more about
//!   units than about collinearity.
//! - SVD is used for the solve (tall matrices, robust to near-singularity).
//! - The condition number `σ_max / σ_min` of the scaled matrix is checked
//!   against a caller-supplied threshold; beyond it the basis is degenerate.

use nalgebra::{DMatrix, DVector};

use crate::error::{ModelingError, Result};

/// Default threshold on the condition number of the column-scaled design.
pub const DEFAULT_MAX_CONDITION: f64 = 1e12;

/// Solve a least squares problem using SVD on the column-scaled design.
///
/// Fails with `FitDegenerate` when the system is underdetermined, contains
/// non-finite entries, has a zero column, or is too ill-conditioned.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    max_condition: f64,
) -> Result<DVector<f64>> {
    let (rows, cols) = x.shape();
    if cols == 0 {
        return Err(ModelingError::degenerate("design matrix has no columns"));
    }
    if rows < cols {
        return Err(ModelingError::degenerate(format!(
            "underdetermined system: {rows} rows for {cols} coefficients"
        )));
    }
    if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
        return Err(ModelingError::degenerate("non-finite value in design"));
    }

    let norms: Vec<f64> = x.column_iter().map(|c| c.norm()).collect();
    if norms.iter().any(|&n| n == 0.0 || !n.is_finite()) {
        return Err(ModelingError::degenerate("design matrix has a zero column"));
    }

    let mut scaled = x.clone();
    for (j, &n) in norms.iter().enumerate() {
        scaled.column_mut(j).unscale_mut(n);
    }

    let svd = scaled.svd(true, true);
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    if !(s_min > 0.0) || s_max / s_min > max_condition {
        return Err(ModelingError::degenerate(format!(
            "ill-conditioned basis (condition number {:.3e})",
            s_max / s_min
        )));
    }

    let beta_scaled = svd
        .solve(y, s_max * f64::EPSILON)
        .map_err(|e| ModelingError::degenerate(format!("SVD solve failed: {e}")))?;

    let beta = DVector::from_iterator(
        cols,
        beta_scaled.iter().zip(norms.iter()).map(|(b, n)| b / n),
    );
    if beta.iter().all(|v| v.is_finite()) {
        Ok(beta)
    } else {
        Err(ModelingError::degenerate("non-finite coefficients"))
    }
}
