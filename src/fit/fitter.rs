//! Low-level fitting routines for a single candidate.
//!
//! Given:
//! - coordinates `c_i` and observed values `y_i` (mean or median per coordinate)
//! - a list of terms whose exponents are fixed
//!
//! we solve one OLS problem for the constant and the term coefficients, then
//! score the resulting function by SMAPE and RSS against the same data.

use nalgebra::{DMatrix, DVector};

use crate::domain::Measurement;
use crate::error::{ModelingError, Result};
use crate::math::{mean, rss, smape, solve_least_squares};
use crate::models::{Hypothesis, MultiParameterTerm, PmnfFunction};

/// Training data for one fit: one row per coordinate.
#[derive(Debug, Clone)]
pub struct FitData {
    coordinates: Vec<Vec<f64>>,
    observed: Vec<f64>,
}

impl FitData {
    pub fn new(coordinates: Vec<Vec<f64>>, observed: Vec<f64>) -> Result<Self> {
        if coordinates.len() != observed.len() {
            return Err(ModelingError::invalid(format!(
                "{} coordinates for {} observed values",
                coordinates.len(),
                observed.len()
            )));
        }
        Ok(Self {
            coordinates,
            observed,
        })
    }

    /// One row per measurement, observed value = mean or median.
    pub fn from_measurements(measurements: &[Measurement], use_median: bool) -> Self {
        Self {
            coordinates: measurements
                .iter()
                .map(|m| m.coordinate().values().to_vec())
                .collect(),
            observed: measurements.iter().map(|m| m.value(use_median)).collect(),
        }
    }

    /// Single-parameter data from `(x, y)` pairs.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self {
            coordinates: points.iter().map(|&(x, _)| vec![x]).collect(),
            observed: points.iter().map(|&(_, y)| y).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    pub fn coordinates(&self) -> &[Vec<f64>] {
        &self.coordinates
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }
}

/// Score a function against the data: `(smape, rss)`.
pub fn score(function: &PmnfFunction, data: &FitData) -> (f64, f64) {
    let predicted: Vec<f64> = data
        .coordinates
        .iter()
        .map(|c| function.evaluate(c))
        .collect();
    (smape(&predicted, &data.observed), rss(&predicted, &data.observed))
}

/// The trivial baseline: predict the mean of the observed values.
pub fn constant_hypothesis(data: &FitData) -> Hypothesis {
    let c = if data.is_empty() { 0.0 } else { mean(&data.observed) };
    let function = PmnfFunction::constant(c);
    let (s, r) = score(&function, data);
    Hypothesis::new(function, s, r)
}

/// Fit the constant and the coefficients of `terms` (their current
/// coefficients are ignored) and score the result.
///
/// Fails with `FitDegenerate` when the basis is singular, ill-conditioned, or
/// not finite at some coordinate.
pub fn fit_terms(
    terms: &[MultiParameterTerm],
    data: &FitData,
    max_condition: f64,
) -> Result<Hypothesis> {
    let n = data.len();
    let p = terms.len() + 1;

    let mut x = DMatrix::<f64>::zeros(n, p);
    for (i, c) in data.coordinates.iter().enumerate() {
        x[(i, 0)] = 1.0;
        for (j, term) in terms.iter().enumerate() {
            x[(i, j + 1)] = term.basis(c);
        }
    }
    let y = DVector::from_column_slice(&data.observed);

    let beta = solve_least_squares(&x, &y, max_condition)?;
    let function = PmnfFunction::new(
        beta[0],
        terms
            .iter()
            .enumerate()
            .map(|(j, t)| t.with_coefficient(beta[j + 1]))
            .collect(),
    );

    let (s, r) = score(&function, data);
    if !(s.is_finite() && r.is_finite()) {
        return Err(ModelingError::degenerate("non-finite fit scores"));
    }
    Ok(Hypothesis::new(function, s, r))
}

/// Relative contribution of each term:
/// `max_c |term(c)| / (|constant| + Σ_j |term_j(c)|)`.
///
/// Coordinates where the total magnitude is zero contribute nothing.
pub fn term_contributions(function: &PmnfFunction, data: &FitData) -> Vec<f64> {
    let mut out = vec![0.0_f64; function.terms.len()];
    for c in &data.coordinates {
        let values: Vec<f64> = function.terms.iter().map(|t| t.evaluate(c).abs()).collect();
        let total = function.constant.abs() + values.iter().sum::<f64>();
        if !(total > 0.0 && total.is_finite()) {
            continue;
        }
        for (slot, v) in out.iter_mut().zip(&values) {
            *slot = slot.max(v / total);
        }
    }
    out
}

/// Drop terms contributing less than `epsilon` and refit until every
/// remaining term clears the threshold.
///
/// Returns the pruned hypothesis and the number of terms removed. Pruning
/// every term yields the constant hypothesis.
pub fn prune(
    mut hypothesis: Hypothesis,
    data: &FitData,
    epsilon: f64,
    max_condition: f64,
) -> Result<(Hypothesis, usize)> {
    let mut removed = 0;
    loop {
        let contributions = term_contributions(&hypothesis.function, data);
        let keep: Vec<MultiParameterTerm> = hypothesis
            .function
            .terms
            .iter()
            .zip(&contributions)
            .filter(|(_, c)| **c >= epsilon)
            .map(|(t, _)| t.clone())
            .collect();

        if keep.len() == hypothesis.function.terms.len() {
            return Ok((hypothesis, removed));
        }
        removed += hypothesis.function.terms.len() - keep.len();
        if keep.is_empty() {
            return Ok((constant_hypothesis(data), removed));
        }
        hypothesis = fit_terms(&keep, data, max_condition)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_MAX_CONDITION;
    use crate::models::{CompoundTerm, Fraction, SimpleTerm};

    fn term(params: &[(usize, (i64, i64), (i64, i64))]) -> MultiParameterTerm {
        MultiParameterTerm::new(
            0.0,
            params
                .iter()
                .map(|&(i, p, q)| {
                    (
                        i,
                        CompoundTerm::single(SimpleTerm::new(
                            Fraction::new(p.0, p.1),
                            Fraction::new(q.0, q.1),
                        )),
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn grid_data(f: impl Fn(f64, f64) -> f64) -> FitData {
        let mut coords = Vec::new();
        let mut obs = Vec::new();
        for x in [2.0, 4.0, 8.0, 16.0] {
            for y in [2.0, 4.0, 8.0, 16.0] {
                coords.push(vec![x, y]);
                obs.push(f(x, y));
            }
        }
        FitData::new(coords, obs).unwrap()
    }

    #[test]
    fn fit_recovers_exact_coefficients() {
        let data = grid_data(|x, y| 2.0 + 3.0 * x * y.log2());
        let t = term(&[(0, (1, 1), (0, 1)), (1, (0, 1), (1, 1))]);
        let h = fit_terms(&[t], &data, DEFAULT_MAX_CONDITION).unwrap();
        assert!((h.function.constant - 2.0).abs() < 1e-9);
        assert!((h.function.terms[0].coefficient - 3.0).abs() < 1e-9);
        assert!(h.smape < 1e-9);
        assert!(h.rss < 1e-12);
    }

    #[test]
    fn fit_of_duplicate_terms_is_degenerate() {
        let data = grid_data(|x, _| x);
        let t = term(&[(0, (1, 1), (0, 1))]);
        let err = fit_terms(&[t.clone(), t], &data, DEFAULT_MAX_CONDITION).unwrap_err();
        assert!(matches!(err, ModelingError::FitDegenerate(_)));
    }

    #[test]
    fn log_of_one_everywhere_is_degenerate() {
        // log2(1) = 0 makes the column vanish.
        let data = FitData::new(
            vec![vec![1.0], vec![1.0], vec![1.0]],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        let t = term(&[(0, (0, 1), (1, 1))]);
        assert!(fit_terms(&[t], &data, DEFAULT_MAX_CONDITION).is_err());
    }

    #[test]
    fn constant_hypothesis_predicts_mean() {
        let data = FitData::from_points(&[(1.0, 1.0), (2.0, 2.0), (3.0, 6.0)]);
        let h = constant_hypothesis(&data);
        assert_eq!(h.function.constant, 3.0);
        assert_eq!(h.rss, 4.0 + 1.0 + 9.0);
    }

    #[test]
    fn prune_drops_negligible_terms() {
        // y = 1000 + x with a spurious tiny y-term.
        let data = grid_data(|x, y| 1000.0 + x + 1e-9 * y);
        let tx = term(&[(0, (1, 1), (0, 1))]);
        let ty = term(&[(1, (1, 1), (0, 1))]);
        let h = fit_terms(&[tx, ty], &data, DEFAULT_MAX_CONDITION).unwrap();
        let (pruned, removed) = prune(h, &data, 0.0005, DEFAULT_MAX_CONDITION).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(pruned.term_count(), 1);
        assert_eq!(pruned.function.terms[0].mask(), 0b01);
        for c in term_contributions(&pruned.function, &data) {
            assert!(c >= 0.0005);
        }
    }

    #[test]
    fn prune_to_nothing_collapses_to_constant() {
        let data = grid_data(|_, _| 5.0);
        let tx = term(&[(0, (1, 1), (0, 1))]);
        let h = fit_terms(&[tx], &data, DEFAULT_MAX_CONDITION).unwrap();
        let (pruned, removed) = prune(h, &data, 0.0005, DEFAULT_MAX_CONDITION).unwrap();
        assert_eq!(removed, 1);
        assert!(pruned.is_constant());
        assert_eq!(pruned.function.constant, 5.0);
    }
}
