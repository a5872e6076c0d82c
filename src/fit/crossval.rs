//! Cross-validation over held-out repetitions.
//!
//! The training score of a hypothesis says how well it fits the data it was
//! fitted on. To break near-ties between candidates we also want an
//! out-of-sample estimate, computed by refitting the same term structure on
//! part of the data and scoring it on the rest.
//!
//! Fold schemes:
//! - `LeaveOneRepetitionOut` (when any coordinate has two or more
//!   repetitions): fold `r` trains on the aggregate of all repetitions except
//!   `r` and tests against repetition `r`. Coordinates with one repetition
//!   always stay in training and are never tested.
//! - `LeaveOneCoordinateOut` (otherwise): fold `i` trains on every coordinate
//!   but `i` and tests on `i`.

use tracing::trace;

use crate::domain::Measurement;
use crate::fit::fitter::{FitData, fit_terms};
use crate::math::{aggregate, smape};
use crate::models::MultiParameterTerm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldScheme {
    LeaveOneRepetitionOut,
    LeaveOneCoordinateOut,
}

impl FoldScheme {
    pub fn for_measurements(measurements: &[Measurement]) -> Self {
        if measurements.iter().any(|m| m.repetitions() >= 2) {
            FoldScheme::LeaveOneRepetitionOut
        } else {
            FoldScheme::LeaveOneCoordinateOut
        }
    }
}

/// Aggregated out-of-sample error.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    pub scheme: FoldScheme,
    /// Folds that could be fitted and scored.
    pub folds: usize,
    /// Mean SMAPE (percent) across those folds.
    pub mean_smape: f64,
}

/// Cross-validate the term structure `terms` (coefficients are refitted per
/// fold). Returns `None` when no fold could be fitted.
pub fn cross_validate(
    terms: &[MultiParameterTerm],
    measurements: &[Measurement],
    use_median: bool,
    max_condition: f64,
) -> Option<CrossValidation> {
    let scheme = FoldScheme::for_measurements(measurements);
    let folds = match scheme {
        FoldScheme::LeaveOneRepetitionOut => repetition_folds(measurements, use_median),
        FoldScheme::LeaveOneCoordinateOut => coordinate_folds(measurements, use_median),
    };

    let mut scores = Vec::with_capacity(folds.len());
    for (train, test) in folds {
        let hypothesis = match fit_terms(terms, &train, max_condition) {
            Ok(h) => h,
            Err(e) => {
                trace!("skipping fold: {e}");
                continue;
            }
        };
        let predicted: Vec<f64> = test
            .coordinates()
            .iter()
            .map(|c| hypothesis.function.evaluate(c))
            .collect();
        let s = smape(&predicted, test.observed());
        if s.is_finite() {
            scores.push(s);
        }
    }

    if scores.is_empty() {
        return None;
    }
    Some(CrossValidation {
        scheme,
        folds: scores.len(),
        mean_smape: scores.iter().sum::<f64>() / scores.len() as f64,
    })
}

fn repetition_folds(measurements: &[Measurement], use_median: bool) -> Vec<(FitData, FitData)> {
    let max_reps = measurements.iter().map(Measurement::repetitions).max().unwrap_or(0);
    let mut folds = Vec::with_capacity(max_reps);

    for r in 0..max_reps {
        let mut train_c = Vec::new();
        let mut train_y = Vec::new();
        let mut test_c = Vec::new();
        let mut test_y = Vec::new();

        for m in measurements {
            let c = m.coordinate().values().to_vec();
            let values = m.values();
            if values.len() < 2 || r >= values.len() {
                train_y.push(m.value(use_median));
                train_c.push(c);
                continue;
            }
            let rest: Vec<f64> = values
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != r)
                .map(|(_, v)| *v)
                .collect();
            train_y.push(aggregate(&rest, use_median));
            train_c.push(c.clone());
            test_y.push(values[r]);
            test_c.push(c);
        }

        if test_y.is_empty() {
            continue;
        }
        if let (Ok(train), Ok(test)) = (FitData::new(train_c, train_y), FitData::new(test_c, test_y)) {
            folds.push((train, test));
        }
    }
    folds
}

fn coordinate_folds(measurements: &[Measurement], use_median: bool) -> Vec<(FitData, FitData)> {
    let all = FitData::from_measurements(measurements, use_median);
    let mut folds = Vec::with_capacity(all.len());
    for i in 0..all.len() {
        let mut train_c = Vec::with_capacity(all.len() - 1);
        let mut train_y = Vec::with_capacity(all.len() - 1);
        for (k, (c, y)) in all.coordinates().iter().zip(all.observed()).enumerate() {
            if k != i {
                train_c.push(c.clone());
                train_y.push(*y);
            }
        }
        let test = FitData::new(vec![all.coordinates()[i].clone()], vec![all.observed()[i]]);
        if let (Ok(train), Ok(test)) = (FitData::new(train_c, train_y), test) {
            folds.push((train, test));
        }
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, Region};
    use crate::math::DEFAULT_MAX_CONDITION;
    use crate::models::{CompoundTerm, Fraction, SimpleTerm};

    fn linear_term() -> MultiParameterTerm {
        MultiParameterTerm::new(
            0.0,
            vec![(0, CompoundTerm::single(SimpleTerm::new(Fraction::ONE, Fraction::ZERO)))],
        )
        .unwrap()
    }

    fn series(values: impl Fn(f64) -> Vec<f64>) -> Vec<Measurement> {
        [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
            .iter()
            .map(|&x| Measurement::new(vec![x], Region::new("r"), Metric::new("m"), values(x)).unwrap())
            .collect()
    }

    #[test]
    fn scheme_depends_on_repetitions() {
        assert_eq!(
            FoldScheme::for_measurements(&series(|x| vec![x])),
            FoldScheme::LeaveOneCoordinateOut
        );
        assert_eq!(
            FoldScheme::for_measurements(&series(|x| vec![x, x])),
            FoldScheme::LeaveOneRepetitionOut
        );
    }

    #[test]
    fn exact_data_cross_validates_to_zero() {
        let ms = series(|x| vec![10.0 + x, 10.0 + x, 10.0 + x]);
        let cv = cross_validate(&[linear_term()], &ms, false, DEFAULT_MAX_CONDITION).unwrap();
        assert_eq!(cv.scheme, FoldScheme::LeaveOneRepetitionOut);
        assert_eq!(cv.folds, 3);
        assert!(cv.mean_smape < 1e-9);
    }

    #[test]
    fn noisy_repetitions_give_positive_error() {
        let ms = series(|x| vec![10.0 + x, 11.0 + x, 9.5 + x]);
        let cv = cross_validate(&[linear_term()], &ms, false, DEFAULT_MAX_CONDITION).unwrap();
        assert!(cv.mean_smape > 0.0);
        // Deterministic.
        let again = cross_validate(&[linear_term()], &ms, false, DEFAULT_MAX_CONDITION).unwrap();
        assert_eq!(cv, again);
    }

    #[test]
    fn leave_one_coordinate_out_detects_overfit() {
        let ms = series(|x| vec![10.0 + x]);
        let cv = cross_validate(&[linear_term()], &ms, false, DEFAULT_MAX_CONDITION).unwrap();
        assert_eq!(cv.scheme, FoldScheme::LeaveOneCoordinateOut);
        assert_eq!(cv.folds, 6);
        assert!(cv.mean_smape < 1e-9);
    }

    #[test]
    fn unfittable_folds_yield_none() {
        // Two coordinates: every leave-one-out training set has one row for two coefficients.
        let ms: Vec<Measurement> = [1.0, 2.0]
            .iter()
            .map(|&x| Measurement::new(vec![x], Region::new("r"), Metric::new("m"), vec![x]).unwrap())
            .collect();
        assert!(cross_validate(&[linear_term()], &ms, false, DEFAULT_MAX_CONDITION).is_none());
    }
}
