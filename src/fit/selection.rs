//! Hypothesis search and selection.
//!
//! Given a measurement set of dimension `D`, the selector:
//! 1. asks the candidate provider for each parameter's best single-parameter
//!    term (its building block)
//! 2. enumerates term shapes over the parameters that have one
//! 3. fits, prunes and (optionally) cross-validates every shape in parallel
//! 4. folds the results sequentially, in enumeration order, into the best
//!    hypothesis
//!
//! Comparison rules:
//! - primary score: SMAPE, or RSS with `compare_with_rss` (lower is better)
//! - scores within `tie_tolerance` (relative, floored at `1e-9`) are tied;
//!   a tie goes to fewer terms, then to lower cross-validated SMAPE, then to
//!   the candidate seen first
//!
//! The constant hypothesis is candidate 0, and the finalized result never
//! scores worse than it on the active score (SMAPE, or RSS with
//! `compare_with_rss`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Measurement, ModelerOptions, parameter_slice, validate_measurements};
use crate::error::{ModelingError, ModelingWarning, Result};
use crate::fit::combinator::enumerate_shapes;
use crate::fit::crossval::cross_validate;
use crate::fit::fitter::{FitData, constant_hypothesis, fit_terms, prune};
use crate::fit::single::{CandidateProvider, ExponentGridProvider};
use crate::models::{CompoundTerm, Hypothesis, Model, MultiParameterTerm};

/// Absolute floor of the near-tie window.
const TIE_FLOOR: f64 = 1e-9;

/// `|a - b| <= max(tol * max(|a|, |b|), 1e-9)`.
pub(crate) fn near_tie(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= (tol * a.abs().max(b.abs())).max(TIE_FLOOR)
}

/// Whether `candidate` should replace `incumbent`.
///
/// A tie that the term count and cross-validation cannot break keeps the
/// incumbent.
pub fn is_better(candidate: &Hypothesis, incumbent: &Hypothesis, options: &ModelerOptions) -> bool {
    let a = candidate.score(options.compare_with_rss);
    let b = incumbent.score(options.compare_with_rss);
    if !a.is_finite() {
        return false;
    }
    if !b.is_finite() {
        return true;
    }
    if !near_tie(a, b, options.tie_tolerance) {
        return a < b;
    }

    if candidate.term_count() != incumbent.term_count() {
        return candidate.term_count() < incumbent.term_count();
    }
    if options.use_crossvalidation {
        if let (Some(ca), Some(cb)) = (candidate.cv_smape, incumbent.cv_smape) {
            return ca < cb;
        }
    }
    false
}

/// Counters describing one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Candidates considered, the constant baseline included.
    pub candidates: usize,
    /// Candidates that were fitted (successfully or not).
    pub evaluated: usize,
    /// Candidates skipped because their basis was degenerate.
    pub degenerate: usize,
    /// Terms removed by pruning across all candidates.
    pub pruned_terms: usize,
    pub timed_out: bool,
    pub cancelled: bool,
}

/// Result of [`ModelSelector::select`].
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub hypothesis: Hypothesis,
    pub warnings: Vec<ModelingWarning>,
    pub stats: SelectionStats,
}

/// What happened to one candidate in the parallel phase.
enum Evaluation {
    Fitted { hypothesis: Hypothesis, pruned: usize },
    Degenerate,
    Skipped,
}

/// Multi-parameter model selector.
pub struct ModelSelector {
    options: ModelerOptions,
    provider: Box<dyn CandidateProvider>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ModelSelector {
    /// Selector with the default exponent-grid provider.
    pub fn new(options: ModelerOptions) -> Result<Self> {
        options.validate()?;
        let provider = ExponentGridProvider::from_options(&options);
        Ok(Self {
            options,
            provider: Box::new(provider),
            cancel: None,
        })
    }

    pub fn with_provider(mut self, provider: impl CandidateProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Raising the flag stops dispatching new candidates and discards results
    /// still in flight.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &ModelerOptions {
        &self.options
    }

    /// Search for the best hypothesis for one measurement series.
    #[instrument(skip_all, fields(points = measurements.len()))]
    pub fn select(&self, measurements: &[Measurement]) -> Result<SelectionOutcome> {
        let options = &self.options;
        let dims = validate_measurements(measurements)?;
        if dims > options.max_parameters {
            return Err(ModelingError::UnsupportedDimensionality {
                parameters: dims,
                max: options.max_parameters,
            });
        }

        let data = FitData::from_measurements(measurements, options.use_median);
        let mut baseline = constant_hypothesis(&data);
        if options.use_crossvalidation {
            baseline.cv_smape = cross_validate(
                &[],
                measurements,
                options.use_median,
                options.max_condition_number,
            )
            .map(|cv| cv.mean_smape);
        }
        let mut stats = SelectionStats {
            candidates: 1,
            ..SelectionStats::default()
        };

        if measurements.len() < options.min_measurement_points {
            let warning = ModelingWarning::InsufficientData {
                points: measurements.len(),
                required: options.min_measurement_points,
            };
            warn!("{warning}");
            return Ok(SelectionOutcome {
                hypothesis: baseline,
                warnings: vec![warning],
                stats,
            });
        }

        let blocks = self.building_blocks(measurements, dims);
        let shapes = enumerate_shapes(
            &blocks,
            options.max_terms,
            options.allow_combinations_of_sums_and_products,
        );
        let candidates = shapes
            .iter()
            .map(|s| s.instantiate(&blocks))
            .collect::<Result<Vec<_>>>()?;
        stats.candidates += candidates.len();
        info!(
            parameters = dims,
            active = blocks.iter().flatten().count(),
            candidates = candidates.len(),
            "searching hypotheses"
        );

        let deadline = options.timeout().map(|t| Instant::now() + t);
        let timed_out = AtomicBool::new(false);
        let evaluations: Vec<Evaluation> = candidates
            .par_iter()
            .map(|terms| {
                if self.is_cancelled() {
                    return Evaluation::Skipped;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    timed_out.store(true, Ordering::Relaxed);
                    return Evaluation::Skipped;
                }
                let evaluation = self.evaluate(terms, measurements, &data);
                self.discard_if_cancelled(evaluation)
            })
            .collect();

        let mut best = baseline.clone();
        let mut best_index = 0;
        let mut survivors = 0;
        for (i, evaluation) in evaluations.into_iter().enumerate() {
            match evaluation {
                Evaluation::Fitted { hypothesis, pruned } => {
                    stats.evaluated += 1;
                    stats.pruned_terms += pruned;
                    if !hypothesis.is_constant() {
                        survivors += 1;
                    }
                    if is_better(&hypothesis, &best, options) {
                        best = hypothesis;
                        best_index = i + 1;
                    }
                }
                Evaluation::Degenerate => {
                    stats.evaluated += 1;
                    stats.degenerate += 1;
                }
                Evaluation::Skipped => {}
            }
        }

        let mut warnings = Vec::new();
        let total = candidates.len();
        if self.is_cancelled() && stats.evaluated < total {
            stats.cancelled = true;
            warnings.push(ModelingWarning::Cancelled {
                evaluated: stats.evaluated,
                total,
            });
        } else if timed_out.load(Ordering::Relaxed) {
            stats.timed_out = true;
            warnings.push(ModelingWarning::TimedOut {
                evaluated: stats.evaluated,
                total,
            });
        }
        if total > 0 && survivors == 0 && !stats.cancelled && !stats.timed_out {
            warnings.push(ModelingWarning::EmptySearchSpace { candidates: total });
        }

        if best.score(options.compare_with_rss) > baseline.score(options.compare_with_rss) {
            debug!("best candidate scores worse than the constant baseline; using the baseline");
            best = baseline;
            best_index = 0;
        }

        for w in &warnings {
            warn!("{w}");
        }
        info!(
            candidate = best_index,
            terms = best.term_count(),
            smape = best.smape,
            rss = best.rss,
            "selected {}",
            best.function
        );

        Ok(SelectionOutcome {
            hypothesis: best,
            warnings,
            stats,
        })
    }

    /// Select a hypothesis and bind it to its series.
    ///
    /// Region and metric are taken from the first measurement.
    pub fn create_model(&self, measurements: Vec<Measurement>) -> Result<(Model, SelectionOutcome)> {
        let outcome = self.select(&measurements)?;
        let Some(first) = measurements.first() else {
            return Err(ModelingError::invalid("measurement set is empty"));
        };
        let (region, metric) = (first.region().clone(), first.metric().clone());
        let model = Model::new(outcome.hypothesis.clone(), region, metric, measurements);
        Ok((model, outcome))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Results that finish after the cancel flag went up are dropped.
    fn discard_if_cancelled(&self, evaluation: Evaluation) -> Evaluation {
        if self.is_cancelled() { Evaluation::Skipped } else { evaluation }
    }

    /// Top-ranked single-parameter term per parameter, `None` where the slice
    /// is too small or best described by a constant.
    fn building_blocks(&self, measurements: &[Measurement], dims: usize) -> Vec<Option<CompoundTerm>> {
        (0..dims)
            .map(|i| {
                let slice = parameter_slice(measurements, i, self.options.use_median);
                if slice.is_empty() {
                    debug!(parameter = i, "no usable slice");
                    return None;
                }
                let block = self.provider.candidates(&slice).into_iter().next().map(|r| r.term);
                match &block {
                    Some(term) => debug!(parameter = i, slice = slice.len(), "building block {term:?}"),
                    None => debug!(parameter = i, slice = slice.len(), "constant"),
                }
                block
            })
            .collect()
    }

    fn evaluate(
        &self,
        terms: &[MultiParameterTerm],
        measurements: &[Measurement],
        data: &FitData,
    ) -> Evaluation {
        let options = &self.options;
        let fitted = fit_terms(terms, data, options.max_condition_number)
            .and_then(|h| prune(h, data, options.epsilon, options.max_condition_number));
        let (mut hypothesis, pruned) = match fitted {
            Ok(r) => r,
            Err(e) => {
                debug!("degenerate candidate: {e}");
                return Evaluation::Degenerate;
            }
        };
        if options.use_crossvalidation {
            hypothesis.cv_smape = cross_validate(
                &hypothesis.function.terms,
                measurements,
                options.use_median,
                options.max_condition_number,
            )
            .map(|cv| cv.mean_smape);
        }
        Evaluation::Fitted { hypothesis, pruned }
    }
}

/// One-shot helper: select with `options` and build the model.
pub fn create_model(
    measurements: Vec<Measurement>,
    options: &ModelerOptions,
) -> Result<(Model, SelectionOutcome)> {
    ModelSelector::new(options.clone())?.create_model(measurements)
}
