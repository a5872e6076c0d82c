//! Single-parameter candidate terms.
//!
//! The multi-parameter search does not guess exponents itself. For each
//! parameter it asks a [`CandidateProvider`] for a ranked list of
//! single-parameter terms, computed on a one-dimensional slice of the data, and
//! uses the top-ranked term as that parameter's building block.
//!
//! The default provider is an exhaustive search over a fixed exponent grid:
//! every `(p, q)` pair is fitted as `c0 + c1 · x^p · log2(x)^q` and ranked.

use tracing::trace;

use crate::domain::ModelerOptions;
use crate::fit::fitter::{FitData, fit_terms, term_contributions};
use crate::fit::selection::near_tie;
use crate::models::{CompoundTerm, Fraction, MultiParameterTerm, SimpleTerm};

/// One ranked single-parameter candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTerm {
    pub term: CompoundTerm,
    pub smape: f64,
    pub rss: f64,
}

/// Source of ranked single-parameter candidate terms.
pub trait CandidateProvider: Send + Sync {
    /// Rank candidate terms for `(parameter value, observed value)` points.
    ///
    /// Best first. An empty ranking means the parameter is best described by
    /// a constant.
    fn candidates(&self, points: &[(f64, f64)]) -> Vec<RankedTerm>;
}

/// Exhaustive search over a grid of polynomial and logarithmic exponents.
#[derive(Debug, Clone)]
pub struct ExponentGridProvider {
    pub polynomial_exponents: Vec<Fraction>,
    pub log_exponents: Vec<Fraction>,
    pub epsilon: f64,
    pub tie_tolerance: f64,
    pub compare_with_rss: bool,
    pub max_condition_number: f64,
}

impl ExponentGridProvider {
    pub fn from_options(options: &ModelerOptions) -> Self {
        Self {
            polynomial_exponents: default_polynomial_exponents(),
            log_exponents: default_log_exponents(),
            epsilon: options.epsilon,
            tie_tolerance: options.tie_tolerance,
            compare_with_rss: options.compare_with_rss,
            max_condition_number: options.max_condition_number,
        }
    }

    /// Every non-constant `(p, q)` pair of the grid, ordered by complexity.
    pub fn simple_terms(&self) -> Vec<SimpleTerm> {
        let mut out = Vec::new();
        for &p in &self.polynomial_exponents {
            for &q in &self.log_exponents {
                let t = SimpleTerm::new(p, q);
                if !t.is_constant() {
                    out.push(t);
                }
            }
        }
        out.sort_by(|a, b| {
            a.complexity()
                .total_cmp(&b.complexity())
                .then(a.polynomial.cmp(&b.polynomial))
        });
        out.dedup();
        out
    }

    fn score(&self, candidate: &RankedTerm) -> f64 {
        if self.compare_with_rss { candidate.rss } else { candidate.smape }
    }

    fn is_better(&self, a: &RankedTerm, b: &RankedTerm) -> bool {
        let (sa, sb) = (self.score(a), self.score(b));
        if near_tie(sa, sb, self.tie_tolerance) {
            return a.term.complexity() < b.term.complexity();
        }
        sa < sb
    }
}

impl Default for ExponentGridProvider {
    fn default() -> Self {
        Self::from_options(&ModelerOptions::default())
    }
}

impl CandidateProvider for ExponentGridProvider {
    fn candidates(&self, points: &[(f64, f64)]) -> Vec<RankedTerm> {
        let data = FitData::from_points(points);
        let mut fitted: Vec<RankedTerm> = Vec::new();

        for simple in self.simple_terms() {
            let compound = CompoundTerm::single(simple);
            let Ok(term) = MultiParameterTerm::new(0.0, vec![(0, compound.clone())]) else {
                continue;
            };
            let hypothesis = match fit_terms(&[term], &data, self.max_condition_number) {
                Ok(h) => h,
                Err(e) => {
                    trace!(p = %simple.polynomial, q = %simple.logarithm, "skipping: {e}");
                    continue;
                }
            };
            let contribution = term_contributions(&hypothesis.function, &data)[0];
            if contribution < self.epsilon {
                continue;
            }
            fitted.push(RankedTerm {
                term: compound,
                smape: hypothesis.smape,
                rss: hypothesis.rss,
            });
        }

        // The near-tie rule is not transitive, so rank by repeated selection
        // in grid order instead of a sort.
        let mut ranked = Vec::with_capacity(fitted.len());
        while !fitted.is_empty() {
            let mut best = 0;
            for i in 1..fitted.len() {
                if self.is_better(&fitted[i], &fitted[best]) {
                    best = i;
                }
            }
            ranked.push(fitted.remove(best));
        }
        ranked
    }
}

/// `0, 1/4, 1/3, 1/2, 2/3, 3/4, 4/5, 1, 5/4, 4/3, 3/2, 5/3, 7/4, 2, 9/4, 7/3,
/// 5/2, 8/3, 11/4, 3`.
pub fn default_polynomial_exponents() -> Vec<Fraction> {
    [
        (0, 1),
        (1, 4),
        (1, 3),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (1, 1),
        (5, 4),
        (4, 3),
        (3, 2),
        (5, 3),
        (7, 4),
        (2, 1),
        (9, 4),
        (7, 3),
        (5, 2),
        (8, 3),
        (11, 4),
        (3, 1),
    ]
    .into_iter()
    .map(|(n, d)| Fraction::new(n, d))
    .collect()
}

/// `0, 1, 2`.
pub fn default_log_exponents() -> Vec<Fraction> {
    (0..=2).map(Fraction::integer).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(f: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
        [2.0, 4.0, 8.0, 16.0, 32.0].iter().map(|&x| (x, f(x))).collect()
    }

    fn top(points: &[(f64, f64)]) -> SimpleTerm {
        let ranked = ExponentGridProvider::default().candidates(points);
        *ranked[0].term.as_single().unwrap()
    }

    #[test]
    fn grid_has_all_non_constant_pairs() {
        let provider = ExponentGridProvider::default();
        assert_eq!(provider.simple_terms().len(), 20 * 3 - 1);
    }

    #[test]
    fn recovers_linear_term() {
        let t = top(&points(|x| 5.0 + 2.0 * x));
        assert_eq!(t, SimpleTerm::new(Fraction::ONE, Fraction::ZERO));
    }

    #[test]
    fn recovers_log_term() {
        let t = top(&points(|x| 1.0 + 4.0 * x.log2()));
        assert_eq!(t, SimpleTerm::new(Fraction::ZERO, Fraction::ONE));
    }

    #[test]
    fn recovers_fractional_power_with_log() {
        let t = top(&points(|x| 3.0 + x.powf(1.5) * x.log2()));
        assert_eq!(t, SimpleTerm::new(Fraction::new(3, 2), Fraction::ONE));
    }

    #[test]
    fn constant_data_has_no_candidates() {
        let ranked = ExponentGridProvider::default().candidates(&points(|_| 42.0));
        assert!(ranked.is_empty());
    }

    #[test]
    fn ranking_is_best_first() {
        let provider = ExponentGridProvider::default();
        let ranked = provider.candidates(&points(|x| x * x));
        assert!(ranked.len() > 1);
        assert_eq!(
            ranked[0].term.as_single(),
            Some(&SimpleTerm::new(Fraction::integer(2), Fraction::ZERO))
        );
        assert!(ranked[0].smape < 1e-6);
        assert!(ranked[1..].iter().all(|r| r.smape >= ranked[0].smape));
    }
}
