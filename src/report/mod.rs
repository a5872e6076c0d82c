//! Reporting utilities: residuals and formatted summaries.
//!
//! Formatting lives here so that the fitting code never builds strings for
//! humans.

use crate::domain::{Coordinate, Parameter};
use crate::error::{ModelingError, Result};
use crate::fit::SelectionOutcome;
use crate::io::FlatHypothesis;
use crate::models::{Hypothesis, Model};

/// Observed vs. predicted value at one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Residual {
    pub coordinate: Coordinate,
    pub observed: f64,
    pub predicted: f64,
    /// `observed - predicted`.
    pub residual: f64,
}

/// Residuals of a model against its own series, in measurement order.
pub fn compute_residuals(model: &Model, use_median: bool) -> Result<Vec<Residual>> {
    let mut out = Vec::with_capacity(model.measurements().len());
    for (m, &predicted) in model.measurements().iter().zip(model.predictions()) {
        if !predicted.is_finite() {
            return Err(ModelingError::degenerate(format!(
                "non-finite prediction at {}",
                m.coordinate()
            )));
        }
        let observed = m.value(use_median);
        out.push(Residual {
            coordinate: m.coordinate().clone(),
            observed,
            predicted,
            residual: observed - predicted,
        });
    }
    Ok(out)
}

/// The `top_n` residuals with the largest magnitude, largest first.
pub fn largest_residuals(residuals: &[Residual], top_n: usize) -> Vec<Residual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.abs().total_cmp(&a.residual.abs()));
    sorted.truncate(top_n);
    sorted
}

/// One-line summary: `time @ main: 2 + 3 * p * log2(n) (SMAPE 0.0000, RSS 0.0000)`.
pub fn format_model(model: &Model, parameters: &[Parameter]) -> String {
    let h = model.hypothesis();
    format!(
        "{} @ {}: {} (SMAPE {:.4}, RSS {:.4})",
        model.metric(),
        model.region(),
        h.function.display_with(parameters),
        h.smape,
        h.rss
    )
}

/// Block summary of a hypothesis in flat form: scores, coefficients,
/// per-parameter exponents and the combination matrix.
///
/// Falls back to the symbolic function when the hypothesis cannot be
/// flattened.
pub fn format_hypothesis(hypothesis: &Hypothesis, dims: usize) -> String {
    let rule = "-".repeat(65);
    let mut out = String::new();
    out.push_str(&format!("{rule}\n"));
    out.push_str(&format!(
        "Hypothesis (SMAPE = {:.4}, RSS = {:.4})\n",
        hypothesis.smape, hypothesis.rss
    ));
    match FlatHypothesis::encode(&hypothesis.function, dims) {
        Ok(flat) => {
            let rows = dims.min(flat.coefficients.len());
            let coefficients: Vec<String> =
                flat.coefficients.iter().map(|c| format!("{c:.4}")).collect();
            out.push_str(&format!("Coefficients: {}\n", coefficients.join(" ")));
            let exponents: Vec<String> = flat.exponent_pairs[..rows]
                .iter()
                .map(|[p, q]| format!("({p:.2},{q:.2})"))
                .collect();
            out.push_str(&format!("Exponents: {}\n", exponents.join(" ")));
            out.push_str("Combination:\n");
            for row in &flat.combination[..hypothesis.term_count()] {
                let cells: Vec<&str> = row[..rows].iter().map(|&b| if b { "1" } else { "0" }).collect();
                out.push_str(&format!("{}\n", cells.join(" ")));
            }
        }
        Err(_) => {
            out.push_str(&format!("Function: {}\n", hypothesis.function));
        }
    }
    if let Some(cv) = hypothesis.cv_smape {
        out.push_str(&format!("Cross-validated SMAPE: {cv:.4}\n"));
    }
    out.push_str(&format!("{rule}\n"));
    out
}

/// Search diagnostics: counters and warnings.
pub fn format_outcome(outcome: &SelectionOutcome) -> String {
    let s = &outcome.stats;
    let mut out = String::new();
    out.push_str(&format!(
        "Candidates: {} (evaluated {}, degenerate {}, pruned terms {})\n",
        s.candidates, s.evaluated, s.degenerate, s.pruned_terms
    ));
    for w in &outcome.warnings {
        out.push_str(&format!("Warning: {w}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Measurement, Metric, Region};
    use crate::error::ModelingWarning;
    use crate::fit::SelectionStats;
    use crate::models::{CompoundTerm, Fraction, MultiParameterTerm, PmnfFunction, SimpleTerm};

    fn x_log_y() -> Hypothesis {
        let term = MultiParameterTerm::new(
            3.0,
            vec![
                (0, CompoundTerm::single(SimpleTerm::new(Fraction::ONE, Fraction::ZERO))),
                (1, CompoundTerm::single(SimpleTerm::new(Fraction::ZERO, Fraction::ONE))),
            ],
        )
        .unwrap();
        Hypothesis::new(PmnfFunction::new(2.0, vec![term]), 1.5, 0.25)
    }

    fn model() -> Model {
        let ms = vec![
            Measurement::new(vec![2.0, 4.0], Region::new("main"), Metric::new("time"), vec![14.0]).unwrap(),
            Measurement::new(vec![4.0, 4.0], Region::new("main"), Metric::new("time"), vec![30.0]).unwrap(),
            Measurement::new(vec![4.0, 8.0], Region::new("main"), Metric::new("time"), vec![36.0]).unwrap(),
        ];
        Model::new(x_log_y(), Region::new("main"), Metric::new("time"), ms)
    }

    #[test]
    fn residuals_are_observed_minus_predicted() {
        let r = compute_residuals(&model(), false).unwrap();
        // Predictions: 14, 26, 38.
        assert_eq!(r[0].residual, 0.0);
        assert_eq!(r[1].residual, 4.0);
        assert_eq!(r[2].residual, -2.0);

        let top = largest_residuals(&r, 2);
        assert_eq!(top[0].residual, 4.0);
        assert_eq!(top[1].residual, -2.0);
    }

    #[test]
    fn model_summary_uses_names() {
        let names = [Parameter::new("p"), Parameter::new("n")];
        assert_eq!(
            format_model(&model(), &names),
            "time @ main: 2 + 3 * p * log2(n) (SMAPE 1.5000, RSS 0.2500)"
        );
    }

    #[test]
    fn hypothesis_block_lists_flat_arrays() {
        let text = format_hypothesis(&x_log_y(), 2);
        assert!(text.contains("Hypothesis (SMAPE = 1.5000, RSS = 0.2500)"));
        assert!(text.contains("Coefficients: 2.0000 3.0000 0.0000 0.0000 0.0000"));
        assert!(text.contains("Exponents: (1.00,0.00) (0.00,1.00)"));
        assert!(text.contains("Combination:\n1 1\n"));
    }

    #[test]
    fn outcome_lists_counters_then_warnings() {
        let outcome = SelectionOutcome {
            hypothesis: x_log_y(),
            warnings: vec![ModelingWarning::EmptySearchSpace { candidates: 7 }],
            stats: SelectionStats {
                candidates: 8,
                evaluated: 7,
                pruned_terms: 12,
                ..SelectionStats::default()
            },
        };
        assert_eq!(
            format_outcome(&outcome),
            "Candidates: 8 (evaluated 7, degenerate 0, pruned terms 12)\n\
             Warning: all 7 candidate hypotheses were discarded; using a constant model\n"
        );
    }
}
