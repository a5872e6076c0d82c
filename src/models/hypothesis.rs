//! PMNF functions and scored hypotheses.

use std::fmt;

use crate::domain::Parameter;
use crate::models::MultiParameterTerm;

/// `constant + Σ terms`.
#[derive(Debug, Clone, PartialEq)]
pub struct PmnfFunction {
    pub constant: f64,
    pub terms: Vec<MultiParameterTerm>,
}

impl PmnfFunction {
    pub fn new(constant: f64, terms: Vec<MultiParameterTerm>) -> Self {
        Self { constant, terms }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Vec::new(),
        }
    }

    pub fn evaluate(&self, coordinate: &[f64]) -> f64 {
        self.constant + self.terms.iter().map(|t| t.evaluate(coordinate)).sum::<f64>()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn complexity(&self) -> f64 {
        self.terms.iter().map(MultiParameterTerm::complexity).sum()
    }

    /// Render with the given parameter names instead of `x1, x2, ...`.
    pub fn display_with<'a>(&'a self, parameters: &'a [Parameter]) -> FunctionDisplay<'a> {
        FunctionDisplay {
            function: self,
            parameters: Some(parameters),
        }
    }
}

impl fmt::Display for PmnfFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FunctionDisplay {
            function: self,
            parameters: None,
        }
        .fmt(f)
    }
}

pub struct FunctionDisplay<'a> {
    function: &'a PmnfFunction,
    parameters: Option<&'a [Parameter]>,
}

impl fmt::Display for FunctionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |i: usize| match self.parameters.and_then(|p| p.get(i)) {
            Some(p) => p.name.clone(),
            None => format!("x{}", i + 1),
        };
        write!(f, "{}", self.function.constant)?;
        for term in &self.function.terms {
            write!(f, " + ")?;
            term.fmt_with(&name, f)?;
        }
        Ok(())
    }
}

/// A fitted function together with its training scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub function: PmnfFunction,
    /// Symmetric mean absolute percentage error against the training set, in percent.
    pub smape: f64,
    /// Residual sum of squares against the training set.
    pub rss: f64,
    /// Mean out-of-sample SMAPE across cross-validation folds, when computed.
    pub cv_smape: Option<f64>,
}

impl Hypothesis {
    pub fn new(function: PmnfFunction, smape: f64, rss: f64) -> Self {
        Self {
            function,
            smape,
            rss,
            cv_smape: None,
        }
    }

    /// Primary comparison score (lower is better).
    pub fn score(&self, compare_with_rss: bool) -> f64 {
        if compare_with_rss { self.rss } else { self.smape }
    }

    pub fn term_count(&self) -> usize {
        self.function.term_count()
    }

    pub fn is_constant(&self) -> bool {
        self.function.is_constant()
    }

    pub fn evaluate(&self, coordinate: &[f64]) -> f64 {
        self.function.evaluate(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompoundTerm, Fraction, SimpleTerm};

    fn x_log_y(coefficient: f64) -> MultiParameterTerm {
        let x = CompoundTerm::single(SimpleTerm::new(Fraction::ONE, Fraction::ZERO));
        let log_y = CompoundTerm::single(SimpleTerm::new(Fraction::ZERO, Fraction::ONE));
        MultiParameterTerm::new(coefficient, vec![(0, x), (1, log_y)]).unwrap()
    }

    #[test]
    fn function_evaluates_constant_plus_terms() {
        let f = PmnfFunction::new(2.0, vec![x_log_y(3.0)]);
        // 2 + 3 * 4 * log2(16)
        assert_eq!(f.evaluate(&[4.0, 16.0]), 50.0);
        assert_eq!(PmnfFunction::constant(7.0).evaluate(&[1.0, 2.0]), 7.0);
    }

    #[test]
    fn display_uses_parameter_names() {
        let f = PmnfFunction::new(2.0, vec![x_log_y(3.0)]);
        assert_eq!(f.to_string(), "2 + 3 * x1 * log2(x2)");
        let names = [Parameter::new("p"), Parameter::new("n")];
        assert_eq!(f.display_with(&names).to_string(), "2 + 3 * p * log2(n)");
    }

    #[test]
    fn score_switches_metric() {
        let h = Hypothesis::new(PmnfFunction::constant(1.0), 12.5, 400.0);
        assert_eq!(h.score(false), 12.5);
        assert_eq!(h.score(true), 400.0);
        assert!(h.is_constant());
    }
}
