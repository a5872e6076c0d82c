//! PMNF term types.
//!
//! - `SimpleTerm`: `x^p · log2(x)^q` for one parameter
//! - `CompoundTerm`: a sum of up to two simple terms for one parameter
//! - `MultiParameterTerm`: a coefficient times the product of compound terms
//!   over a subset of the parameters

use std::fmt;

use crate::domain::{MAX_PARAMETERS, MAX_SIMPLE_TERMS};
use crate::error::{ModelingError, Result};
use crate::math::pmnf_factor;
use crate::models::Fraction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimpleTerm {
    /// Polynomial exponent `p`.
    pub polynomial: Fraction,
    /// Logarithmic exponent `q`.
    pub logarithm: Fraction,
}

impl SimpleTerm {
    pub fn new(polynomial: Fraction, logarithm: Fraction) -> Self {
        Self {
            polynomial,
            logarithm,
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        pmnf_factor(x, self.polynomial.to_f64(), self.logarithm.to_f64())
    }

    /// `p + q`, used to order candidates from simple to complex.
    pub fn complexity(&self) -> f64 {
        self.polynomial.to_f64() + self.logarithm.to_f64()
    }

    pub fn is_constant(&self) -> bool {
        self.polynomial.is_zero() && self.logarithm.is_zero()
    }

    fn fmt_with(&self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            return write!(f, "1");
        }
        let poly = match self.polynomial {
            p if p.is_zero() => None,
            p if p == Fraction::ONE => Some(name.to_string()),
            p if p.denominator() == 1 => Some(format!("{name}^{p}")),
            p => Some(format!("{name}^({p})")),
        };
        let log = match self.logarithm {
            q if q.is_zero() => None,
            q if q == Fraction::ONE => Some(format!("log2({name})")),
            q if q.denominator() == 1 => Some(format!("log2({name})^{q}")),
            q => Some(format!("log2({name})^({q})")),
        };
        match (poly, log) {
            (Some(p), Some(l)) => write!(f, "{p} * {l}"),
            (Some(p), None) => write!(f, "{p}"),
            (None, Some(l)) => write!(f, "{l}"),
            (None, None) => Ok(()),
        }
    }
}

/// Sum of simple terms for one parameter.
///
/// The scale of the sum is carried by the owning [`MultiParameterTerm`]'s
/// coefficient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundTerm {
    simple_terms: Vec<SimpleTerm>,
}

impl CompoundTerm {
    /// Create a compound term from `1..=2` simple terms.
    pub fn new(simple_terms: Vec<SimpleTerm>) -> Result<Self> {
        if simple_terms.is_empty() || simple_terms.len() > MAX_SIMPLE_TERMS {
            return Err(ModelingError::invalid(format!(
                "a compound term needs 1..={MAX_SIMPLE_TERMS} simple terms, got {}",
                simple_terms.len()
            )));
        }
        Ok(Self { simple_terms })
    }

    pub fn single(term: SimpleTerm) -> Self {
        Self {
            simple_terms: vec![term],
        }
    }

    pub fn simple_terms(&self) -> &[SimpleTerm] {
        &self.simple_terms
    }

    /// The only simple term, if there is exactly one.
    pub fn as_single(&self) -> Option<&SimpleTerm> {
        match self.simple_terms.as_slice() {
            [t] => Some(t),
            _ => None,
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.simple_terms.iter().map(|t| t.evaluate(x)).sum()
    }

    pub fn complexity(&self) -> f64 {
        self.simple_terms.iter().map(SimpleTerm::complexity).sum()
    }

    fn fmt_with(&self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(t) = self.as_single() {
            return t.fmt_with(name, f);
        }
        write!(f, "(")?;
        for (i, t) in self.simple_terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            t.fmt_with(name, f)?;
        }
        write!(f, ")")
    }
}

/// `coefficient · Π_{i ∈ S} compound_i(x_i)` over a parameter subset `S`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiParameterTerm {
    pub coefficient: f64,
    factors: Vec<(usize, CompoundTerm)>,
}

impl MultiParameterTerm {
    /// Create a term. Factors are sorted by parameter index; indices must be
    /// unique and below the parameter cap.
    pub fn new(coefficient: f64, mut factors: Vec<(usize, CompoundTerm)>) -> Result<Self> {
        if factors.is_empty() {
            return Err(ModelingError::invalid("a term needs at least one parameter"));
        }
        factors.sort_by_key(|(i, _)| *i);
        for pair in factors.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(ModelingError::invalid(format!(
                    "parameter {} appears twice in one term",
                    pair[0].0
                )));
            }
        }
        if let Some((i, _)) = factors.iter().find(|(i, _)| *i >= MAX_PARAMETERS) {
            return Err(ModelingError::invalid(format!(
                "parameter index {i} exceeds the cap of {MAX_PARAMETERS} parameters"
            )));
        }
        Ok(Self {
            coefficient,
            factors,
        })
    }

    pub fn factors(&self) -> &[(usize, CompoundTerm)] {
        &self.factors
    }

    pub fn parameters(&self) -> impl Iterator<Item = usize> + '_ {
        self.factors.iter().map(|(i, _)| *i)
    }

    /// Bit `i` set for every participating parameter `i`.
    pub fn mask(&self) -> u32 {
        self.parameters().fold(0, |m, i| m | (1 << i))
    }

    /// The term's value with a unit coefficient.
    ///
    /// A coordinate missing a participating component evaluates to `NaN`.
    pub fn basis(&self, coordinate: &[f64]) -> f64 {
        self.factors
            .iter()
            .map(|(i, term)| coordinate.get(*i).map_or(f64::NAN, |&x| term.evaluate(x)))
            .product()
    }

    pub fn evaluate(&self, coordinate: &[f64]) -> f64 {
        self.coefficient * self.basis(coordinate)
    }

    pub fn complexity(&self) -> f64 {
        self.factors.iter().map(|(_, t)| t.complexity()).sum()
    }

    pub fn with_coefficient(&self, coefficient: f64) -> Self {
        Self {
            coefficient,
            factors: self.factors.clone(),
        }
    }

    pub(crate) fn fmt_with(
        &self,
        name: &dyn Fn(usize) -> String,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.coefficient)?;
        for (i, term) in &self.factors {
            write!(f, " * ")?;
            term.fmt_with(&name(*i), f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(p: (i64, i64), q: (i64, i64)) -> SimpleTerm {
        SimpleTerm::new(Fraction::new(p.0, p.1), Fraction::new(q.0, q.1))
    }

    #[test]
    fn compound_term_caps_simple_terms() {
        let t = st((1, 1), (0, 1));
        assert!(CompoundTerm::new(vec![]).is_err());
        assert!(CompoundTerm::new(vec![t, t, t]).is_err());
        let c = CompoundTerm::new(vec![t, st((0, 1), (1, 1))]).unwrap();
        // x + log2(x) at 8 = 8 + 3
        assert_eq!(c.evaluate(8.0), 11.0);
        assert!(c.as_single().is_none());
    }

    #[test]
    fn multi_parameter_term_is_a_product() {
        let x = CompoundTerm::single(st((1, 1), (0, 1)));
        let log_y = CompoundTerm::single(st((0, 1), (1, 1)));
        let term = MultiParameterTerm::new(3.0, vec![(1, log_y), (0, x)]).unwrap();
        // Factors are sorted by parameter.
        assert_eq!(term.parameters().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(term.mask(), 0b11);
        // 3 * 4 * log2(8)
        assert_eq!(term.evaluate(&[4.0, 8.0]), 36.0);
        assert!(term.evaluate(&[4.0]).is_nan());
    }

    #[test]
    fn multi_parameter_term_rejects_bad_factors() {
        let x = CompoundTerm::single(st((1, 1), (0, 1)));
        assert!(MultiParameterTerm::new(1.0, vec![]).is_err());
        assert!(MultiParameterTerm::new(1.0, vec![(0, x.clone()), (0, x.clone())]).is_err());
        assert!(MultiParameterTerm::new(1.0, vec![(MAX_PARAMETERS, x)]).is_err());
    }

    #[test]
    fn complexity_sums_exponents() {
        let t = st((3, 2), (1, 1));
        assert_eq!(t.complexity(), 2.5);
        assert!(st((0, 1), (0, 1)).is_constant());
    }
}
