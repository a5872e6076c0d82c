//! Fixed-size flat hypothesis form.
//!
//! External tools (accelerator kernels, generated C code) exchange a
//! hypothesis as three fixed-size arrays:
//!
//! - `coefficients`: the constant, then one coefficient per term, zero-padded
//! - `exponent_pairs`: per parameter, the `(p, q)` of its building block,
//!   `(0, 0)` for parameters that take part in no term
//! - `combination`: `combination[term][parameter]` marks participation
//!
//! Only hypotheses where each parameter uses one single-`SimpleTerm` block in
//! every term it appears in can be flattened.

use serde::{Deserialize, Serialize};

use crate::domain::{MAX_PARAMETERS, MAX_TERMS};
use crate::error::{ModelingError, Result};
use crate::models::{CompoundTerm, Fraction, MultiParameterTerm, PmnfFunction, SimpleTerm};

/// Slots in each interchange array.
pub const FLAT_SLOTS: usize = 5;
/// Largest exponent denominator recovered on decode.
pub const MAX_EXPONENT_DENOMINATOR: i64 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatHypothesis {
    pub coefficients: [f64; FLAT_SLOTS],
    pub exponent_pairs: [[f64; 2]; FLAT_SLOTS],
    pub combination: [[bool; FLAT_SLOTS]; FLAT_SLOTS],
}

impl FlatHypothesis {
    /// Flatten `function` over `dims` parameters.
    pub fn encode(function: &PmnfFunction, dims: usize) -> Result<Self> {
        if dims > MAX_PARAMETERS {
            return Err(ModelingError::NotRepresentable(format!(
                "{dims} parameters, at most {MAX_PARAMETERS}"
            )));
        }
        if function.term_count() > MAX_TERMS {
            return Err(ModelingError::NotRepresentable(format!(
                "{} terms, at most {MAX_TERMS}",
                function.term_count()
            )));
        }

        let mut flat = Self {
            coefficients: [0.0; FLAT_SLOTS],
            exponent_pairs: [[0.0; 2]; FLAT_SLOTS],
            combination: [[false; FLAT_SLOTS]; FLAT_SLOTS],
        };
        let mut blocks: [Option<SimpleTerm>; FLAT_SLOTS] = [None; FLAT_SLOTS];

        flat.coefficients[0] = function.constant;
        for (k, term) in function.terms.iter().enumerate() {
            flat.coefficients[k + 1] = term.coefficient;
            for (i, compound) in term.factors() {
                let i = *i;
                if i >= dims {
                    return Err(ModelingError::NotRepresentable(format!(
                        "term {k} uses parameter {i} of {dims}"
                    )));
                }
                let Some(&simple) = compound.as_single() else {
                    return Err(ModelingError::NotRepresentable(format!(
                        "parameter {i} in term {k} is a sum of simple terms"
                    )));
                };
                match blocks[i] {
                    Some(existing) if existing != simple => {
                        return Err(ModelingError::NotRepresentable(format!(
                            "parameter {i} has different exponents in different terms"
                        )));
                    }
                    _ => blocks[i] = Some(simple),
                }
                flat.combination[k][i] = true;
            }
        }
        for (pair, block) in flat.exponent_pairs.iter_mut().zip(&blocks) {
            if let Some(b) = block {
                *pair = [b.polynomial.to_f64(), b.logarithm.to_f64()];
            }
        }
        Ok(flat)
    }

    /// Rebuild the function. Rows of `combination` without any parameter are
    /// ignored.
    pub fn decode(&self, dims: usize) -> Result<PmnfFunction> {
        let mut terms = Vec::new();
        for (k, row) in self.combination.iter().enumerate() {
            if !row.iter().any(|&b| b) {
                continue;
            }
            if k >= MAX_TERMS {
                return Err(ModelingError::NotRepresentable(format!(
                    "combination row {k} has no coefficient slot"
                )));
            }
            let mut factors = Vec::new();
            for (i, _) in row.iter().enumerate().filter(|(_, b)| **b) {
                if i >= dims {
                    return Err(ModelingError::NotRepresentable(format!(
                        "term {k} uses parameter {i} of {dims}"
                    )));
                }
                let [p, q] = self.exponent_pairs[i];
                let simple = SimpleTerm::new(exponent(p)?, exponent(q)?);
                factors.push((i, CompoundTerm::single(simple)));
            }
            terms.push(MultiParameterTerm::new(self.coefficients[k + 1], factors)?);
        }
        Ok(PmnfFunction::new(self.coefficients[0], terms))
    }
}

fn exponent(x: f64) -> Result<Fraction> {
    Fraction::approximate(x, MAX_EXPONENT_DENOMINATOR).ok_or_else(|| {
        ModelingError::NotRepresentable(format!(
            "exponent {x} is not a fraction with denominator <= {MAX_EXPONENT_DENOMINATOR}"
        ))
    })
}

/// Render the flat form as C array declarations.
///
/// ```text
/// float coefs[] = {2, 3, 0, 0, 0};
/// float ctps[] = {1, 0, 0, 1, 0, 0, 0, 0, 0, 0};
/// unsigned char combination[] = {1, 1, 0, 0, 0, ...};
/// ```
pub fn emit_c_arrays(flat: &FlatHypothesis) -> String {
    let coefs: Vec<String> = flat.coefficients.iter().map(|c| c.to_string()).collect();
    let ctps: Vec<String> = flat
        .exponent_pairs
        .iter()
        .flatten()
        .map(|&x| {
            Fraction::approximate(x, MAX_EXPONENT_DENOMINATOR)
                .map_or_else(|| x.to_string(), Fraction::c_literal)
        })
        .collect();
    let combination: Vec<&str> = flat
        .combination
        .iter()
        .flatten()
        .map(|&b| if b { "1" } else { "0" })
        .collect();

    let mut out = String::new();
    out.push_str(&format!("float coefs[] = {{{}}};\n", coefs.join(", ")));
    out.push_str(&format!("float ctps[] = {{{}}};\n", ctps.join(", ")));
    out.push_str(&format!("unsigned char combination[] = {{{}}};\n", combination.join(", ")));
    out
}
