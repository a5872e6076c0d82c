//! Multi-parameter term shapes.
//!
//! A shape fixes which parameters take part in which term; coefficients are
//! left to the fitter. Each parameter always contributes its building block
//! (its top-ranked single-parameter term), so a shape is just a list of
//! parameter subsets, one per term.
//!
//! Enumeration is purely combinatorial and never looks at measured values:
//! - pure products: one term over the whole active set
//! - pure sums: one term per parameter
//! - mixed shapes (optional): every other set partition, and partitions with
//!   extra additive single-parameter terms for parameters inside a product
//!   (e.g. `x·y + x`)
//!
//! Every non-empty subset of the active parameters is enumerated as its own
//! active set. The result is deduplicated and ordered from simple to complex
//! so that an earlier candidate wins a tie.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::error::{ModelingError, Result};
use crate::models::{CompoundTerm, MultiParameterTerm};

/// Parameter subsets, one per term, sorted by mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermShape {
    masks: Vec<u32>,
}

impl TermShape {
    pub fn new(mut masks: Vec<u32>) -> Self {
        masks.sort_unstable();
        Self { masks }
    }

    pub fn masks(&self) -> &[u32] {
        &self.masks
    }

    pub fn term_count(&self) -> usize {
        self.masks.len()
    }

    /// Union of all participating parameters.
    pub fn parameter_mask(&self) -> u32 {
        self.masks.iter().fold(0, |acc, m| acc | m)
    }

    /// Sum of the building blocks' exponent complexity over all terms.
    pub fn complexity(&self, blocks: &[Option<CompoundTerm>]) -> f64 {
        self.masks
            .iter()
            .flat_map(|&m| members(m))
            .map(|i| blocks.get(i).and_then(Option::as_ref).map_or(0.0, CompoundTerm::complexity))
            .sum()
    }

    /// Build unfitted terms (coefficient `0`) from the building blocks.
    pub fn instantiate(&self, blocks: &[Option<CompoundTerm>]) -> Result<Vec<MultiParameterTerm>> {
        self.masks
            .iter()
            .map(|&mask| {
                let factors = members(mask)
                    .map(|i| {
                        blocks
                            .get(i)
                            .and_then(Option::clone)
                            .map(|block| (i, block))
                            .ok_or_else(|| {
                                ModelingError::invalid(format!("parameter {i} has no building block"))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                MultiParameterTerm::new(0.0, factors)
            })
            .collect()
    }
}

/// Enumerate all shapes over the parameters that have a building block.
///
/// Returns an empty list when no parameter has one; the constant hypothesis is
/// then the only candidate.
pub fn enumerate_shapes(
    blocks: &[Option<CompoundTerm>],
    max_terms: usize,
    allow_mixed: bool,
) -> Vec<TermShape> {
    let active: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.as_ref().map(|_| i))
        .collect();

    let mut seen = HashSet::new();
    let mut shapes = Vec::new();
    let mut push = |masks: Vec<u32>| {
        let shape = TermShape::new(masks);
        if shape.term_count() <= max_terms && seen.insert(shape.clone()) {
            shapes.push(shape);
        }
    };

    for subset in 1u32..(1 << active.len()) {
        let chosen: Vec<usize> = active
            .iter()
            .enumerate()
            .filter(|(k, _)| subset & (1 << k) != 0)
            .map(|(_, &i)| i)
            .collect();

        for partition in set_partitions(&chosen) {
            let pure_product = partition.len() == 1;
            let pure_sum = partition.iter().all(|m| m.count_ones() == 1);
            if pure_product || pure_sum || allow_mixed {
                push(partition.clone());
            }
            if !allow_mixed {
                continue;
            }

            let inner: Vec<usize> = partition
                .iter()
                .filter(|m| m.count_ones() >= 2)
                .flat_map(|&m| members(m))
                .collect();
            for extra in 1u32..(1 << inner.len()) {
                let mut masks = partition.clone();
                masks.extend(
                    inner
                        .iter()
                        .enumerate()
                        .filter(|(k, _)| extra & (1 << k) != 0)
                        .map(|(_, &i)| 1u32 << i),
                );
                push(masks);
            }
        }
    }

    shapes.sort_by(|a, b| {
        a.term_count()
            .cmp(&b.term_count())
            .then(a.complexity(blocks).total_cmp(&b.complexity(blocks)))
            .then(Reverse(a.parameter_mask().count_ones()).cmp(&Reverse(b.parameter_mask().count_ones())))
            .then(a.masks.cmp(&b.masks))
    });
    shapes
}

fn members(mask: u32) -> impl Iterator<Item = usize> {
    (0..u32::BITS as usize).filter(move |i| mask & (1 << i) != 0)
}

/// All set partitions of `elements`, each as a list of block masks.
fn set_partitions(elements: &[usize]) -> Vec<Vec<u32>> {
    fn recurse(rest: &[usize], blocks: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        let Some((&first, tail)) = rest.split_first() else {
            out.push(blocks.clone());
            return;
        };
        for i in 0..blocks.len() {
            blocks[i] |= 1 << first;
            recurse(tail, blocks, out);
            blocks[i] &= !(1 << first);
        }
        blocks.push(1 << first);
        recurse(tail, blocks, out);
        blocks.pop();
    }

    let mut out = Vec::new();
    recurse(elements, &mut Vec::new(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fraction, SimpleTerm};

    fn block(p: i64) -> Option<CompoundTerm> {
        Some(CompoundTerm::single(SimpleTerm::new(Fraction::integer(p), Fraction::ZERO)))
    }

    #[test]
    fn partitions_follow_bell_numbers() {
        assert_eq!(set_partitions(&[0]).len(), 1);
        assert_eq!(set_partitions(&[0, 1, 2]).len(), 5);
        assert_eq!(set_partitions(&[0, 1, 2, 3]).len(), 15);
    }

    #[test]
    fn two_parameters_without_mixing() {
        let shapes = enumerate_shapes(&[block(1), block(1)], 4, false);
        let masks: Vec<&[u32]> = shapes.iter().map(|s| s.masks()).collect();
        // x, y, x*y, x + y
        assert_eq!(masks, vec![&[0b01][..], &[0b10], &[0b11], &[0b01, 0b10]]);
    }

    #[test]
    fn two_parameters_with_mixing_adds_product_plus_singles() {
        let shapes = enumerate_shapes(&[block(1), block(1)], 4, true);
        let set: HashSet<Vec<u32>> = shapes.iter().map(|s| s.masks().to_vec()).collect();
        assert!(set.contains(&vec![0b01, 0b11]));
        assert!(set.contains(&vec![0b10, 0b11]));
        assert!(set.contains(&vec![0b01, 0b10, 0b11]));
        assert_eq!(shapes.len(), 7);
    }

    #[test]
    fn inactive_parameters_never_appear() {
        let shapes = enumerate_shapes(&[block(1), None, block(2)], 4, true);
        assert!(shapes.iter().all(|s| s.parameter_mask() & 0b010 == 0));
        assert!(enumerate_shapes(&[None, None], 4, true).is_empty());
    }

    #[test]
    fn ordering_is_simple_first_and_capped() {
        let blocks = [block(1), block(1), block(1), block(1), block(1)];
        let shapes = enumerate_shapes(&blocks, 4, true);
        assert!(shapes.iter().all(|s| s.term_count() <= 4));
        for pair in shapes.windows(2) {
            assert!(pair[0].term_count() <= pair[1].term_count());
        }
        // The pure sum of five parameters needs five terms.
        assert!(!shapes.iter().any(|s| s.masks() == [1, 2, 4, 8, 16]));
        // Deterministic.
        assert_eq!(shapes, enumerate_shapes(&blocks, 4, true));
    }

    #[test]
    fn instantiate_uses_building_blocks() {
        let blocks = [block(1), block(2)];
        let terms = TermShape::new(vec![0b11]).instantiate(&blocks).unwrap();
        assert_eq!(terms.len(), 1);
        // 3 * 4^2
        assert_eq!(terms[0].basis(&[3.0, 4.0]), 48.0);
        assert!(TermShape::new(vec![0b100]).instantiate(&blocks).is_err());
    }
}
