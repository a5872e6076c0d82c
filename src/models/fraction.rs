//! Exact rational exponents.
//!
//! PMNF exponents come from a small grid of simple fractions (`1/3`, `5/4`,
//! ...). Keeping them exact makes hypotheses comparable with `==`, hashable,
//! and lets code generators print `1./3` instead of a truncated decimal.

use std::cmp::Ordering;
use std::fmt;

/// A reduced fraction with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: i64,
    den: i64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction { num: 0, den: 1 };
    pub const ONE: Fraction = Fraction { num: 1, den: 1 };

    /// Create `num/den` in lowest terms.
    ///
    /// # Panics
    /// Panics if `den == 0`. Exponent grids are compile-time constants, so a
    /// zero denominator is a programming error.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "fraction with zero denominator");
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i64;
        Self {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn numerator(self) -> i64 {
        self.num
    }

    pub fn denominator(self) -> i64 {
        self.den
    }

    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Recover a fraction from a float, trying denominators `1..=max_den`.
    ///
    /// Returns `None` for non-finite input or when no fraction with a small
    /// enough denominator is within `1e-9` (relative) of `x`.
    pub fn approximate(x: f64, max_den: i64) -> Option<Self> {
        if !x.is_finite() {
            return None;
        }
        let tol = 1e-9 * x.abs().max(1.0);
        for den in 1..=max_den.max(1) {
            let num = (x * den as f64).round();
            if (num / den as f64 - x).abs() <= tol && num.abs() < i64::MAX as f64 {
                return Some(Self::new(num as i64, den));
            }
        }
        None
    }

    /// C float literal: `2`, `1./3`, `-5./4`.
    pub fn c_literal(self) -> String {
        if self.den == 1 {
            self.num.to_string()
        } else {
            format!("{}./{}", self.num, self.den)
        }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross-multiplication keeps the order.
        (self.num as i128 * other.den as i128).cmp(&(other.num as i128 * self.den as i128))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_are_reduced() {
        let f = Fraction::new(2, -8);
        assert_eq!(f.numerator(), -1);
        assert_eq!(f.denominator(), 4);
        assert_eq!(Fraction::new(0, 5), Fraction::ZERO);
        assert_eq!(Fraction::new(4, 2), Fraction::integer(2));
    }

    #[test]
    fn ordering_follows_value() {
        assert!(Fraction::new(1, 3) < Fraction::new(1, 2));
        assert!(Fraction::new(-1, 2) < Fraction::ZERO);
        assert!(Fraction::new(9, 4) > Fraction::integer(2));
    }

    #[test]
    fn approximate_recovers_grid_exponents() {
        for (n, d) in [(1, 3), (2, 3), (4, 5), (11, 4), (7, 3), (3, 1), (0, 1)] {
            let f = Fraction::new(n, d);
            assert_eq!(Fraction::approximate(f.to_f64(), 12), Some(f));
        }
        assert_eq!(Fraction::approximate(std::f64::consts::PI, 12), None);
        assert_eq!(Fraction::approximate(f64::NAN, 12), None);
    }

    #[test]
    fn literals() {
        assert_eq!(Fraction::new(1, 3).c_literal(), "1./3");
        assert_eq!(Fraction::integer(2).c_literal(), "2");
        assert_eq!(Fraction::new(5, 4).to_string(), "5/4");
    }
}
