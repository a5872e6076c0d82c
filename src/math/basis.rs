//! PMNF basis factors.
//!
//! Every term of a PMNF function is built from factors of the form
//!
//! ```text
//! x^p · log2(x)^q
//! ```
//!
//! Conventions:
//! - a zero exponent contributes exactly `1`, for every `x` (so `0^0 = 1` and
//!   the log factor is skipped for `q = 0` even when `x <= 0`)
//! - `log2(x)` for `x <= 0` is not finite; callers treat non-finite design
//!   entries as a degenerate basis

/// Evaluate `x^p · log2(x)^q`.
pub fn pmnf_factor(x: f64, p: f64, q: f64) -> f64 {
    let poly = if p == 0.0 { 1.0 } else { x.powf(p) };
    if q == 0.0 {
        return poly;
    }

    let log = if x > 0.0 { x.log2() } else { f64::NAN };
    poly * log.powf(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_exponents_are_identity() {
        assert_eq!(pmnf_factor(0.0, 0.0, 0.0), 1.0);
        assert_eq!(pmnf_factor(-3.0, 0.0, 0.0), 1.0);
        assert_eq!(pmnf_factor(8.0, 1.0, 0.0), 8.0);
    }

    #[test]
    fn mixed_power_and_log() {
        // 16^(1/2) * log2(16)^2 = 4 * 16
        let v = pmnf_factor(16.0, 0.5, 2.0);
        assert!((v - 64.0).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn log_of_non_positive_is_not_finite() {
        assert!(!pmnf_factor(0.0, 0.0, 1.0).is_finite());
        assert!(!pmnf_factor(-2.0, 1.0, 1.0).is_finite());
    }
}
