//! Self-checks of pools and quality cells.
//!
//! Checks run after every split in debug builds, or in release builds with
//! the `strict-invariants` or `check-invariants` feature.

use crate::quality_error::QualityError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), QualityError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Fails on the first NaN in `values`. Infinities are allowed.
pub fn ensure_not_nan(context: &str, values: &[f64]) -> Result<(), QualityError> {
    match values.iter().position(|v| v.is_nan()) {
        Some(i) => Err(QualityError::InvariantViolation(format!(
            "{context}: NaN at position {i}"
        ))),
        None => Ok(()),
    }
}

/// Fails unless `[lo, hi]` contains `[inner_lo, inner_hi]` up to a relative slack.
pub fn ensure_brackets(
    context: &str,
    (lo, hi): (f64, f64),
    (inner_lo, inner_hi): (f64, f64),
    rel_slack: f64,
) -> Result<(), QualityError> {
    let slack = |x: f64| rel_slack * x.abs().max(1.0);
    if lo > inner_lo + slack(inner_lo) || hi < inner_hi - slack(inner_hi) {
        return Err(QualityError::InvariantViolation(format!(
            "{context}: [{lo}, {hi}] does not bracket [{inner_lo}, {inner_hi}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_reported_with_its_position() {
        assert!(ensure_not_nan("ok", &[1.0, f64::INFINITY]).is_ok());
        let err = ensure_not_nan("coeffs", &[0.0, f64::NAN]).unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn bracket_allows_rounding_slack() {
        assert!(ensure_brackets("b", (0.0, 1.0), (1e-14, 1.0 + 1e-14), 1e-12).is_ok());
        assert!(ensure_brackets("b", (0.5, 1.0), (0.4, 1.0), 1e-12).is_err());
        assert!(ensure_brackets("b", (0.0, f64::INFINITY), (0.3, 0.9), 1e-12).is_ok());
    }
}
