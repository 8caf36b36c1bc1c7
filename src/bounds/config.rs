//! Tolerances and work budget of the subdivision search.

use crate::quality_error::QualityError;
use serde::{Deserialize, Serialize};

/// Stopping rules shared by every cell of a search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundConfig {
    /// Maximum number of splits per search phase.
    pub max_subdivisions: usize,
    /// Relative tolerance on Jacobian bounds, scaled by the largest corner value.
    pub jacobian_rel_tol: f64,
    /// IGE/ICN tolerance when the certified bound is at or below zero.
    pub measure_tol_min: f64,
    /// IGE/ICN tolerance when the certified bound reaches one.
    pub measure_tol_max: f64,
}

impl Default for BoundConfig {
    fn default() -> Self {
        Self {
            max_subdivisions: 1000,
            jacobian_rel_tol: 1e-3,
            measure_tol_min: 1e-3,
            measure_tol_max: 1e-2,
        }
    }
}

impl BoundConfig {
    pub fn validate(&self) -> Result<(), QualityError> {
        if self.max_subdivisions == 0 {
            return Err(QualityError::InvalidConfig(
                "max_subdivisions must be positive".into(),
            ));
        }
        for (name, v) in [
            ("jacobian_rel_tol", self.jacobian_rel_tol),
            ("measure_tol_min", self.measure_tol_min),
            ("measure_tol_max", self.measure_tol_max),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(QualityError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {v}"
                )));
            }
        }
        if self.measure_tol_max < self.measure_tol_min {
            return Err(QualityError::InvalidConfig(format!(
                "measure_tol_max ({}) is below measure_tol_min ({})",
                self.measure_tol_max, self.measure_tol_min
            )));
        }
        Ok(())
    }

    /// Jacobian stopping test for a cell against the running corner bounds.
    pub fn jacobian_bounds_ok(&self, min_l: f64, max_l: f64, min_b: f64, max_b: f64) -> bool {
        let tol = min_l.abs().max(max_l.abs()) * self.jacobian_rel_tol;
        (min_l <= 0.0 || min_b > 0.0) && min_l - min_b < tol && max_b - max_l < tol
    }

    /// IGE/ICN stopping test; the tolerance grows with the certified bound.
    pub fn measure_bounds_ok(&self, min_l: f64, min_b: f64) -> bool {
        let tol = self.measure_tol_min + (self.measure_tol_max - self.measure_tol_min) * min_b.max(0.0);
        min_l - min_b < tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BoundConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = BoundConfig {
            measure_tol_max: 1e-4,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(QualityError::InvalidConfig(_))));
        let cfg = BoundConfig {
            jacobian_rel_tol: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = BoundConfig {
            max_subdivisions: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn jacobian_test_requires_sign_certainty() {
        let cfg = BoundConfig::default();
        // Corners positive, coefficients dip below zero: sign undecided.
        assert!(!cfg.jacobian_bounds_ok(1.0, 2.0, -0.5, 2.0));
        assert!(cfg.jacobian_bounds_ok(1.0, 2.0, 0.9995, 2.0));
        // Corners already negative: only the gap matters.
        assert!(cfg.jacobian_bounds_ok(-1.0, 2.0, -1.001, 2.0));
    }

    #[test]
    fn measure_tolerance_scales_with_bound() {
        let cfg = BoundConfig::default();
        assert!(cfg.measure_bounds_ok(0.5, 0.4955));
        assert!(!cfg.measure_bounds_ok(0.5, 0.49));
        assert!(!cfg.measure_bounds_ok(0.002, 0.0));
    }
}
