//! Rational bound solver.
//!
//! Given aligned Bernstein coefficients `num_i`, `den_i` of a numerator and a
//! denominator that is known not to change sign, finds the tightest constant
//! `C` with `C * den_i <= num_i` for every `i` (lower mode) or
//! `C * den_i >= num_i` (upper mode). Since both coefficient sets live in the
//! same basis, `C * den - num` then has coefficients of one sign, so `C` bounds
//! `num / den` over the whole domain.

use crate::quality_error::QualityError;

/// Which side of the ratio is bounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundSide {
    Lower,
    Upper,
}

impl BoundSide {
    pub fn flipped(self) -> Self {
        match self {
            BoundSide::Lower => BoundSide::Upper,
            BoundSide::Upper => BoundSide::Lower,
        }
    }
}

/// Tightest constant bound on `num / den` from coefficient pairs.
///
/// With `positive_denominator == false` the denominator is assumed
/// non-positive: multiplying through by it reverses the inequality, so the
/// opposite side's coefficient test is applied. When no finite bound exists
/// the result is `-inf` (lower test) or `+inf` (upper test).
pub fn bound_rational(
    numerator: &[f64],
    denominator: &[f64],
    side: BoundSide,
    positive_denominator: bool,
) -> Result<f64, QualityError> {
    if numerator.len() != denominator.len() {
        return Err(QualityError::SizeMismatch {
            context: "rational bound",
            expected: numerator.len(),
            found: denominator.len(),
        });
    }
    let side = if positive_denominator { side } else { side.flipped() };

    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    match side {
        BoundSide::Lower => {
            // bound * den <= num
            for (&num, &den) in numerator.iter().zip(denominator) {
                if den == 0.0 {
                    if num < 0.0 {
                        return Ok(f64::NEG_INFINITY);
                    }
                } else if den > 0.0 {
                    upper = upper.min(num / den);
                } else {
                    lower = lower.max(num / den);
                }
            }
            Ok(if lower > upper { f64::NEG_INFINITY } else { upper })
        }
        BoundSide::Upper => {
            // bound * den >= num
            for (&num, &den) in numerator.iter().zip(denominator) {
                if den == 0.0 {
                    if num > 0.0 {
                        return Ok(f64::INFINITY);
                    }
                } else if den > 0.0 {
                    lower = lower.max(num / den);
                } else {
                    upper = upper.min(num / den);
                }
            }
            Ok(if lower > upper { f64::INFINITY } else { lower })
        }
    }
}
