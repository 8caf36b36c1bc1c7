//! Bernstein-Bezier bases on the reference shapes.
//!
//! Coefficients are stored column-major: a block of `num_coeffs` values per
//! column. The first `num_corners` coefficients of each column are the
//! values at the reference corners.

pub mod basis;
pub mod bernstein;
pub mod exponents;
pub mod factory;
pub mod raiser;

pub use basis::{AffineMap, BezierBasis, subdomain_maps};
pub use exponents::Exponent;
pub use factory::{BasisFactory, global};
pub use raiser::BezierRaiser;
