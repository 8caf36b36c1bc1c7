//! QualityError: unified error type for jacobian-quality public APIs
//!
//! Every fallible operation in the crate returns `Result<_, QualityError>`.
//! Recoverable numeric conditions (infinite rational bounds, exhausted work
//! budget) are not errors; they come back as values on the result types.

use crate::topology::cell_type::CellType;
use thiserror::Error;

/// Unified error type for bound and sampling operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QualityError {
    /// No Bernstein basis exists for this shape and order.
    #[error("unsupported element: {cell_type:?} of order {order}")]
    UnsupportedElement { cell_type: CellType, order: u32 },
    /// The requested measure is not defined on this shape.
    #[error("measure `{measure}` is not defined for {cell_type:?}")]
    UnsupportedMeasure {
        measure: &'static str,
        cell_type: CellType,
    },
    /// Two coefficient or sample buffers that must agree in length do not.
    #[error("size mismatch in {context}: expected {expected}, found {found}")]
    SizeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    /// Element data is malformed (node count, order, normals).
    #[error("invalid element: {0}")]
    InvalidElement(String),
    /// The Bernstein Vandermonde matrix could not be inverted.
    #[error("singular Lagrange-to-Bernstein matrix for {cell_type:?} of degree {degree}")]
    SingularBasis { cell_type: CellType, degree: u32 },
    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A structural invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
