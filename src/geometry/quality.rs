//! Certified quality bounds of curved elements.
//!
//! # Function spaces
//! For a mapping of order `p` the Jacobian determinant and the gradient rows
//! are polynomials of the following degrees:
//!
//! | shape         | determinant | gradient |
//! |---------------|-------------|----------|
//! | segment       | `p-1`       | `p-1`    |
//! | triangle      | `2p-2`      | `p-1`    |
//! | quadrilateral | `2p`        | `p`      |
//! | tetrahedron   | `3p-3`      | `p-1`    |
//! | hexahedron    | `3p`        | `p`      |
//! | prism         | `3p`        | `p`      |
//!
//! Pyramids have rational bases and are rejected with
//! [`QualityError::UnsupportedElement`].
//!
//! # Validity first
//! [`min_ige_measure`] and [`min_icn_measure`] bound the Jacobian before
//! anything else. An element whose determinant changes sign scores 0; an
//! element that is entirely inverted scores 0 unless `reversed_ok`, in which
//! case it is measured as if mirrored.
//!
//! # Examples
//! ```rust
//! use jacobian_quality::geometry::mapping::HighOrderElement;
//! use jacobian_quality::geometry::quality::{min_ige_measure, min_max_jacobian_determinant};
//! use jacobian_quality::topology::cell_type::CellType;
//!
//! // Quadratic triangle with one gently bent edge.
//! let tri = HighOrderElement::from_reference_map(CellType::Triangle, 2, |x| {
//!     [x[0] + 0.1 * x[0] * x[1], x[1], 0.0]
//! })?;
//! let jac = min_max_jacobian_determinant(&tri)?;
//! assert!(jac.min > 0.0 && jac.converged);
//!
//! let ige = min_ige_measure(&tri, false, false)?;
//! assert!(ige.value > 0.0 && ige.value < 1.0);
//! # Ok::<(), jacobian_quality::quality_error::QualityError>(())
//! ```

use crate::bezier::factory::global;
use crate::bounds::{
    BoundContext, CellSpace, Measure, QualityCell, finalize_min, finalize_min_max, subdivide_domains,
};
use crate::geometry::mapping::{HighOrderElement, gradient_columns, gradient_matrix};
use crate::geometry::measures::{icn_value, ige_value};
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use serde::{Deserialize, Serialize};

/// Degrees `(determinant, gradient)` of the quality polynomials of an order-`order` mapping.
pub fn quality_orders(cell_type: CellType, order: u32) -> Result<(u32, u32), QualityError> {
    let unsupported = QualityError::UnsupportedElement { cell_type, order };
    if order == 0 {
        return Err(unsupported);
    }
    let p = order;
    match cell_type {
        CellType::Segment => Ok((p - 1, p - 1)),
        CellType::Triangle => Ok((2 * p - 2, p - 1)),
        CellType::Quadrilateral => Ok((2 * p, p)),
        CellType::Tetrahedron => Ok((3 * p - 3, p - 1)),
        CellType::Hexahedron | CellType::Prism => Ok((3 * p, p)),
        CellType::Pyramid => Err(unsupported),
    }
}

/// Certified range of the signed Jacobian determinant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JacobianBounds {
    pub min: f64,
    pub max: f64,
    pub splits: usize,
    pub converged: bool,
}

impl JacobianBounds {
    /// Marker for elements whose Jacobian could not be bounded; `min > max`.
    pub const UNAVAILABLE: JacobianBounds = JacobianBounds {
        min: 99.0,
        max: -99.0,
        splits: 0,
        converged: false,
    };

    pub fn is_available(&self) -> bool {
        self.min <= self.max
    }

    /// True when the determinant is certified positive everywhere.
    pub fn is_valid(&self) -> bool {
        self.is_available() && self.min > 0.0
    }
}

/// How a measure bound was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundStatus {
    /// Every live cell met the stopping tolerance.
    Converged,
    /// The split cap was reached; the value is still a valid lower bound.
    BudgetExhausted,
    /// The element failed the Jacobian check; the value is 0.
    InvalidElement,
}

/// Certified lower bound of IGE or ICN.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureBound {
    pub value: f64,
    pub splits: usize,
    pub status: BoundStatus,
}

impl MeasureBound {
    fn invalid() -> Self {
        MeasureBound {
            value: 0.0,
            splits: 0,
            status: BoundStatus::InvalidElement,
        }
    }
}

fn check_shape(space: &CellSpace, element: &HighOrderElement) -> Result<(), QualityError> {
    if space.cell_type() != element.cell_type() {
        return Err(QualityError::InvalidElement(format!(
            "{} element given to a {} space",
            element.cell_type().name(),
            space.cell_type().name()
        )));
    }
    Ok(())
}

/// Builds the root cell of `space` from the element's nodes.
///
/// With `reversed` the determinant samples are negated, so an inverted
/// element is measured as its mirror image.
pub fn root_cell(
    ctx: &mut BoundContext,
    space: &CellSpace,
    element: &HighOrderElement,
    normals: Option<&[[f64; 3]]>,
    reversed: bool,
) -> Result<QualityCell, QualityError> {
    check_shape(space, element)?;
    let (ct, order) = (element.cell_type(), element.order());
    let det_sampler = global().mapping_sampler(ct, order, space.det_basis().degree())?;
    let mut det = match space.measure() {
        Measure::Icn => det_sampler.signed_ideal_jacobian(element.nodes(), normals)?,
        _ => det_sampler.signed_jacobian(element.nodes(), normals)?,
    };
    if reversed {
        det.iter_mut().for_each(|d| *d = -*d);
    }
    let grad = match space.grad_basis() {
        Some(basis) => {
            let sampler = global().mapping_sampler(ct, order, basis.degree())?;
            let rows = match space.measure() {
                Measure::Icn => sampler.ideal_gradients(element.nodes())?,
                _ => sampler.gradients(element.nodes())?,
            };
            Some(gradient_matrix(&rows, space.grad_cols()))
        }
        None => None,
    };
    QualityCell::from_lagrange(ctx, space, &det, grad.as_deref())
}

/// Certified min and max of the signed Jacobian determinant.
pub fn min_max_jacobian_determinant(element: &HighOrderElement) -> Result<JacobianBounds, QualityError> {
    min_max_jacobian_determinant_with(&mut BoundContext::default(), element, None)
}

/// [`min_max_jacobian_determinant`] with an explicit context and optional
/// regularization normals for curves and surfaces.
pub fn min_max_jacobian_determinant_with(
    ctx: &mut BoundContext,
    element: &HighOrderElement,
    normals: Option<&[[f64; 3]]>,
) -> Result<JacobianBounds, QualityError> {
    let space = CellSpace::for_element(global(), Measure::Jacobian, element.cell_type(), element.order())?;
    let mut cells = vec![root_cell(ctx, &space, element, normals, false)?];
    let report = subdivide_domains(ctx, &space, &mut cells)?;
    let (min, max) = finalize_min_max(ctx, cells)?;
    log::debug!(
        "jacobian of {} (order {}): [{min}, {max}] after {} splits",
        element.cell_type().name(),
        element.order(),
        report.splits()
    );
    Ok(JacobianBounds {
        min,
        max,
        splits: report.splits(),
        converged: report.converged,
    })
}

fn min_measure(
    ctx: &mut BoundContext,
    measure: Measure,
    element: &HighOrderElement,
    known_valid: bool,
    reversed_ok: bool,
    normals: Option<&[[f64; 3]]>,
) -> Result<MeasureBound, QualityError> {
    let mut reversed = false;
    if !known_valid {
        let jac = min_max_jacobian_determinant_with(ctx, element, normals)?;
        if jac.max < 0.0 {
            if !reversed_ok {
                return Ok(MeasureBound::invalid());
            }
            reversed = true;
        } else if jac.min <= 0.0 {
            return Ok(MeasureBound::invalid());
        }
    }

    let space = CellSpace::for_element(global(), measure, element.cell_type(), element.order())?;
    let mut cells = vec![root_cell(ctx, &space, element, normals, reversed)?];
    let report = subdivide_domains(ctx, &space, &mut cells)?;
    let value = finalize_min(ctx, cells)?;
    log::debug!(
        "min {} of {} (order {}): {value} after {} splits",
        measure.name(),
        element.cell_type().name(),
        element.order(),
        report.splits()
    );
    Ok(MeasureBound {
        value,
        splits: report.splits(),
        status: if report.converged {
            BoundStatus::Converged
        } else {
            BoundStatus::BudgetExhausted
        },
    })
}

/// Certified lower bound of the IGE over the element.
pub fn min_ige_measure(
    element: &HighOrderElement,
    known_valid: bool,
    reversed_ok: bool,
) -> Result<MeasureBound, QualityError> {
    min_ige_measure_with(&mut BoundContext::default(), element, known_valid, reversed_ok, None)
}

pub fn min_ige_measure_with(
    ctx: &mut BoundContext,
    element: &HighOrderElement,
    known_valid: bool,
    reversed_ok: bool,
    normals: Option<&[[f64; 3]]>,
) -> Result<MeasureBound, QualityError> {
    min_measure(ctx, Measure::Ige, element, known_valid, reversed_ok, normals)
}

/// Certified lower bound of the ICN over the element.
pub fn min_icn_measure(
    element: &HighOrderElement,
    known_valid: bool,
    reversed_ok: bool,
) -> Result<MeasureBound, QualityError> {
    min_icn_measure_with(&mut BoundContext::default(), element, known_valid, reversed_ok, None)
}

pub fn min_icn_measure_with(
    ctx: &mut BoundContext,
    element: &HighOrderElement,
    known_valid: bool,
    reversed_ok: bool,
    normals: Option<&[[f64; 3]]>,
) -> Result<MeasureBound, QualityError> {
    min_measure(ctx, Measure::Icn, element, known_valid, reversed_ok, normals)
}

/// Signed Jacobian at the degree-`degree` lattice of the element.
pub fn sample_jacobian(
    element: &HighOrderElement,
    degree: u32,
    normals: Option<&[[f64; 3]]>,
) -> Result<Vec<f64>, QualityError> {
    global()
        .mapping_sampler(element.cell_type(), element.order(), degree)?
        .signed_jacobian(element.nodes(), normals)
}

fn require_measure(measure: Measure, element: &HighOrderElement) -> Result<(), QualityError> {
    if element.cell_type().dimension() < 2 {
        return Err(QualityError::UnsupportedMeasure {
            measure: measure.name(),
            cell_type: element.cell_type(),
        });
    }
    Ok(())
}

/// IGE at the degree-`degree` lattice of the element.
pub fn sample_ige_measure(element: &HighOrderElement, degree: u32) -> Result<Vec<f64>, QualityError> {
    require_measure(Measure::Ige, element)?;
    let ct = element.cell_type();
    let sampler = global().mapping_sampler(ct, element.order(), degree)?;
    let det = sampler.signed_jacobian(element.nodes(), None)?;
    let grads = sampler.gradients(element.nodes())?;
    Ok(det.iter().zip(&grads).map(|(&d, g)| ige_value(ct, d, g)).collect())
}

/// ICN at the degree-`degree` lattice, from the ideal-shape Jacobian.
pub fn sample_icn_measure(element: &HighOrderElement, degree: u32) -> Result<Vec<f64>, QualityError> {
    require_measure(Measure::Icn, element)?;
    let ct = element.cell_type();
    let dim = ct.dimension();
    let ncols = gradient_columns(dim);
    let sampler = global().mapping_sampler(ct, element.order(), degree)?;
    let det = sampler.signed_ideal_jacobian(element.nodes(), None)?;
    let grads = sampler.ideal_gradients(element.nodes())?;
    Ok(det
        .iter()
        .zip(&grads)
        .map(|(&d, g)| icn_value(dim, d, &g[..ncols]))
        .collect())
}

/// `(min, max)` of sampled values; `(inf, -inf)` when empty.
pub fn sampled_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_per_shape() {
        assert_eq!(quality_orders(CellType::Triangle, 2).unwrap(), (2, 1));
        assert_eq!(quality_orders(CellType::Tetrahedron, 1).unwrap(), (0, 0));
        assert_eq!(quality_orders(CellType::Hexahedron, 2).unwrap(), (6, 2));
        assert_eq!(quality_orders(CellType::Segment, 3).unwrap(), (2, 2));
        assert!(quality_orders(CellType::Pyramid, 1).is_err());
        assert!(quality_orders(CellType::Quadrilateral, 0).is_err());
    }

    #[test]
    fn unavailable_marker() {
        assert!(!JacobianBounds::UNAVAILABLE.is_available());
        assert!(!JacobianBounds::UNAVAILABLE.is_valid());
    }

    #[test]
    fn bent_quad_is_bracketed_by_samples() {
        let el = HighOrderElement::from_reference_map(CellType::Quadrilateral, 2, |x| {
            [x[0], x[1] + 0.3 * x[0] * (1.0 - x[0]) * x[1], 0.0]
        })
        .unwrap();
        let jac = min_max_jacobian_determinant(&el).unwrap();
        let (lo, hi) = sampled_range(&sample_jacobian(&el, 8, None).unwrap());
        assert!(jac.min <= lo + 1e-12 && jac.max >= hi - 1e-12);
        assert!(jac.is_valid());

        let ige = min_ige_measure(&el, false, false).unwrap();
        let (lo, _) = sampled_range(&sample_ige_measure(&el, 8).unwrap());
        assert!(ige.value <= lo + 1e-12);
        assert!(ige.value > lo - 0.05);
        assert_eq!(ige.status, BoundStatus::Converged);
    }

    #[test]
    fn segment_jacobian_only() {
        let el = HighOrderElement::from_reference_map(CellType::Segment, 2, |x| {
            [x[0], 0.1 * x[0] * x[0], 0.0]
        })
        .unwrap();
        let jac = min_max_jacobian_determinant(&el).unwrap();
        assert!(jac.is_valid());
        assert!(matches!(
            min_icn_measure(&el, true, false),
            Err(QualityError::UnsupportedMeasure { .. })
        ));
        assert!(sample_ige_measure(&el, 2).is_err());
    }

    #[test]
    fn mismatched_space_is_rejected() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::for_element(global(), Measure::Jacobian, CellType::Triangle, 1).unwrap();
        let quad = HighOrderElement::from_reference_map(CellType::Quadrilateral, 1, |x| *x).unwrap();
        assert!(matches!(
            root_cell(&mut ctx, &space, &quad, None, false),
            Err(QualityError::InvalidElement(_))
        ));
    }
}
