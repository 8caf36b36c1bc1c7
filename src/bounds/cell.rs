//! Quality cells: one subdomain of a bound search.
//!
//! A cell holds the Bernstein coefficients of its measure restricted to one
//! subdomain (as pooled buffers) and four bounds computed once at
//! construction:
//! - `min_l`/`max_l`: exact extremes over the subdomain corners;
//! - `min_b`/`max_b`: certified bounds over the whole subdomain.
//!
//! `min_b <= min_l` and `max_b >= max_l` always hold.

use super::context::{BoundContext, Scratch};
use super::pool::{BufferId, BufferKind, CoeffPool};
use super::rational::{BoundSide, bound_rational};
use crate::bezier::basis::BezierBasis;
use crate::bezier::factory::BasisFactory;
use crate::bezier::raiser::BezierRaiser;
use crate::debug_invariants::{DebugInvariants, ensure_brackets, ensure_not_nan};
use crate::geometry::mapping::gradient_columns;
use crate::geometry::measures::{
    icn_value, ige_pairs, ige_scale, ige_triples, ige_value, length_combinations, length_vectors,
};
use crate::geometry::quality::quality_orders;
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Quantity bounded by a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    /// Signed Jacobian determinant.
    Jacobian,
    /// Inverse gradient error.
    Ige,
    /// Inverse condition number.
    Icn,
}

impl Measure {
    pub fn name(self) -> &'static str {
        match self {
            Measure::Jacobian => "jacobian",
            Measure::Ige => "ige",
            Measure::Icn => "icn",
        }
    }
}

/// Bases and raisers shared by every cell of one search.
#[derive(Clone, Debug)]
pub struct CellSpace {
    cell_type: CellType,
    measure: Measure,
    det_basis: Arc<BezierBasis>,
    grad_basis: Option<Arc<BezierBasis>>,
    grad_raiser: Option<Arc<BezierRaiser>>,
    det_raiser: Option<Arc<BezierRaiser>>,
    grad_cols: usize,
}

impl CellSpace {
    /// Space of a Jacobian determinant of degree `det_degree`.
    pub fn jacobian(factory: &BasisFactory, cell_type: CellType, det_degree: u32) -> Result<Self, QualityError> {
        Ok(CellSpace {
            cell_type,
            measure: Measure::Jacobian,
            det_basis: factory.bezier_basis(cell_type, det_degree)?,
            grad_basis: None,
            grad_raiser: None,
            det_raiser: None,
            grad_cols: 0,
        })
    }

    fn rational(
        factory: &BasisFactory,
        measure: Measure,
        cell_type: CellType,
        det_degree: u32,
        grad_degree: u32,
    ) -> Result<Self, QualityError> {
        if cell_type.dimension() < 2 {
            return Err(QualityError::UnsupportedMeasure {
                measure: measure.name(),
                cell_type,
            });
        }
        let det_raiser = match (measure, cell_type) {
            (Measure::Ige, CellType::Tetrahedron | CellType::Pyramid) => {
                Some(factory.raiser(cell_type, det_degree)?)
            }
            _ => None,
        };
        Ok(CellSpace {
            cell_type,
            measure,
            det_basis: factory.bezier_basis(cell_type, det_degree)?,
            grad_basis: Some(factory.bezier_basis(cell_type, grad_degree)?),
            grad_raiser: Some(factory.raiser(cell_type, grad_degree)?),
            det_raiser,
            grad_cols: gradient_columns(cell_type.dimension()),
        })
    }

    /// Space of the IGE with the given determinant and gradient degrees.
    pub fn ige(
        factory: &BasisFactory,
        cell_type: CellType,
        det_degree: u32,
        grad_degree: u32,
    ) -> Result<Self, QualityError> {
        Self::rational(factory, Measure::Ige, cell_type, det_degree, grad_degree)
    }

    /// Space of the ICN with the given determinant and gradient degrees.
    pub fn icn(
        factory: &BasisFactory,
        cell_type: CellType,
        det_degree: u32,
        grad_degree: u32,
    ) -> Result<Self, QualityError> {
        Self::rational(factory, Measure::Icn, cell_type, det_degree, grad_degree)
    }

    /// Space of `measure` for an element of the given shape and mapping order.
    pub fn for_element(
        factory: &BasisFactory,
        measure: Measure,
        cell_type: CellType,
        order: u32,
    ) -> Result<Self, QualityError> {
        let (det_degree, grad_degree) = quality_orders(cell_type, order)?;
        match measure {
            Measure::Jacobian => Self::jacobian(factory, cell_type, det_degree),
            Measure::Ige | Measure::Icn => {
                Self::rational(factory, measure, cell_type, det_degree, grad_degree)
            }
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn det_basis(&self) -> &BezierBasis {
        &self.det_basis
    }

    pub fn grad_basis(&self) -> Option<&BezierBasis> {
        self.grad_basis.as_deref()
    }

    /// Columns of the gradient buffer (6 in 2D, 9 in 3D, 0 for Jacobian searches).
    pub fn grad_cols(&self) -> usize {
        self.grad_cols
    }

    fn det_len(&self) -> usize {
        self.det_basis.num_coeffs()
    }

    fn grad_len(&self) -> usize {
        self.grad_basis.as_ref().map_or(0, |b| b.num_coeffs() * self.grad_cols)
    }

    fn grad_parts(&self) -> Result<(&BezierBasis, &BezierRaiser), QualityError> {
        match (&self.grad_basis, &self.grad_raiser) {
            (Some(b), Some(r)) => Ok((b.as_ref(), r.as_ref())),
            _ => Err(QualityError::InvariantViolation(format!(
                "{} space without gradient basis",
                self.measure.name()
            ))),
        }
    }

    fn reserve(&self, pool: &mut CoeffPool) -> Result<(), QualityError> {
        let grad_len = match self.measure {
            Measure::Jacobian => pool.block_len(BufferKind::Gradient),
            Measure::Ige | Measure::Icn => self.grad_len(),
        };
        pool.use_sizes(self.det_len(), grad_len)
    }
}

/// Corner-exact and certified bounds of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBounds {
    pub min_l: f64,
    pub max_l: f64,
    pub min_b: f64,
    pub max_b: f64,
}

/// Cell bounding the signed Jacobian determinant.
#[derive(Debug, PartialEq)]
pub struct JacobianCell {
    det: BufferId,
    depth: u32,
    bounds: CellBounds,
}

/// Cell bounding a ratio of the determinant and gradient terms.
#[derive(Debug, PartialEq)]
pub struct MeasureCell {
    det: BufferId,
    grad: BufferId,
    depth: u32,
    bounds: CellBounds,
}

pub type IgeCell = MeasureCell;
pub type IcnCell = MeasureCell;

/// One live subdomain of a search.
///
/// Cells are neither `Clone` nor `Copy`: each one owns its pooled buffers
/// until it is split or released.
#[derive(Debug, PartialEq)]
pub enum QualityCell {
    Jacobian(JacobianCell),
    Ige(IgeCell),
    Icn(IcnCell),
}

fn check_len(context: &'static str, expected: usize, found: usize) -> Result<(), QualityError> {
    if expected != found {
        return Err(QualityError::SizeMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}

/// Index of corner `k` in a basis with `basis_corners` corner coefficients.
fn corner_index(basis_corners: usize, k: usize) -> usize {
    if basis_corners == 1 { 0 } else { k }
}

/// Row `i` of a column-major gradient buffer, padded to nine entries.
fn gradient_row(grad: &[f64], n: usize, ncols: usize, i: usize) -> [f64; 9] {
    let mut g = [0.0; 9];
    for (c, v) in g.iter_mut().enumerate().take(ncols) {
        *v = grad[c * n + i];
    }
    g
}

/// A certified lower bound of a non-negative term; unbounded answers fall back to 0.
fn non_negative(bound: f64) -> f64 {
    if bound.is_finite() { bound.max(0.0) } else { 0.0 }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn add_into(acc: &mut [f64], v: &[f64]) {
    for (a, b) in acc.iter_mut().zip(v) {
        *a += b;
    }
}

fn complement(t: &[usize; 3]) -> [usize; 3] {
    let mut out = [0; 3];
    let mut k = 0;
    for i in 0..6 {
        if !t.contains(&i) && k < 3 {
            out[k] = i;
            k += 1;
        }
    }
    out
}

/// Fills `lengths` with the length-vector coefficients, one column per length.
fn fill_lengths(cell_type: CellType, grad: &[f64], n: usize, ncols: usize, lengths: &mut Vec<f64>) {
    let count = length_combinations(cell_type).map_or(0, |c| c.len());
    lengths.clear();
    lengths.resize(n * count, 0.0);
    for i in 0..n {
        let v = length_vectors(cell_type, &gradient_row(grad, n, ncols, i));
        for (k, len) in v.iter().take(count).enumerate() {
            lengths[k * n + i] = *len;
        }
    }
}

// Lengths use the norms of the gradient coefficients. By convexity of the
// norm that polynomial lies above the true length, and IGE decreases with
// every length, so bounding the proxy ratio bounds the IGE from below.
fn ige_lower_bound(
    space: &CellSpace,
    det: &[f64],
    grad: &[f64],
    scratch: &mut Scratch,
) -> Result<f64, QualityError> {
    if det.iter().any(|&d| d < 0.0) {
        return Ok(0.0);
    }
    let (grad_basis, raiser) = space.grad_parts()?;
    let ct = space.cell_type;
    let n = grad_basis.num_coeffs();
    let Scratch {
        lengths,
        product,
        acc,
        den1,
        den2,
        numerator,
        denominator,
        ..
    } = scratch;
    fill_lengths(ct, grad, n, space.grad_cols, lengths);
    let col = |k: usize| &lengths[k * n..(k + 1) * n];

    let mut total = 0.0;
    match ct {
        CellType::Triangle | CellType::Quadrilateral => {
            for p in ige_pairs(ct) {
                raiser.compute_coeff2(col(p[0]), col(p[1]), product)?;
                total += non_negative(bound_rational(det, product, BoundSide::Lower, true)?);
            }
        }
        CellType::Hexahedron | CellType::Prism => {
            for t in ige_triples(ct) {
                raiser.compute_coeff3(col(t[0]), col(t[1]), col(t[2]), product)?;
                total += non_negative(bound_rational(det, product, BoundSide::Lower, true)?);
            }
        }
        CellType::Tetrahedron | CellType::Pyramid => {
            // sum_t 1/(v_a v_b v_c) = sum_t prod(complement of t) / prod(all six)
            let det_raiser = space.det_raiser.as_deref().ok_or_else(|| {
                QualityError::InvariantViolation("IGE space without determinant raiser".into())
            })?;
            acc.clear();
            acc.resize(raiser.num_raised_coeffs(3)?, 0.0);
            for t in ige_triples(ct) {
                let c = complement(t);
                raiser.compute_coeff3(col(c[0]), col(c[1]), col(c[2]), product)?;
                add_into(acc, product);
            }
            raiser.compute_coeff3(col(0), col(1), col(2), den1)?;
            raiser.compute_coeff3(col(3), col(4), col(5), den2)?;
            det_raiser.compute_coeff2(acc, det, numerator)?;
            det_raiser.compute_coeff2(den1, den2, denominator)?;
            total = non_negative(bound_rational(numerator, denominator, BoundSide::Lower, true)?);
        }
        CellType::Segment => {
            return Err(QualityError::UnsupportedMeasure {
                measure: Measure::Ige.name(),
                cell_type: ct,
            });
        }
    }
    Ok(ige_scale(ct) * total)
}

fn icn_lower_bound(
    space: &CellSpace,
    det: &[f64],
    grad: &[f64],
    scratch: &mut Scratch,
) -> Result<f64, QualityError> {
    if det.iter().any(|&d| d < 0.0) {
        return Ok(0.0);
    }
    let (grad_basis, raiser) = space.grad_parts()?;
    let n = grad_basis.num_coeffs();
    let ncols = space.grad_cols;
    let Scratch {
        sum,
        product,
        denominator,
        ..
    } = scratch;

    if space.cell_type.dimension() == 2 {
        // |J|^2 is a polynomial: sum of squared gradient columns.
        denominator.clear();
        denominator.resize(raiser.num_raised_coeffs(2)?, 0.0);
        for c in 0..ncols {
            let column = &grad[c * n..(c + 1) * n];
            raiser.compute_coeff2(column, column, product)?;
            add_into(denominator, product);
        }
        let b = non_negative(bound_rational(det, denominator, BoundSide::Lower, true)?);
        Ok(2.0 * b)
    } else {
        // P bounds |J| from above; det / P^3 then bounds det / |J|^3 from below.
        sum.clear();
        sum.extend((0..n).map(|i| {
            (0..ncols)
                .map(|c| grad[c * n + i] * grad[c * n + i])
                .sum::<f64>()
                .sqrt()
        }));
        raiser.compute_coeff3(sum, sum, sum, denominator)?;
        let b = non_negative(bound_rational(det, denominator, BoundSide::Lower, true)?);
        Ok(3.0 * (b * b).cbrt())
    }
}

impl QualityCell {
    /// Root cell from Bernstein coefficients.
    ///
    /// `grad` holds the gradient coefficients column-major and is required
    /// for IGE and ICN spaces. The coefficients are copied into the context's
    /// pool.
    pub fn from_bezier(
        ctx: &mut BoundContext,
        space: &CellSpace,
        det: &[f64],
        grad: Option<&[f64]>,
    ) -> Result<Self, QualityError> {
        check_len("determinant coefficients", space.det_len(), det.len())?;
        space.reserve(&mut ctx.pool)?;
        let grad_id = match (space.measure, grad) {
            (Measure::Jacobian, _) => None,
            (_, Some(g)) => {
                check_len("gradient coefficients", space.grad_len(), g.len())?;
                Some(ctx.pool.acquire_from(BufferKind::Gradient, g)?)
            }
            (m, None) => {
                return Err(QualityError::InvalidElement(format!(
                    "{} bounds need gradient coefficients",
                    m.name()
                )));
            }
        };
        let det_id = ctx.pool.acquire_from(BufferKind::Determinant, det)?;
        Self::assemble_or_release(ctx, space, 0, det_id, grad_id)
    }

    /// Root cell from Lagrange samples at the bases' interpolation points.
    pub fn from_lagrange(
        ctx: &mut BoundContext,
        space: &CellSpace,
        det: &[f64],
        grad: Option<&[f64]>,
    ) -> Result<Self, QualityError> {
        let det_bez = space.det_basis.lag_to_bez_vec(det, 1)?;
        let grad_bez = match (grad, &space.grad_basis) {
            (Some(g), Some(basis)) => Some(basis.lag_to_bez_vec(g, space.grad_cols)?),
            _ => None,
        };
        Self::from_bezier(ctx, space, &det_bez, grad_bez.as_deref())
    }

    fn assemble_or_release(
        ctx: &mut BoundContext,
        space: &CellSpace,
        depth: u32,
        det: BufferId,
        grad: Option<BufferId>,
    ) -> Result<Self, QualityError> {
        let built = Self::assemble(ctx, space, depth, det, grad);
        if built.is_err() {
            let _ = ctx.pool.release(det);
            if let Some(g) = grad {
                let _ = ctx.pool.release(g);
            }
        }
        built
    }

    fn assemble(
        ctx: &mut BoundContext,
        space: &CellSpace,
        depth: u32,
        det: BufferId,
        grad: Option<BufferId>,
    ) -> Result<Self, QualityError> {
        let config = *ctx.config();
        let ct = space.cell_type;
        let det_corners = space.det_basis.num_corners();
        let BoundContext { pool, scratch, .. } = ctx;
        let det_coeffs = pool.get(det);

        let Some(grad) = grad else {
            let (min_l, max_l) = min_max(
                (0..ct.num_corners()).map(|k| det_coeffs[corner_index(det_corners, k)]),
            );
            let (min_b, max_b) = min_max(det_coeffs.iter().copied());
            let bounds = CellBounds {
                min_l,
                max_l,
                min_b,
                max_b,
            };
            return Ok(QualityCell::Jacobian(JacobianCell { det, depth, bounds }));
        };

        let (grad_basis, _) = space.grad_parts()?;
        let n = grad_basis.num_coeffs();
        let grad_corners = grad_basis.num_corners();
        let grad_coeffs = pool.get(grad);
        let dim = ct.dimension();
        let corner_value = |k: usize| {
            let d = det_coeffs[corner_index(det_corners, k)];
            let g = gradient_row(grad_coeffs, n, space.grad_cols, corner_index(grad_corners, k));
            match space.measure {
                Measure::Icn => icn_value(dim, d, &g[..space.grad_cols]),
                _ => ige_value(ct, d, &g),
            }
        };
        let (min_l, max_l) = min_max((0..ct.num_corners()).map(corner_value));

        let trivial = min_l.min(0.0);
        let min_b = if config.measure_bounds_ok(min_l, trivial) {
            trivial
        } else {
            let lower = match space.measure {
                Measure::Icn => icn_lower_bound(space, det_coeffs, grad_coeffs, scratch)?,
                _ => ige_lower_bound(space, det_coeffs, grad_coeffs, scratch)?,
            };
            // Rounding can lift the certified value a hair above a corner value.
            lower.min(min_l)
        };
        let cell = MeasureCell {
            det,
            grad,
            depth,
            bounds: CellBounds {
                min_l,
                max_l,
                min_b,
                max_b: f64::INFINITY,
            },
        };
        Ok(match space.measure {
            Measure::Icn => QualityCell::Icn(cell),
            _ => QualityCell::Ige(cell),
        })
    }

    pub fn measure(&self) -> Measure {
        match self {
            QualityCell::Jacobian(_) => Measure::Jacobian,
            QualityCell::Ige(_) => Measure::Ige,
            QualityCell::Icn(_) => Measure::Icn,
        }
    }

    pub fn bounds(&self) -> &CellBounds {
        match self {
            QualityCell::Jacobian(c) => &c.bounds,
            QualityCell::Ige(c) | QualityCell::Icn(c) => &c.bounds,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            QualityCell::Jacobian(c) => c.depth,
            QualityCell::Ige(c) | QualityCell::Icn(c) => c.depth,
        }
    }

    pub fn min_l(&self) -> f64 {
        self.bounds().min_l
    }

    pub fn max_l(&self) -> f64 {
        self.bounds().max_l
    }

    pub fn min_b(&self) -> f64 {
        self.bounds().min_b
    }

    pub fn max_b(&self) -> f64 {
        self.bounds().max_b
    }

    /// Corner bounds `(min_l, max_l)`.
    pub fn corner_bounds(&self) -> (f64, f64) {
        (self.min_l(), self.max_l())
    }

    /// Determinant coefficients of this cell.
    pub fn det_coeffs<'a>(&self, pool: &'a CoeffPool) -> &'a [f64] {
        match self {
            QualityCell::Jacobian(c) => pool.get(c.det),
            QualityCell::Ige(c) | QualityCell::Icn(c) => pool.get(c.det),
        }
    }

    fn buffers(&self) -> (BufferId, Option<BufferId>) {
        match self {
            QualityCell::Jacobian(c) => (c.det, None),
            QualityCell::Ige(c) | QualityCell::Icn(c) => (c.det, Some(c.grad)),
        }
    }

    /// Stopping test against the running corner bounds of the search.
    pub fn bounds_ok(&self, ctx: &BoundContext, min_l: f64, max_l: f64) -> bool {
        let b = self.bounds();
        match self {
            QualityCell::Jacobian(_) => ctx.config().jacobian_bounds_ok(min_l, max_l, b.min_b, b.max_b),
            QualityCell::Ige(_) | QualityCell::Icn(_) => ctx.config().measure_bounds_ok(min_l, b.min_b),
        }
    }

    fn child(&self, ctx: &mut BoundContext, space: &CellSpace, index: usize) -> Result<Self, QualityError> {
        let (det, grad) = self.buffers();
        let child_det = ctx.pool.acquire(BufferKind::Determinant);
        let child_grad = grad.map(|_| ctx.pool.acquire(BufferKind::Gradient));
        let filled = (|| {
            let (src, dst) = ctx.pool.source_and_target(det, child_det)?;
            space.det_basis.subdivide_into(index, src, 1, dst)?;
            if let (Some(g), Some(cg)) = (grad, child_grad) {
                let (grad_basis, _) = space.grad_parts()?;
                let (src, dst) = ctx.pool.source_and_target(g, cg)?;
                grad_basis.subdivide_into(index, src, space.grad_cols, dst)?;
            }
            Ok::<(), QualityError>(())
        })();
        match filled {
            Ok(()) => Self::assemble_or_release(ctx, space, self.depth() + 1, child_det, child_grad),
            Err(e) => {
                let _ = ctx.pool.release(child_det);
                if let Some(cg) = child_grad {
                    let _ = ctx.pool.release(cg);
                }
                Err(e)
            }
        }
    }

    /// Splits the cell into its children and returns its buffers to the pool.
    pub fn split(self, ctx: &mut BoundContext, space: &CellSpace) -> Result<Vec<Self>, QualityError> {
        let count = space.det_basis.num_subdomains();
        let mut children = Vec::with_capacity(count);
        for index in 0..count {
            match self.child(ctx, space, index) {
                Ok(child) => children.push(child),
                Err(e) => {
                    for child in children {
                        let _ = child.release(&mut ctx.pool);
                    }
                    let _ = self.release(&mut ctx.pool);
                    return Err(e);
                }
            }
        }
        self.release(&mut ctx.pool)?;
        Ok(children)
    }

    /// Returns the cell's buffers to `pool`.
    pub fn release(self, pool: &mut CoeffPool) -> Result<(), QualityError> {
        let (det, grad) = self.buffers();
        pool.release(det)?;
        if let Some(g) = grad {
            pool.release(g)?;
        }
        Ok(())
    }
}

impl DebugInvariants for QualityCell {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "QualityCell");
    }

    fn validate_invariants(&self) -> Result<(), QualityError> {
        let b = self.bounds();
        ensure_not_nan("cell bounds", &[b.min_l, b.max_l, b.min_b, b.max_b])?;
        ensure_brackets(
            "coefficient bounds against corner bounds",
            (b.min_b, b.max_b),
            (b.min_l, b.max_l),
            1e-12,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::factory::global;

    #[test]
    fn jacobian_cell_bounds() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::jacobian(global(), CellType::Segment, 2).unwrap();
        // Corners first: f(0) = 1, f(1) = 2, middle coefficient -1.
        let cell = QualityCell::from_bezier(&mut ctx, &space, &[1.0, 2.0, -1.0], None).unwrap();
        assert_eq!(cell.corner_bounds(), (1.0, 2.0));
        assert_eq!((cell.min_b(), cell.max_b()), (-1.0, 2.0));
        assert_eq!(cell.depth(), 0);
        cell.validate_invariants().unwrap();
        assert!(!cell.bounds_ok(&ctx, 1.0, 2.0));
    }

    #[test]
    fn split_recycles_buffers() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::jacobian(global(), CellType::Quadrilateral, 2).unwrap();
        let coeffs: Vec<f64> = (0..9).map(|i| i as f64 - 3.0).collect();
        let root = QualityCell::from_bezier(&mut ctx, &space, &coeffs, None).unwrap();
        let parent = *root.bounds();
        let children = root.split(&mut ctx, &space).unwrap();
        assert_eq!(children.len(), 4);
        assert_eq!(ctx.pool_stats().live_determinant, 4);
        for child in &children {
            assert_eq!(child.depth(), 1);
            assert!(child.min_b() >= parent.min_b - 1e-12);
            assert!(child.max_b() <= parent.max_b + 1e-12);
            child.validate_invariants().unwrap();
        }
        for child in children {
            child.release(&mut ctx.pool).unwrap();
        }
        assert_eq!(ctx.pool.live(), 0);
    }

    #[test]
    fn measure_space_requires_gradients() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::for_element(global(), Measure::Ige, CellType::Quadrilateral, 1).unwrap();
        let det = vec![1.0; space.det_basis().num_coeffs()];
        let err = QualityCell::from_bezier(&mut ctx, &space, &det, None).unwrap_err();
        assert!(matches!(err, QualityError::InvalidElement(_)));
        assert_eq!(ctx.pool.live(), 0);
    }

    #[test]
    fn segment_has_no_rational_measures() {
        let err = CellSpace::icn(global(), CellType::Segment, 0, 0).unwrap_err();
        assert_eq!(
            err,
            QualityError::UnsupportedMeasure {
                measure: "icn",
                cell_type: CellType::Segment
            }
        );
    }

    #[test]
    fn stretched_quad_ige_is_bracketed() {
        // Affine quad stretched by 2 along u: det = 2, |r0| = 2, |r1| = 1, IGE = 1.
        // A sheared copy has IGE below one at every point.
        let mut ctx = BoundContext::default();
        let space = CellSpace::for_element(global(), Measure::Ige, CellType::Quadrilateral, 1).unwrap();
        let nd = space.det_basis().num_coeffs();
        let ng = space.grad_basis().unwrap().num_coeffs();
        let mut grad = vec![0.0; ng * 6];
        for i in 0..ng {
            grad[i] = 2.0; // dx/du
            grad[3 * ng + i] = 1.0; // dx/dv: shear
            grad[4 * ng + i] = 1.0; // dy/dv
        }
        let cell = QualityCell::from_bezier(&mut ctx, &space, &vec![2.0; nd], Some(&grad)).unwrap();
        let expected = 2.0 / (2.0 * 2f64.sqrt());
        assert!((cell.min_l() - expected).abs() < 1e-12);
        assert!(cell.min_b() <= cell.min_l());
        assert!((cell.min_b() - expected).abs() < 1e-12);
        assert_eq!(cell.max_b(), f64::INFINITY);
    }

    #[test]
    fn negative_determinant_coefficients_give_zero() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::for_element(global(), Measure::Icn, CellType::Triangle, 2).unwrap();
        let nd = space.det_basis().num_coeffs();
        let ng = space.grad_basis().unwrap().num_coeffs();
        let mut det = vec![1.0; nd];
        det[nd - 1] = -0.5;
        let mut grad = vec![0.0; ng * 6];
        for i in 0..ng {
            grad[i] = 1.0;
            grad[4 * ng + i] = 1.0;
        }
        let cell = QualityCell::from_bezier(&mut ctx, &space, &det, Some(&grad)).unwrap();
        assert!((cell.min_l() - 1.0).abs() < 1e-12);
        assert_eq!(cell.min_b(), 0.0);
    }

    #[test]
    fn complement_of_triples() {
        assert_eq!(complement(&[0, 5, 1]), [2, 3, 4]);
        assert_eq!(complement(&[2, 3, 4]), [0, 1, 5]);
    }
}
