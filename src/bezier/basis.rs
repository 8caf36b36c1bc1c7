//! Bezier basis of one (shape, degree) pair.
//!
//! A [`BezierBasis`] converts Lagrange samples taken at its
//! [`lagrange_points`](BezierBasis::lagrange_points) into Bernstein control
//! coefficients and restricts coefficient sets to child subdomains.
//!
//! Coefficient buffers holding several columns (gradient rows, for instance)
//! are stored column-major: `buf[c * num_coeffs + i]` is coefficient `i` of
//! column `c`.
//!
//! Subdomains:
//! - Segment: two halves.
//! - Triangle: three corner triangles plus the middle one.
//! - Quadrilateral / Hexahedron: 4 / 8 boxes of half size.
//! - Tetrahedron: four corner tetrahedra plus the inner octahedron cut into
//!   four along the diagonal joining the midpoints of edges `02` and `13`.
//! - Prism: the triangle split times the two halves in `w`.

use super::bernstein;
use super::exponents::{Exponent, exponents, lagrange_point, num_basis_corners, require_factors};
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut};
use once_cell::sync::OnceCell;

/// Affine map from the reference element onto one of its subdomains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMap {
    origin: [f64; 3],
    axes: [[f64; 3]; 3],
}

impl AffineMap {
    fn simplex(vertices: &[[f64; 3]]) -> Self {
        let origin = vertices[0];
        let mut axes = [[0.0; 3]; 3];
        for (m, v) in vertices[1..].iter().enumerate() {
            axes[m] = [v[0] - origin[0], v[1] - origin[1], v[2] - origin[2]];
        }
        AffineMap { origin, axes }
    }

    fn boxed(origin: [f64; 3], h: [f64; 3]) -> Self {
        AffineMap {
            origin,
            axes: [[h[0], 0.0, 0.0], [0.0, h[1], 0.0], [0.0, 0.0, h[2]]],
        }
    }

    /// Image of the reference point `x`.
    pub fn apply(&self, x: &[f64; 3]) -> [f64; 3] {
        let mut y = self.origin;
        for (m, axis) in self.axes.iter().enumerate() {
            for d in 0..3 {
                y[d] += x[m] * axis[d];
            }
        }
        y
    }
}

fn mid(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0]
}

fn triangle_children() -> [[[f64; 3]; 3]; 4] {
    let a = [0.0, 0.0, 0.0];
    let b = [1.0, 0.0, 0.0];
    let c = [0.0, 1.0, 0.0];
    let (ab, ac, bc) = (mid(a, b), mid(a, c), mid(b, c));
    [[a, ab, ac], [ab, b, bc], [ac, bc, c], [bc, ac, ab]]
}

/// Subdomain maps of `cell_type`, in child order.
pub fn subdomain_maps(cell_type: CellType) -> Vec<AffineMap> {
    match cell_type {
        CellType::Segment => (0..2)
            .map(|i| AffineMap::boxed([0.5 * i as f64, 0.0, 0.0], [0.5, 0.0, 0.0]))
            .collect(),
        CellType::Quadrilateral => itertools::iproduct!(0..2, 0..2)
            .map(|(j, i)| AffineMap::boxed([0.5 * i as f64, 0.5 * j as f64, 0.0], [0.5, 0.5, 0.0]))
            .collect(),
        CellType::Hexahedron => itertools::iproduct!(0..2, 0..2, 0..2)
            .map(|(k, j, i)| {
                AffineMap::boxed(
                    [0.5 * i as f64, 0.5 * j as f64, 0.5 * k as f64],
                    [0.5, 0.5, 0.5],
                )
            })
            .collect(),
        CellType::Triangle => triangle_children()
            .iter()
            .map(|t| AffineMap::simplex(t))
            .collect(),
        CellType::Tetrahedron => {
            let v: Vec<[f64; 3]> = cell_type.reference_corners().to_vec();
            let m = |i: usize, j: usize| mid(v[i], v[j]);
            let (m01, m02, m03) = (m(0, 1), m(0, 2), m(0, 3));
            let (m12, m13, m23) = (m(1, 2), m(1, 3), m(2, 3));
            [
                [v[0], m01, m02, m03],
                [m01, v[1], m12, m13],
                [m02, m12, v[2], m23],
                [m03, m13, m23, v[3]],
                [m01, m02, m03, m13],
                [m01, m02, m12, m13],
                [m02, m03, m13, m23],
                [m02, m12, m13, m23],
            ]
            .iter()
            .map(|t| AffineMap::simplex(t))
            .collect()
        }
        CellType::Prism => {
            let mut maps = Vec::with_capacity(8);
            for k in 0..2 {
                for t in triangle_children() {
                    let mut map = AffineMap::simplex(&t);
                    map.origin[2] = 0.5 * k as f64;
                    map.axes[2] = [0.0, 0.0, 0.5];
                    maps.push(map);
                }
            }
            maps
        }
        CellType::Pyramid => Vec::new(),
    }
}

/// Bernstein basis of fixed shape and degree with its change-of-basis and
/// subdivision operators.
#[derive(Debug)]
pub struct BezierBasis {
    cell_type: CellType,
    degree: u32,
    exponents: Vec<Exponent>,
    points: Vec<[f64; 3]>,
    num_corners: usize,
    lag2bez: DMatrix<f64>,
    subdivision: OnceCell<Vec<DMatrix<f64>>>,
}

impl BezierBasis {
    /// Builds the basis; prefer [`BasisFactory`](super::factory::BasisFactory) for cached access.
    pub fn new(cell_type: CellType, degree: u32) -> Result<Self, QualityError> {
        let factors = require_factors(cell_type, degree)?;
        let exponents = exponents(cell_type, degree)?;
        let points: Vec<[f64; 3]> = exponents
            .iter()
            .map(|e| lagrange_point(cell_type, degree, e))
            .collect();
        let n = exponents.len();
        let vandermonde = DMatrix::from_fn(n, n, |k, j| {
            bernstein::value_only(factors, degree, &exponents[j], &points[k])
        });
        let lag2bez = vandermonde
            .try_inverse()
            .ok_or(QualityError::SingularBasis { cell_type, degree })?;
        Ok(BezierBasis {
            cell_type,
            degree,
            num_corners: num_basis_corners(cell_type, degree),
            exponents,
            points,
            lag2bez,
            subdivision: OnceCell::new(),
        })
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Number of Bernstein (and Lagrange) coefficients.
    pub fn num_coeffs(&self) -> usize {
        self.exponents.len()
    }

    /// Number of leading coefficients that sit on domain corners.
    pub fn num_corners(&self) -> usize {
        self.num_corners
    }

    pub fn exponents(&self) -> &[Exponent] {
        &self.exponents
    }

    /// Reference points at which Lagrange samples are expected.
    pub fn lagrange_points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn lag2bez(&self) -> &DMatrix<f64> {
        &self.lag2bez
    }

    pub fn num_subdomains(&self) -> usize {
        self.subdivision_operators().len()
    }

    /// All basis functions evaluated at `x`.
    pub fn functions_at(&self, x: &[f64; 3]) -> Vec<f64> {
        let Some(factors) = super::exponents::factor_axes(self.cell_type) else {
            return Vec::new();
        };
        self.exponents
            .iter()
            .map(|e| bernstein::value_only(factors, self.degree, e, x))
            .collect()
    }

    /// Evaluates the polynomial with Bernstein coefficients `coeffs` at `x`.
    pub fn evaluate(&self, coeffs: &[f64], x: &[f64; 3]) -> Result<f64, QualityError> {
        self.check_len("bezier evaluation", coeffs.len(), 1)?;
        Ok(self
            .functions_at(x)
            .iter()
            .zip(coeffs)
            .map(|(b, c)| b * c)
            .sum())
    }

    fn check_len(&self, context: &'static str, found: usize, ncols: usize) -> Result<(), QualityError> {
        let expected = self.num_coeffs() * ncols;
        if found != expected {
            return Err(QualityError::SizeMismatch {
                context,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Converts `ncols` columns of Lagrange samples into Bernstein coefficients.
    pub fn lag_to_bez(&self, lag: &[f64], ncols: usize, out: &mut [f64]) -> Result<(), QualityError> {
        self.check_len("lagrange samples", lag.len(), ncols)?;
        self.check_len("bezier output", out.len(), ncols)?;
        let n = self.num_coeffs();
        let src = DMatrixView::from_slice(lag, n, ncols);
        let mut dst = DMatrixViewMut::from_slice(out, n, ncols);
        dst.gemm(1.0, &self.lag2bez, &src, 0.0);
        Ok(())
    }

    /// Allocating variant of [`lag_to_bez`](Self::lag_to_bez).
    pub fn lag_to_bez_vec(&self, lag: &[f64], ncols: usize) -> Result<Vec<f64>, QualityError> {
        let mut out = vec![0.0; lag.len()];
        self.lag_to_bez(lag, ncols, &mut out)?;
        Ok(out)
    }

    /// One operator per child: `child = S_c * parent`.
    pub fn subdivision_operators(&self) -> &[DMatrix<f64>] {
        self.subdivision.get_or_init(|| {
            let Some(factors) = super::exponents::factor_axes(self.cell_type) else {
                return Vec::new();
            };
            let n = self.num_coeffs();
            subdomain_maps(self.cell_type)
                .iter()
                .map(|map| {
                    let v = DMatrix::from_fn(n, n, |k, j| {
                        let y = map.apply(&self.points[k]);
                        bernstein::value_only(factors, self.degree, &self.exponents[j], &y)
                    });
                    &self.lag2bez * v
                })
                .collect()
        })
    }

    /// Writes the coefficients of child `child` of `parent` into `out`.
    pub fn subdivide_into(
        &self,
        child: usize,
        parent: &[f64],
        ncols: usize,
        out: &mut [f64],
    ) -> Result<(), QualityError> {
        self.check_len("subdivision input", parent.len(), ncols)?;
        self.check_len("subdivision output", out.len(), ncols)?;
        let ops = self.subdivision_operators();
        let op = ops.get(child).ok_or(QualityError::SizeMismatch {
            context: "subdivision child index",
            expected: ops.len(),
            found: child,
        })?;
        let n = self.num_coeffs();
        let src = DMatrixView::from_slice(parent, n, ncols);
        let mut dst = DMatrixViewMut::from_slice(out, n, ncols);
        dst.gemm(1.0, op, &src, 0.0);
        Ok(())
    }

    /// Coefficients of every child, freshly allocated.
    pub fn subdivide(&self, parent: &[f64], ncols: usize) -> Result<Vec<Vec<f64>>, QualityError> {
        (0..self.num_subdomains())
            .map(|c| {
                let mut out = vec![0.0; parent.len()];
                self.subdivide_into(c, parent, ncols, &mut out)?;
                Ok(out)
            })
            .collect()
    }
}
