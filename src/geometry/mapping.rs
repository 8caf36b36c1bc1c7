//! High-order Lagrange elements and sampling of their geometric mapping.
//!
//! Nodes of an order-`p` element are ordered like the Bernstein multi-indices
//! of degree `p` (see [`exponents`](crate::bezier::exponents::exponents)):
//! vertices first, then the remaining lattice points.
//!
//! Gradient samples are rows `[dx/du, dy/du, dz/du, dx/dv, ..., dz/dw]`;
//! 2D elements only fill the first six entries.

use crate::bezier::basis::BezierBasis;
use crate::bezier::bernstein;
use crate::bezier::exponents::{exponents, lagrange_point, require_factors};
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use nalgebra::{DMatrix, Matrix3};

const EPS: f64 = 1e-12;

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalized(a: [f64; 3]) -> Option<[f64; 3]> {
    let n = dot(a, a).sqrt();
    (n > EPS).then(|| [a[0] / n, a[1] / n, a[2] / n])
}

/// Number of gradient columns stored per sample for a given dimension.
pub fn gradient_columns(dimension: usize) -> usize {
    if dimension == 3 { 9 } else { 6 }
}

/// Curved Lagrange element: shape, mapping order and node coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct HighOrderElement {
    cell_type: CellType,
    order: u32,
    nodes: Vec<[f64; 3]>,
}

impl HighOrderElement {
    pub fn new(cell_type: CellType, order: u32, nodes: Vec<[f64; 3]>) -> Result<Self, QualityError> {
        if order == 0 {
            return Err(QualityError::InvalidElement(
                "mapping order must be at least 1".into(),
            ));
        }
        let expected = exponents(cell_type, order)?.len();
        if nodes.len() != expected {
            return Err(QualityError::InvalidElement(format!(
                "{} of order {order} needs {expected} nodes, got {}",
                cell_type.name(),
                nodes.len()
            )));
        }
        Ok(HighOrderElement {
            cell_type,
            order,
            nodes,
        })
    }

    /// Builds an element by mapping the reference node lattice through `f`.
    pub fn from_reference_map(
        cell_type: CellType,
        order: u32,
        f: impl Fn(&[f64; 3]) -> [f64; 3],
    ) -> Result<Self, QualityError> {
        let nodes = Self::reference_nodes(cell_type, order)?.iter().map(f).collect();
        Self::new(cell_type, order, nodes)
    }

    /// Reference coordinates of the nodes of an order-`order` element.
    pub fn reference_nodes(cell_type: CellType, order: u32) -> Result<Vec<[f64; 3]>, QualityError> {
        Ok(exponents(cell_type, order)?
            .iter()
            .map(|e| lagrange_point(cell_type, order, e))
            .collect())
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn nodes(&self) -> &[[f64; 3]] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.nodes
    }

    /// Vertex coordinates (the straight element).
    pub fn corners(&self) -> &[[f64; 3]] {
        &self.nodes[..self.cell_type.num_corners()]
    }
}

/// Maps the reference simplex onto the equilateral one; `None` means identity.
/// Returns `(M^-1, det M)`.
fn ideal_transform(cell_type: CellType) -> Option<(Matrix3<f64>, f64)> {
    let s3 = 3f64.sqrt();
    let m = match cell_type {
        CellType::Triangle | CellType::Prism => {
            Matrix3::new(1.0, 0.5, 0.0, 0.0, s3 / 2.0, 0.0, 0.0, 0.0, 1.0)
        }
        CellType::Tetrahedron => Matrix3::new(
            1.0,
            0.5,
            0.5,
            0.0,
            s3 / 2.0,
            s3 / 6.0,
            0.0,
            0.0,
            (2.0f64 / 3.0).sqrt(),
        ),
        _ => return None,
    };
    let det = m.determinant();
    m.try_inverse().map(|inv| (inv, det))
}

/// Direction completing the Jacobian of curves and surfaces.
fn regularization(
    cell_type: CellType,
    corners: &[[f64; 3]],
    normals: Option<&[[f64; 3]]>,
) -> Result<Option<[f64; 3]>, QualityError> {
    let degenerate = || QualityError::InvalidElement(format!("degenerate straight {}", cell_type.name()));
    match (cell_type.dimension(), normals) {
        (3, _) => Ok(None),
        (2, Some([n, ..])) => Ok(Some(*n)),
        (1, Some([n1, n2, ..])) => Ok(Some(cross(*n1, *n2))),
        (d, Some(given)) => Err(QualityError::InvalidElement(format!(
            "{d}D element needs {} normals, got {}",
            3 - d,
            given.len()
        ))),
        (2, None) => {
            let (gu, gv) = if cell_type == CellType::Triangle {
                (sub(corners[1], corners[0]), sub(corners[2], corners[0]))
            } else {
                let gu = add(sub(corners[1], corners[0]), sub(corners[2], corners[3]));
                let gv = add(sub(corners[3], corners[0]), sub(corners[2], corners[1]));
                (gu, gv)
            };
            normalized(cross(gu, gv)).map(Some).ok_or_else(degenerate)
        }
        (_, None) => normalized(sub(corners[1], corners[0]))
            .map(Some)
            .ok_or_else(degenerate),
    }
}

/// Evaluates derivatives of an order-`p` mapping at a fixed point lattice.
#[derive(Debug)]
pub struct MappingSampler {
    cell_type: CellType,
    order: u32,
    sample_degree: u32,
    points: Vec<[f64; 3]>,
    /// One `num_points x num_nodes` matrix per reference axis.
    grad_shape: Vec<DMatrix<f64>>,
}

impl MappingSampler {
    /// Sampler for the mapping spanned by `map_basis`, at the degree-`sample_degree` lattice.
    pub fn new(map_basis: &BezierBasis, sample_degree: u32) -> Result<Self, QualityError> {
        let cell_type = map_basis.cell_type();
        let order = map_basis.degree();
        let factors = require_factors(cell_type, order)?;
        let points: Vec<[f64; 3]> = exponents(cell_type, sample_degree)?
            .iter()
            .map(|e| lagrange_point(cell_type, sample_degree, e))
            .collect();

        let exps = map_basis.exponents();
        let mut gb = vec![DMatrix::<f64>::zeros(points.len(), exps.len()); cell_type.dimension()];
        for (s, x) in points.iter().enumerate() {
            for (j, e) in exps.iter().enumerate() {
                let (_, g) = bernstein::value_gradient(factors, order, e, x);
                for (d, m) in gb.iter_mut().enumerate() {
                    m[(s, j)] = g[d];
                }
            }
        }
        let grad_shape = gb.into_iter().map(|m| m * map_basis.lag2bez()).collect();
        Ok(MappingSampler {
            cell_type,
            order,
            sample_degree,
            points,
            grad_shape,
        })
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn sample_degree(&self) -> u32 {
        self.sample_degree
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Reference coordinates of the sample points.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn check_nodes(&self, nodes: &[[f64; 3]]) -> Result<(), QualityError> {
        let expected = self.grad_shape.first().map_or(0, |m| m.ncols());
        if nodes.len() != expected {
            return Err(QualityError::SizeMismatch {
                context: "element nodes",
                expected,
                found: nodes.len(),
            });
        }
        Ok(())
    }

    /// Rows `dX/du_d` at sample `s`; unused rows are zero.
    fn rows(&self, nodes: &[[f64; 3]], s: usize) -> [[f64; 3]; 3] {
        let mut rows = [[0.0; 3]; 3];
        for (d, shape) in self.grad_shape.iter().enumerate() {
            for (k, x) in nodes.iter().enumerate() {
                let w = shape[(s, k)];
                for c in 0..3 {
                    rows[d][c] += w * x[c];
                }
            }
        }
        rows
    }

    fn determinant(&self, rows: &[[f64; 3]; 3], reg: Option<[f64; 3]>) -> f64 {
        match (self.cell_type.dimension(), reg) {
            (1, Some(t)) => dot(rows[0], t),
            (2, Some(n)) => dot(cross(rows[0], rows[1]), n),
            _ => dot(rows[0], cross(rows[1], rows[2])),
        }
    }

    fn idealize(rows: &[[f64; 3]; 3], minv: &Matrix3<f64>) -> [[f64; 3]; 3] {
        let mut out = [[0.0; 3]; 3];
        for e in 0..3 {
            for d in 0..3 {
                let w = minv[(d, e)];
                for c in 0..3 {
                    out[e][c] += w * rows[d][c];
                }
            }
        }
        out
    }

    fn jacobian_impl(
        &self,
        nodes: &[[f64; 3]],
        normals: Option<&[[f64; 3]]>,
        ideal: bool,
    ) -> Result<Vec<f64>, QualityError> {
        self.check_nodes(nodes)?;
        let reg = regularization(self.cell_type, &nodes[..self.cell_type.num_corners()], normals)?;
        let scale = match ideal_transform(self.cell_type) {
            Some((_, det_m)) if ideal => 1.0 / det_m,
            _ => 1.0,
        };
        Ok((0..self.num_points())
            .map(|s| scale * self.determinant(&self.rows(nodes, s), reg))
            .collect())
    }

    /// Signed Jacobian determinant at every sample point.
    ///
    /// Curves and surfaces are regularized with `normals` when given (two for a
    /// curve, one for a surface), else with the unit tangent or normal of the
    /// straight element.
    pub fn signed_jacobian(
        &self,
        nodes: &[[f64; 3]],
        normals: Option<&[[f64; 3]]>,
    ) -> Result<Vec<f64>, QualityError> {
        self.jacobian_impl(nodes, normals, false)
    }

    /// Signed Jacobian of the mapping composed with the ideal-shape transform.
    pub fn signed_ideal_jacobian(
        &self,
        nodes: &[[f64; 3]],
        normals: Option<&[[f64; 3]]>,
    ) -> Result<Vec<f64>, QualityError> {
        self.jacobian_impl(nodes, normals, true)
    }

    fn gradients_impl(&self, nodes: &[[f64; 3]], ideal: bool) -> Result<Vec<[f64; 9]>, QualityError> {
        self.check_nodes(nodes)?;
        let minv = if ideal {
            ideal_transform(self.cell_type).map(|(m, _)| m)
        } else {
            None
        };
        Ok((0..self.num_points())
            .map(|s| {
                let mut rows = self.rows(nodes, s);
                if let Some(m) = &minv {
                    rows = Self::idealize(&rows, m);
                }
                let mut g = [0.0; 9];
                for d in 0..self.cell_type.dimension() {
                    g[3 * d..3 * d + 3].copy_from_slice(&rows[d]);
                }
                g
            })
            .collect())
    }

    /// Mapping gradient rows at every sample point.
    pub fn gradients(&self, nodes: &[[f64; 3]]) -> Result<Vec<[f64; 9]>, QualityError> {
        self.gradients_impl(nodes, false)
    }

    /// Gradient rows of the mapping composed with the ideal-shape transform.
    pub fn ideal_gradients(&self, nodes: &[[f64; 3]]) -> Result<Vec<[f64; 9]>, QualityError> {
        self.gradients_impl(nodes, true)
    }
}

/// Column-major `num_points x ncols` layout of gradient rows.
pub fn gradient_matrix(rows: &[[f64; 9]], ncols: usize) -> Vec<f64> {
    let n = rows.len();
    let mut out = vec![0.0; n * ncols];
    for (i, g) in rows.iter().enumerate() {
        for c in 0..ncols {
            out[c * n + i] = g[c];
        }
    }
    out
}
