//! Pointwise IGE and ICN formulas.
//!
//! IGE (inverse gradient error) compares the Jacobian determinant with the
//! product of the lengths of well-chosen combinations of gradient rows, so
//! that the ideal shape of each type scores 1. ICN (inverse condition number)
//! is `d * det^(2/d) / |J|_F^2` on the ideal-shape gradients.
//!
//! Length vectors per shape, written as combinations of the gradient rows
//! `r0 = dX/du`, `r1 = dX/dv`, `r2 = dX/dw`:
//!
//! | shape         | lengths                                                       |
//! |---------------|---------------------------------------------------------------|
//! | quadrilateral | `r0, r1`                                                      |
//! | triangle      | `r0, r1, r1-r0`                                               |
//! | hexahedron    | `r0, r1, r2`                                                  |
//! | prism         | `r0, r1, r2, r1-r0`                                           |
//! | tetrahedron   | `r0, r1, r2, r1-r0, r2-r0, r2-r1`                             |
//! | pyramid       | `2r0, 2r1, r2+r0+r1, r2-r0+r1, r2-r0-r1, r2+r0-r1`            |
//!
//! Pyramid rows refer to the symmetric reference pyramid (base `[-1,1]^2`,
//! apex `(0,0,1)`), whose base edges are `2r0`, `2r1` and whose lateral edges
//! are `r2 +- r0 +- r1`.

use crate::topology::cell_type::CellType;

/// Scale of the triangle and prism IGE, `2/sqrt(3)`.
pub const C_TRI: f64 = 1.154_700_538_379_251_5;
/// Scale of the tetrahedron IGE.
pub const C_TET: f64 = std::f64::consts::SQRT_2;
/// Scale of the pyramid IGE.
pub const C_PYR: f64 = 4.0 * std::f64::consts::SQRT_2;

/// Row combinations `[c0, c1, c2]` whose norms form the length vectors.
pub fn length_combinations(cell_type: CellType) -> Option<&'static [[f64; 3]]> {
    match cell_type {
        CellType::Segment => None,
        CellType::Quadrilateral => Some(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        CellType::Triangle => Some(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 1.0, 0.0]]),
        CellType::Hexahedron => Some(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
        CellType::Prism => Some(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [-1.0, 1.0, 0.0],
        ]),
        CellType::Tetrahedron => Some(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [-1.0, 1.0, 0.0],
            [-1.0, 0.0, 1.0],
            [0.0, -1.0, 1.0],
        ]),
        CellType::Pyramid => Some(&[
            [2.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
        ]),
    }
}

/// Norm of `c0*r0 + c1*r1 + c2*r2` where `g` holds the three rows back to back.
pub fn combined_norm(g: &[f64; 9], c: &[f64; 3]) -> f64 {
    let mut s = 0.0;
    for k in 0..3 {
        let v = c[0] * g[k] + c[1] * g[3 + k] + c[2] * g[6 + k];
        s += v * v;
    }
    s.sqrt()
}

/// Length vectors of one gradient sample; entries past the shape's count are zero.
pub fn length_vectors(cell_type: CellType, g: &[f64; 9]) -> [f64; 6] {
    let mut v = [0.0; 6];
    if let Some(combos) = length_combinations(cell_type) {
        for (out, c) in v.iter_mut().zip(combos) {
            *out = combined_norm(g, c);
        }
    }
    v
}

const TRI_PAIRS: [[usize; 2]; 3] = [[0, 1], [0, 2], [1, 2]];

const PRISM_TRIPLES: [[usize; 3]; 3] = [[0, 1, 2], [0, 3, 2], [1, 3, 2]];

const TET_TRIPLES: [[usize; 3]; 12] = [
    [0, 5, 1],
    [0, 5, 2],
    [0, 5, 3],
    [0, 5, 4],
    [1, 4, 0],
    [1, 4, 2],
    [1, 4, 3],
    [1, 4, 5],
    [2, 3, 0],
    [2, 3, 1],
    [2, 3, 4],
    [2, 3, 5],
];

const PYR_TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [0, 1, 3],
    [0, 1, 4],
    [0, 1, 5],
    [2, 3, 4],
    [2, 3, 5],
    [4, 5, 2],
    [4, 5, 3],
];

/// Length pairs whose inverse products are summed (2D shapes).
pub(crate) fn ige_pairs(cell_type: CellType) -> &'static [[usize; 2]] {
    match cell_type {
        CellType::Quadrilateral => &[[0, 1]],
        CellType::Triangle => &TRI_PAIRS,
        _ => &[],
    }
}

/// Length triples whose inverse products are summed (3D shapes).
pub(crate) fn ige_triples(cell_type: CellType) -> &'static [[usize; 3]] {
    match cell_type {
        CellType::Hexahedron => &[[0, 1, 2]],
        CellType::Prism => &PRISM_TRIPLES,
        CellType::Tetrahedron => &TET_TRIPLES,
        CellType::Pyramid => &PYR_TRIPLES,
        _ => &[],
    }
}

/// Factor in front of `det * sum(1 / products)`.
pub fn ige_scale(cell_type: CellType) -> f64 {
    match cell_type {
        CellType::Segment => f64::NAN,
        CellType::Quadrilateral | CellType::Hexahedron => 1.0,
        CellType::Triangle | CellType::Prism => C_TRI / 3.0,
        CellType::Tetrahedron => C_TET / 12.0,
        CellType::Pyramid => C_PYR / 8.0,
    }
}

/// IGE from a determinant and the length vectors of the same point.
pub fn ige_from_lengths(cell_type: CellType, det: f64, v: &[f64; 6]) -> f64 {
    let pairs: f64 = ige_pairs(cell_type)
        .iter()
        .map(|p| 1.0 / (v[p[0]] * v[p[1]]))
        .sum();
    let triples: f64 = ige_triples(cell_type)
        .iter()
        .map(|t| 1.0 / (v[t[0]] * v[t[1]] * v[t[2]]))
        .sum();
    ige_scale(cell_type) * det * (pairs + triples)
}

/// IGE at one point.
pub fn ige_value(cell_type: CellType, det: f64, g: &[f64; 9]) -> f64 {
    ige_from_lengths(cell_type, det, &length_vectors(cell_type, g))
}

/// ICN at one point from the ideal determinant and ideal gradient rows.
///
/// In 3D `det^(2/3)` keeps the sign of `det`, so inverted points score below zero.
pub fn icn_value(dimension: usize, det: f64, g: &[f64]) -> f64 {
    let p: f64 = g.iter().map(|x| x * x).sum();
    if dimension == 3 {
        3.0 * det.signum() * (det * det).cbrt() / p
    } else {
        2.0 * det / p
    }
}
