//! Bernstein multi-index sets.
//!
//! Every supported shape is a product of barycentric factors: a segment is a
//! single 1-simplex, a quadrilateral two of them, a prism a triangle times a
//! segment, and so on. A basis function of degree `n` is indexed by an
//! [`Exponent`] holding the power of each reference coordinate; the power of
//! the implicit first barycentric coordinate of a factor is `n` minus the sum
//! of that factor's entries.
//!
//! Ordering: the corner multi-indices come first, in reference vertex order,
//! followed by the remaining ones in lexicographic `(w, v, u)` order.

use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use itertools::iproduct;

/// Powers of the reference coordinates `(u, v, w)`; unused axes are zero.
pub type Exponent = [u32; 3];

/// Axes of each barycentric factor, or `None` for shapes whose basis is not polynomial.
pub(crate) fn factor_axes(cell_type: CellType) -> Option<&'static [&'static [usize]]> {
    match cell_type {
        CellType::Segment => Some(&[&[0]]),
        CellType::Triangle => Some(&[&[0, 1]]),
        CellType::Quadrilateral => Some(&[&[0], &[1]]),
        CellType::Tetrahedron => Some(&[&[0, 1, 2]]),
        CellType::Hexahedron => Some(&[&[0], &[1], &[2]]),
        CellType::Prism => Some(&[&[0, 1], &[2]]),
        CellType::Pyramid => None,
    }
}

pub(crate) fn require_factors(
    cell_type: CellType,
    degree: u32,
) -> Result<&'static [&'static [usize]], QualityError> {
    factor_axes(cell_type).ok_or(QualityError::UnsupportedElement {
        cell_type,
        order: degree,
    })
}

/// Full barycentric multi-index of one factor; returns the used length.
pub(crate) fn factor_alpha(axes: &[usize], degree: u32, e: &Exponent) -> ([u32; 4], usize) {
    let mut alpha = [0u32; 4];
    let used: u32 = axes.iter().map(|&a| e[a]).sum();
    alpha[0] = degree.saturating_sub(used);
    for (m, &a) in axes.iter().enumerate() {
        alpha[m + 1] = e[a];
    }
    (alpha, axes.len() + 1)
}

fn admissible(factors: &[&[usize]], degree: u32, e: &Exponent) -> bool {
    factors
        .iter()
        .all(|axes| axes.iter().map(|&a| e[a]).sum::<u32>() <= degree)
}

/// Multi-indices of the degree-`degree` Bernstein basis on `cell_type`, corners first.
pub fn exponents(cell_type: CellType, degree: u32) -> Result<Vec<Exponent>, QualityError> {
    let factors = require_factors(cell_type, degree)?;
    let dim = cell_type.dimension();

    let mut out: Vec<Exponent> = Vec::new();
    for c in cell_type.reference_corners() {
        let e = [0, 1, 2].map(|d| (c[d] as u32) * degree);
        if !out.contains(&e) {
            out.push(e);
        }
    }
    let num_corners = out.len();

    let range = |d: usize| if d < dim { 0..=degree } else { 0..=0 };
    for (w, v, u) in iproduct!(range(2), range(1), range(0)) {
        let e = [u, v, w];
        if admissible(factors, degree, &e) && !out[..num_corners].contains(&e) {
            out.push(e);
        }
    }
    Ok(out)
}

/// Number of distinct corner coefficients of a degree-`degree` basis.
pub fn num_basis_corners(cell_type: CellType, degree: u32) -> usize {
    if degree == 0 { 1 } else { cell_type.num_corners() }
}

/// Reference point interpolated by the basis function with multi-index `e`.
pub fn lagrange_point(cell_type: CellType, degree: u32, e: &Exponent) -> [f64; 3] {
    if degree == 0 {
        return cell_type.barycenter();
    }
    let n = degree as f64;
    [e[0] as f64 / n, e[1] as f64 / n, e[2] as f64 / n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(ct: CellType, n: u32) -> usize {
        exponents(ct, n).unwrap().len()
    }

    #[test]
    fn basis_sizes() {
        for n in 0..5u32 {
            let m = n as usize;
            assert_eq!(count(CellType::Segment, n), m + 1);
            assert_eq!(count(CellType::Triangle, n), (m + 1) * (m + 2) / 2);
            assert_eq!(count(CellType::Quadrilateral, n), (m + 1) * (m + 1));
            assert_eq!(count(CellType::Tetrahedron, n), (m + 1) * (m + 2) * (m + 3) / 6);
            assert_eq!(count(CellType::Hexahedron, n), (m + 1).pow(3));
            assert_eq!(count(CellType::Prism, n), (m + 1) * (m + 1) * (m + 2) / 2);
        }
    }

    #[test]
    fn corners_come_first() {
        let e = exponents(CellType::Quadrilateral, 3).unwrap();
        assert_eq!(&e[..4], &[[0, 0, 0], [3, 0, 0], [3, 3, 0], [0, 3, 0]]);
        let e = exponents(CellType::Prism, 2).unwrap();
        assert_eq!(e[3], [0, 0, 2]);
        assert_eq!(e[5], [0, 2, 2]);
        for ct in [CellType::Triangle, CellType::Tetrahedron, CellType::Hexahedron] {
            let e = exponents(ct, 2).unwrap();
            for (i, c) in ct.reference_corners().iter().enumerate() {
                assert_eq!(lagrange_point(ct, 2, &e[i]), *c);
            }
        }
    }

    #[test]
    fn no_duplicates() {
        let e = exponents(CellType::Tetrahedron, 3).unwrap();
        let set: hashbrown::HashSet<_> = e.iter().copied().collect();
        assert_eq!(set.len(), e.len());
    }

    #[test]
    fn degree_zero_has_single_coefficient() {
        let e = exponents(CellType::Hexahedron, 0).unwrap();
        assert_eq!(e, vec![[0, 0, 0]]);
        assert_eq!(num_basis_corners(CellType::Hexahedron, 0), 1);
        assert_eq!(
            lagrange_point(CellType::Triangle, 0, &e[0]),
            CellType::Triangle.barycenter()
        );
    }

    #[test]
    fn pyramid_is_rejected() {
        assert!(matches!(
            exponents(CellType::Pyramid, 2),
            Err(QualityError::UnsupportedElement { order: 2, .. })
        ));
    }
}
