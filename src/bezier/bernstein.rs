//! Pointwise Bernstein basis functions and their gradients.

use super::exponents::{Exponent, factor_alpha, require_factors};
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;

/// Binomial coefficient as a float.
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut r = 1.0;
    for i in 0..k {
        r = r * (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// Multinomial coefficient `(sum alpha)! / prod(alpha_i!)`.
pub fn multinomial(alpha: &[u32]) -> f64 {
    let mut acc = 1.0;
    let mut total = 0;
    for &a in alpha {
        total += a;
        acc *= binomial(total, a);
    }
    acc
}

fn factor_value_gradient(axes: &[usize], degree: u32, e: &Exponent, x: &[f64; 3]) -> (f64, [f64; 3]) {
    let (alpha, len) = factor_alpha(axes, degree, e);
    let mut lambda = [0.0; 4];
    lambda[0] = 1.0 - axes.iter().map(|&a| x[a]).sum::<f64>();
    for (m, &a) in axes.iter().enumerate() {
        lambda[m + 1] = x[a];
    }

    let scale = multinomial(&alpha[..len]);
    let mut powers = [1.0; 4];
    for m in 0..len {
        powers[m] = lambda[m].powi(alpha[m] as i32);
    }
    let value = scale * powers[..len].iter().product::<f64>();

    // d/d(lambda_m) of the factor
    let partial = |m: usize| -> f64 {
        if alpha[m] == 0 {
            return 0.0;
        }
        let mut p = scale * alpha[m] as f64 * lambda[m].powi(alpha[m] as i32 - 1);
        for (q, pw) in powers[..len].iter().enumerate() {
            if q != m {
                p *= pw;
            }
        }
        p
    };
    let d0 = partial(0);
    let mut grad = [0.0; 3];
    for (m, &a) in axes.iter().enumerate() {
        grad[a] = partial(m + 1) - d0;
    }
    (value, grad)
}

/// Value and reference gradient of one basis function, given the factor layout.
pub(crate) fn value_gradient(
    factors: &[&[usize]],
    degree: u32,
    e: &Exponent,
    x: &[f64; 3],
) -> (f64, [f64; 3]) {
    let mut parts = [(1.0, [0.0; 3]); 3];
    for (g, axes) in factors.iter().enumerate() {
        parts[g] = factor_value_gradient(axes, degree, e, x);
    }
    let parts = &parts[..factors.len()];

    let value: f64 = parts.iter().map(|p| p.0).product();
    let mut grad = [0.0; 3];
    for (g, (_, dg)) in parts.iter().enumerate() {
        let others: f64 = parts
            .iter()
            .enumerate()
            .filter(|(h, _)| *h != g)
            .map(|(_, p)| p.0)
            .product();
        for d in 0..3 {
            grad[d] += dg[d] * others;
        }
    }
    (value, grad)
}

pub(crate) fn value_only(factors: &[&[usize]], degree: u32, e: &Exponent, x: &[f64; 3]) -> f64 {
    factors
        .iter()
        .map(|axes| {
            let (alpha, len) = factor_alpha(axes, degree, e);
            let l0 = 1.0 - axes.iter().map(|&a| x[a]).sum::<f64>();
            let mut v = multinomial(&alpha[..len]) * l0.powi(alpha[0] as i32);
            for (m, &a) in axes.iter().enumerate() {
                v *= x[a].powi(alpha[m + 1] as i32);
            }
            v
        })
        .product()
}

/// Value of the Bernstein function `e` of degree `degree` at reference point `x`.
pub fn bernstein_value(
    cell_type: CellType,
    degree: u32,
    e: &Exponent,
    x: &[f64; 3],
) -> Result<f64, QualityError> {
    let factors = require_factors(cell_type, degree)?;
    Ok(value_only(factors, degree, e, x))
}

/// Reference gradient of the Bernstein function `e` at `x`.
pub fn bernstein_gradient(
    cell_type: CellType,
    degree: u32,
    e: &Exponent,
    x: &[f64; 3],
) -> Result<[f64; 3], QualityError> {
    let factors = require_factors(cell_type, degree)?;
    Ok(value_gradient(factors, degree, e, x).1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::exponents::exponents;

    #[test]
    fn binomials() {
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(6, 0), 1.0);
        assert_eq!(binomial(3, 4), 0.0);
        assert_eq!(multinomial(&[1, 1, 1]), 6.0);
        assert_eq!(multinomial(&[2, 0, 2]), 6.0);
    }

    #[test]
    fn partition_of_unity() {
        let x = [0.21, 0.33, 0.17];
        for ct in [
            CellType::Segment,
            CellType::Triangle,
            CellType::Quadrilateral,
            CellType::Tetrahedron,
            CellType::Hexahedron,
            CellType::Prism,
        ] {
            for n in 0..4 {
                let sum: f64 = exponents(ct, n)
                    .unwrap()
                    .iter()
                    .map(|e| bernstein_value(ct, n, e, &x).unwrap())
                    .sum();
                assert!((sum - 1.0).abs() < 1e-12, "{ct:?} degree {n}: {sum}");
            }
        }
    }

    #[test]
    fn gradients_match_finite_differences() {
        let x = [0.2, 0.3, 0.25];
        let h = 1e-6;
        for ct in [CellType::Triangle, CellType::Tetrahedron, CellType::Prism, CellType::Hexahedron] {
            let dim = ct.dimension();
            for e in exponents(ct, 3).unwrap() {
                let g = bernstein_gradient(ct, 3, &e, &x).unwrap();
                for d in 0..dim {
                    let mut xp = x;
                    let mut xm = x;
                    xp[d] += h;
                    xm[d] -= h;
                    let fd = (bernstein_value(ct, 3, &e, &xp).unwrap()
                        - bernstein_value(ct, 3, &e, &xm).unwrap())
                        / (2.0 * h);
                    assert!((fd - g[d]).abs() < 1e-6, "{ct:?} {e:?} axis {d}");
                }
            }
        }
    }

    #[test]
    fn value_paths_agree() {
        let factors = crate::bezier::exponents::factor_axes(CellType::Prism).unwrap();
        let x = [0.1, 0.6, 0.8];
        for e in exponents(CellType::Prism, 2).unwrap() {
            let a = value_only(factors, 2, &e, &x);
            let b = value_gradient(factors, 2, &e, &x).0;
            assert!((a - b).abs() < 1e-14);
        }
    }
}
