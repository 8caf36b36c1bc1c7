//! Degree-raising product operator.
//!
//! For Bernstein functions of degree `n` on one factor,
//! `B_a * B_b = [M(a) M(b) / M(a+b)] B_{a+b}` with `M` the multinomial of the
//! barycentric multi-index and `B_{a+b}` of degree `2n`; tensor shapes multiply
//! the factor weights. The product coefficients are laid out in the order of
//! the degree `2n` (or `3n`) basis, so they align with any coefficient vector
//! of that basis.

use super::bernstein::multinomial;
use super::exponents::{Exponent, exponents, factor_alpha, require_factors};
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use hashbrown::HashMap;
use itertools::iproduct;
use once_cell::sync::OnceCell;

#[derive(Clone, Copy, Debug)]
struct ProductTerm {
    target: u32,
    inputs: [u32; 3],
    weight: f64,
}

#[derive(Debug)]
struct ProductTable {
    num_targets: usize,
    terms: Vec<ProductTerm>,
}

/// Products of two or three polynomials of one basis, in Bernstein form.
#[derive(Debug)]
pub struct BezierRaiser {
    cell_type: CellType,
    degree: u32,
    exponents: Vec<Exponent>,
    pairs: OnceCell<ProductTable>,
    triples: OnceCell<ProductTable>,
}

impl BezierRaiser {
    pub fn new(cell_type: CellType, degree: u32) -> Result<Self, QualityError> {
        Ok(BezierRaiser {
            cell_type,
            degree,
            exponents: exponents(cell_type, degree)?,
            pairs: OnceCell::new(),
            triples: OnceCell::new(),
        })
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Degree of the input polynomials.
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Length of each input coefficient vector.
    pub fn num_coeffs(&self) -> usize {
        self.exponents.len()
    }

    /// Length of the product of `factors` polynomials (2 or 3).
    pub fn num_raised_coeffs(&self, factors: usize) -> Result<usize, QualityError> {
        Ok(self.table(factors)?.num_targets)
    }

    fn table(&self, factors: usize) -> Result<&ProductTable, QualityError> {
        match factors {
            2 => self.pairs.get_or_try_init(|| self.build(2)),
            3 => self.triples.get_or_try_init(|| self.build(3)),
            _ => Err(QualityError::SizeMismatch {
                context: "product arity",
                expected: 3,
                found: factors,
            }),
        }
    }

    fn build(&self, arity: usize) -> Result<ProductTable, QualityError> {
        let axes = require_factors(self.cell_type, self.degree)?;
        let target_degree = self.degree * arity as u32;
        let targets = exponents(self.cell_type, target_degree)?;
        let index: HashMap<Exponent, u32> = targets
            .iter()
            .enumerate()
            .map(|(i, e)| (*e, i as u32))
            .collect();

        let n = self.exponents.len();
        let third = if arity == 3 { n } else { 1 };
        let mut terms = Vec::with_capacity(n * n * third);
        for (i, j, k) in iproduct!(0..n, 0..n, 0..third) {
            let picked = [i, j, k];
            let mut sum = [0u32; 3];
            for &p in &picked[..arity] {
                for d in 0..3 {
                    sum[d] += self.exponents[p][d];
                }
            }
            let target = *index.get(&sum).ok_or_else(|| {
                QualityError::InvariantViolation(format!(
                    "product exponent {sum:?} missing from degree {target_degree} basis"
                ))
            })?;

            let mut weight = 1.0;
            for factor in axes {
                for &p in &picked[..arity] {
                    let (alpha, len) = factor_alpha(factor, self.degree, &self.exponents[p]);
                    weight *= multinomial(&alpha[..len]);
                }
                let (alpha, len) = factor_alpha(factor, target_degree, &sum);
                weight /= multinomial(&alpha[..len]);
            }
            terms.push(ProductTerm {
                target,
                inputs: [i as u32, j as u32, k as u32],
                weight,
            });
        }
        Ok(ProductTable {
            num_targets: targets.len(),
            terms,
        })
    }

    fn check(&self, v: &[f64]) -> Result<(), QualityError> {
        if v.len() != self.num_coeffs() {
            return Err(QualityError::SizeMismatch {
                context: "degree raising",
                expected: self.num_coeffs(),
                found: v.len(),
            });
        }
        Ok(())
    }

    /// Coefficients of `a * b` in the degree `2n` basis.
    pub fn compute_coeff2(&self, a: &[f64], b: &[f64], out: &mut Vec<f64>) -> Result<(), QualityError> {
        self.check(a)?;
        self.check(b)?;
        let table = self.table(2)?;
        out.clear();
        out.resize(table.num_targets, 0.0);
        for t in &table.terms {
            out[t.target as usize] += t.weight * a[t.inputs[0] as usize] * b[t.inputs[1] as usize];
        }
        Ok(())
    }

    /// Coefficients of `a * b * c` in the degree `3n` basis.
    pub fn compute_coeff3(
        &self,
        a: &[f64],
        b: &[f64],
        c: &[f64],
        out: &mut Vec<f64>,
    ) -> Result<(), QualityError> {
        self.check(a)?;
        self.check(b)?;
        self.check(c)?;
        let table = self.table(3)?;
        out.clear();
        out.resize(table.num_targets, 0.0);
        for t in &table.terms {
            let [i, j, k] = t.inputs;
            out[t.target as usize] += t.weight * a[i as usize] * b[j as usize] * c[k as usize];
        }
        Ok(())
    }
}
