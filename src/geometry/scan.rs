//! Quality scan over a batch of elements.
//!
//! A failure on one element never aborts the scan: it is logged, the
//! element's Jacobian is reported as [`JacobianBounds::UNAVAILABLE`] and the
//! error text is kept on its report.

use crate::bounds::{BoundConfig, BoundContext};
use crate::geometry::mapping::HighOrderElement;
use crate::geometry::quality::{
    JacobianBounds, MeasureBound, min_icn_measure_with, min_ige_measure_with,
    min_max_jacobian_determinant_with,
};
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use serde::{Deserialize, Serialize};

/// Quality of one element of a scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementReport {
    /// Position of the element in the scanned slice.
    pub index: usize,
    pub cell_type: CellType,
    pub order: u32,
    pub jacobian: JacobianBounds,
    /// `None` for curves and failed elements.
    pub ige: Option<MeasureBound>,
    pub icn: Option<MeasureBound>,
    pub error: Option<String>,
}

impl ElementReport {
    fn failed(index: usize, element: &HighOrderElement, error: &QualityError) -> Self {
        log::error!(
            "quality of element {index} ({} order {}) unavailable: {error}",
            element.cell_type().name(),
            element.order()
        );
        ElementReport {
            index,
            cell_type: element.cell_type(),
            order: element.order(),
            jacobian: JacobianBounds::UNAVAILABLE,
            ige: None,
            icn: None,
            error: Some(error.to_string()),
        }
    }

    /// True when the Jacobian is certified positive.
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.jacobian.is_valid()
    }
}

fn measure_element(
    ctx: &mut BoundContext,
    index: usize,
    element: &HighOrderElement,
    reversed_ok: bool,
) -> Result<ElementReport, QualityError> {
    let jacobian = min_max_jacobian_determinant_with(ctx, element, None)?;
    let (ige, icn) = if element.cell_type().dimension() < 2 {
        (None, None)
    } else {
        let known_valid = jacobian.is_valid();
        (
            Some(min_ige_measure_with(ctx, element, known_valid, reversed_ok, None)?),
            Some(min_icn_measure_with(ctx, element, known_valid, reversed_ok, None)?),
        )
    };
    Ok(ElementReport {
        index,
        cell_type: element.cell_type(),
        order: element.order(),
        jacobian,
        ige,
        icn,
        error: None,
    })
}

fn scan_one(
    ctx: &mut BoundContext,
    index: usize,
    element: &HighOrderElement,
    reversed_ok: bool,
) -> ElementReport {
    measure_element(ctx, index, element, reversed_ok).unwrap_or_else(|e| {
        ctx.reset_pool();
        ElementReport::failed(index, element, &e)
    })
}

/// Jacobian, IGE and ICN bounds of every element, in input order.
///
/// Only an invalid `config` is an error.
pub fn scan_elements(
    elements: &[HighOrderElement],
    config: &BoundConfig,
    reversed_ok: bool,
) -> Result<Vec<ElementReport>, QualityError> {
    let mut ctx = BoundContext::new(*config)?;
    let reports: Vec<_> = elements
        .iter()
        .enumerate()
        .map(|(i, el)| scan_one(&mut ctx, i, el, reversed_ok))
        .collect();
    log::info!(
        "scanned {} elements, {} valid",
        reports.len(),
        reports.iter().filter(|r| r.is_valid()).count()
    );
    Ok(reports)
}

/// Parallel [`scan_elements`] with one context per worker.
#[cfg(feature = "rayon")]
pub fn par_scan_elements(
    elements: &[HighOrderElement],
    config: &BoundConfig,
    reversed_ok: bool,
) -> Result<Vec<ElementReport>, QualityError> {
    use rayon::prelude::*;

    config.validate()?;
    Ok(elements
        .par_iter()
        .enumerate()
        .map_init(
            || BoundContext::new(*config),
            |ctx, (i, el)| match ctx {
                Ok(ctx) => scan_one(ctx, i, el, reversed_ok),
                Err(e) => ElementReport::failed(i, el, e),
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::quality::BoundStatus;

    fn straight(ct: CellType) -> HighOrderElement {
        HighOrderElement::from_reference_map(ct, 1, |x| *x).unwrap()
    }

    #[test]
    fn reports_follow_input_order() {
        let elements = vec![
            straight(CellType::Triangle),
            straight(CellType::Segment),
            straight(CellType::Tetrahedron),
        ];
        let reports = scan_elements(&elements, &BoundConfig::default(), false).unwrap();
        assert_eq!(reports.len(), 3);
        for (i, r) in reports.iter().enumerate() {
            assert_eq!(r.index, i);
            assert!(r.is_valid());
        }
        assert!(reports[1].ige.is_none());
        let ige = reports[2].ige.unwrap();
        assert_eq!(ige.status, BoundStatus::Converged);
        assert!(ige.value > 0.0);
    }

    #[test]
    fn folded_element_scores_zero() {
        // Pulling the third corner through the first edge folds the triangle.
        let folded = HighOrderElement::from_reference_map(CellType::Triangle, 2, |x| {
            [x[0], x[1] - 1.5 * x[0] * x[1], 0.0]
        })
        .unwrap();
        let reports = scan_elements(&[folded], &BoundConfig::default(), true).unwrap();
        assert!(!reports[0].jacobian.is_valid());
        assert_eq!(reports[0].ige.unwrap().value, 0.0);
        assert_eq!(reports[0].ige.unwrap().status, BoundStatus::InvalidElement);
    }

    #[test]
    fn invalid_config_is_the_only_error() {
        let cfg = BoundConfig {
            max_subdivisions: 0,
            ..Default::default()
        };
        assert!(scan_elements(&[], &cfg, false).is_err());
    }
}
