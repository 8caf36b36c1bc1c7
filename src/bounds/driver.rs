//! Best-first subdivision driver.
//!
//! The live cells are refined in two phases sharing one working set:
//! 1. pop the cell with the smallest certified minimum until it satisfies
//!    the stopping test;
//! 2. re-rank the survivors by certified maximum and repeat. Only Jacobian
//!    searches run this phase; IGE and ICN bounds are one-sided.
//!
//! Each phase stops after [`BoundConfig::max_subdivisions`] splits; hitting
//! the cap is logged and reported, and the bounds found so far stay valid.
//!
//! [`BoundConfig::max_subdivisions`]: super::config::BoundConfig::max_subdivisions

use super::cell::{CellSpace, Measure, QualityCell};
use super::context::BoundContext;
use crate::debug_invariants::DebugInvariants;
use crate::quality_error::QualityError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Search state published to observers after every split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunningBounds {
    /// Splits performed so far, over both phases.
    pub step: usize,
    /// Smallest corner value seen so far.
    pub min_l: f64,
    /// Largest corner value seen so far.
    pub max_l: f64,
    /// Smallest certified minimum over live cells.
    pub certified_min: f64,
    /// Largest certified maximum over live cells.
    pub certified_max: f64,
}

/// Work done by [`subdivide_domains`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubdivisionReport {
    pub min_splits: usize,
    pub max_splits: usize,
    /// False when a phase stopped on the split cap.
    pub converged: bool,
}

impl SubdivisionReport {
    pub fn splits(&self) -> usize {
        self.min_splits + self.max_splits
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Min,
    Max,
}

struct Ranked {
    key: f64,
    cell: QualityCell,
}

impl Ranked {
    fn new(phase: Phase, cell: QualityCell) -> Self {
        let key = match phase {
            Phase::Min => -cell.min_b(),
            Phase::Max => cell.max_b(),
        };
        Ranked { key, cell }
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key.total_cmp(&other.key) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.total_cmp(&other.key)
    }
}

type Observer<'a> = Option<&'a mut dyn FnMut(&RunningBounds)>;

fn certified_range<'a>(cells: impl Iterator<Item = &'a QualityCell>) -> (f64, f64) {
    cells.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
        (lo.min(c.min_b()), hi.max(c.max_b()))
    })
}

/// Refines `cells` in place with both phases.
pub fn subdivide_domains(
    ctx: &mut BoundContext,
    space: &CellSpace,
    cells: &mut Vec<QualityCell>,
) -> Result<SubdivisionReport, QualityError> {
    subdivide_domains_observed(ctx, space, cells, None)
}

/// [`subdivide_domains`] with a callback invoked after every split.
pub fn subdivide_domains_observed(
    ctx: &mut BoundContext,
    space: &CellSpace,
    cells: &mut Vec<QualityCell>,
    mut observer: Observer<'_>,
) -> Result<SubdivisionReport, QualityError> {
    if cells.is_empty() {
        log::warn!("no {} cells to subdivide", space.measure().name());
        return Ok(SubdivisionReport {
            converged: true,
            ..Default::default()
        });
    }
    let (mut min_l, mut max_l) = cells.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), c| (lo.min(c.min_l()), hi.max(c.max_l())),
    );
    let mut step = 0;
    let (min_splits, min_done) = run_phase(
        ctx,
        space,
        cells,
        Phase::Min,
        (&mut min_l, &mut max_l),
        &mut step,
        &mut observer,
    )?;
    // IGE and ICN only certify a minimum.
    let (max_splits, max_done) = if space.measure() == Measure::Jacobian {
        run_phase(
            ctx,
            space,
            cells,
            Phase::Max,
            (&mut min_l, &mut max_l),
            &mut step,
            &mut observer,
        )?
    } else {
        (0, true)
    };
    Ok(SubdivisionReport {
        min_splits,
        max_splits,
        converged: min_done && max_done,
    })
}

fn run_phase(
    ctx: &mut BoundContext,
    space: &CellSpace,
    cells: &mut Vec<QualityCell>,
    phase: Phase,
    (min_l, max_l): (&mut f64, &mut f64),
    step: &mut usize,
    observer: &mut Observer<'_>,
) -> Result<(usize, bool), QualityError> {
    let cap = ctx.config().max_subdivisions;
    let mut heap: BinaryHeap<Ranked> = cells.drain(..).map(|c| Ranked::new(phase, c)).collect();
    let mut splits = 0;
    let mut converged = true;

    while let Some(top) = heap.peek() {
        if top.cell.bounds_ok(ctx, *min_l, *max_l) {
            break;
        }
        if splits >= cap {
            converged = false;
            break;
        }
        let Some(Ranked { cell, .. }) = heap.pop() else {
            break;
        };
        let children = match cell.split(ctx, space) {
            Ok(children) => children,
            Err(e) => {
                for ranked in heap {
                    let _ = ranked.cell.release(&mut ctx.pool);
                }
                return Err(e);
            }
        };
        splits += 1;
        *step += 1;
        for child in children {
            child.debug_assert_invariants();
            *min_l = min_l.min(child.min_l());
            *max_l = max_l.max(child.max_l());
            heap.push(Ranked::new(phase, child));
        }
        log::trace!(
            "{} {:?} split {}: corners [{}, {}], {} live cells",
            space.measure().name(),
            phase,
            splits,
            min_l,
            max_l,
            heap.len()
        );
        if let Some(obs) = observer.as_mut() {
            let (certified_min, certified_max) = certified_range(heap.iter().map(|r| &r.cell));
            obs(&RunningBounds {
                step: *step,
                min_l: *min_l,
                max_l: *max_l,
                certified_min,
                certified_max,
            });
        }
    }

    if !converged {
        let (lo, hi) = certified_range(heap.iter().map(|r| &r.cell));
        log::warn!(
            "{} bound on {:?} not converged after {} splits ({:?} phase, {} live cells, certified [{}, {}])",
            space.measure().name(),
            space.cell_type(),
            splits,
            phase,
            heap.len(),
            lo,
            hi
        );
    }
    cells.extend(heap.into_iter().map(|r| r.cell));
    ctx.pool.debug_assert_invariants();
    Ok((splits, converged))
}

/// Smallest certified minimum over `cells`; releases their buffers.
pub fn finalize_min(ctx: &mut BoundContext, cells: Vec<QualityCell>) -> Result<f64, QualityError> {
    finalize_min_max(ctx, cells).map(|(min, _)| min)
}

/// Certified `(min, max)` over `cells`; releases their buffers.
pub fn finalize_min_max(
    ctx: &mut BoundContext,
    cells: Vec<QualityCell>,
) -> Result<(f64, f64), QualityError> {
    if cells.is_empty() {
        return Err(QualityError::InvariantViolation(
            "no cells left to finalize".into(),
        ));
    }
    let range = certified_range(cells.iter());
    for cell in cells {
        cell.release(&mut ctx.pool)?;
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::factory::global;
    use crate::bounds::config::BoundConfig;
    use crate::topology::cell_type::CellType;

    fn segment_cells(ctx: &mut BoundContext, space: &CellSpace, samples: &[f64]) -> Vec<QualityCell> {
        vec![QualityCell::from_lagrange(ctx, space, samples, None).unwrap()]
    }

    #[test]
    fn positive_polynomial_is_certified() {
        // (t - 1/2)^2 + 1/4 on [0, 1]: range [1/4, 1/2].
        let mut ctx = BoundContext::default();
        let space = CellSpace::jacobian(global(), CellType::Segment, 2).unwrap();
        let f = |t: f64| (t - 0.5) * (t - 0.5) + 0.25;
        let mut cells = segment_cells(&mut ctx, &space, &[f(0.0), f(1.0), f(0.5)]);
        let report = subdivide_domains(&mut ctx, &space, &mut cells).unwrap();
        assert!(report.converged);
        assert!(report.splits() > 0);
        let (min, max) = finalize_min_max(&mut ctx, cells).unwrap();
        assert!(min <= 0.25 + 1e-12 && min > 0.0);
        assert!((max - 0.5).abs() < 1e-12);
        assert_eq!(ctx.pool.live(), 0);
    }

    #[test]
    fn cap_stops_the_search() {
        // (t - 1/3)^2 touches zero away from every dyadic corner.
        let cfg = BoundConfig {
            max_subdivisions: 20,
            ..Default::default()
        };
        let mut ctx = BoundContext::new(cfg).unwrap();
        let space = CellSpace::jacobian(global(), CellType::Segment, 2).unwrap();
        let f = |t: f64| (t - 1.0 / 3.0) * (t - 1.0 / 3.0);
        let mut cells = segment_cells(&mut ctx, &space, &[f(0.0), f(1.0), f(0.5)]);
        let report = subdivide_domains(&mut ctx, &space, &mut cells).unwrap();
        assert!(!report.converged);
        assert_eq!(report.min_splits, 20);
        let min = finalize_min(&mut ctx, cells).unwrap();
        assert!(min.is_finite() && min <= 0.0);
    }

    #[test]
    fn observer_sees_tightening_bounds() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::jacobian(global(), CellType::Segment, 3).unwrap();
        // Coefficients with an interior dip: 1 at both ends, dipping in between.
        let mut cells = vec![QualityCell::from_bezier(&mut ctx, &space, &[1.0, 1.0, -0.5, 0.2], None).unwrap()];
        let mut seen = Vec::new();
        let mut record = |rb: &RunningBounds| seen.push(*rb);
        subdivide_domains_observed(&mut ctx, &space, &mut cells, Some(&mut record)).unwrap();
        assert!(!seen.is_empty());
        for pair in seen.windows(2) {
            assert_eq!(pair[1].step, pair[0].step + 1);
            assert!(pair[1].certified_min >= pair[0].certified_min - 1e-12);
            assert!(pair[1].certified_max <= pair[0].certified_max + 1e-12);
            assert!(pair[1].min_l <= pair[0].min_l);
        }
        finalize_min(&mut ctx, cells).unwrap();
    }

    #[test]
    fn oscillating_cells_stop_at_the_cap() {
        let cfg = BoundConfig {
            max_subdivisions: 15,
            ..Default::default()
        };
        let mut ctx = BoundContext::new(cfg).unwrap();
        let space = CellSpace::jacobian(global(), CellType::Segment, 9).unwrap();
        let mut cells: Vec<_> = (1..=3)
            .map(|k| {
                let amp = k as f64;
                // Positive corners over alternating interior coefficients.
                let coeffs: Vec<f64> = (0..10)
                    .map(|i| if i < 2 || i % 2 == 1 { amp } else { -amp })
                    .collect();
                QualityCell::from_bezier(&mut ctx, &space, &coeffs, None).unwrap()
            })
            .collect();
        let report = subdivide_domains(&mut ctx, &space, &mut cells).unwrap();
        assert!(!report.converged);
        assert_eq!(report.min_splits, 15);
        assert!(report.max_splits <= 15);
        let (min, max) = finalize_min_max(&mut ctx, cells).unwrap();
        assert!(min.is_finite() && max.is_finite());
        assert!(min <= max);
        assert_eq!(ctx.pool.live(), 0);
    }

    #[test]
    fn measure_searches_skip_the_max_phase() {
        let cfg = BoundConfig {
            max_subdivisions: 3,
            ..Default::default()
        };
        let mut ctx = BoundContext::new(cfg).unwrap();
        let space = CellSpace::for_element(global(), Measure::Ige, CellType::Quadrilateral, 2).unwrap();
        let n = space.grad_basis().unwrap().num_coeffs();
        let det: Vec<f64> = (0..space.det_basis().num_coeffs())
            .map(|i| if i < 4 { 1.0 } else { 0.05 })
            .collect();
        // Identity gradient rows: du = (1, 0, 0), dv = (0, 1, 0).
        let mut grad = vec![0.0; n * space.grad_cols()];
        grad[..n].fill(1.0);
        grad[4 * n..5 * n].fill(1.0);
        let mut cells = vec![QualityCell::from_bezier(&mut ctx, &space, &det, Some(&grad)).unwrap()];
        let report = subdivide_domains(&mut ctx, &space, &mut cells).unwrap();
        assert_eq!(report.max_splits, 0);
        assert!(report.min_splits <= 3);
        finalize_min(&mut ctx, cells).unwrap();
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut ctx = BoundContext::default();
        let space = CellSpace::jacobian(global(), CellType::Triangle, 1).unwrap();
        let mut cells = Vec::new();
        let report = subdivide_domains(&mut ctx, &space, &mut cells).unwrap();
        assert!(report.converged);
        assert!(finalize_min(&mut ctx, cells).is_err());
    }
}
