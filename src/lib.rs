#![cfg_attr(docsrs, feature(doc_cfg))]
//! # jacobian-quality
//!
//! jacobian-quality computes certified bounds on the validity and shape
//! quality of curved (high-order) finite elements. Given the nodes of a
//! Lagrange element it returns a guaranteed range of the Jacobian
//! determinant and guaranteed lower bounds of two scale-invariant quality
//! measures:
//!
//! - **IGE**, the inverse gradient error: 1 for the ideal (equilateral or
//!   cubic) shape, 0 for a degenerate one;
//! - **ICN**, the inverse condition number of the ideal-shape Jacobian.
//!
//! ## How the bounds are certified
//! The quality polynomials are expanded in a Bernstein basis, whose
//! coefficients enclose the values (convex hull) and agree with them at the
//! corners. Cells whose coefficient range is too loose are split
//! best-first until the gap between the certified bound and the sampled
//! corner values falls under a tolerance, or until a split budget runs out.
//! IGE and ICN are rational; their bounds come from ratios of coefficient
//! vectors after raising products to a common degree.
//!
//! ## Features
//! - `rayon`: parallel batch scan, [`geometry::scan::par_scan_elements`].
//! - `strict-invariants` / `check-invariants`: run the
//!   [`DebugInvariants`] checks in release builds.
//!
//! ## Determinism
//!
//! Results depend only on the element and the [`bounds::BoundConfig`]; the
//! basis cache is shared but immutable once built. Property tests fix their
//! `SmallRng` seeds.

pub mod bezier;
pub mod bounds;
pub mod debug_invariants;
pub mod geometry;
pub mod quality_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use quality_error::QualityError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::bezier::{BasisFactory, BezierBasis, BezierRaiser, global};
    pub use crate::bounds::{
        BoundConfig, BoundContext, BoundSide, CellSpace, Measure, QualityCell, bound_rational,
        finalize_min, finalize_min_max, subdivide_domains,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::mapping::{HighOrderElement, MappingSampler};
    pub use crate::geometry::quality::{
        BoundStatus, JacobianBounds, MeasureBound, min_icn_measure, min_ige_measure,
        min_max_jacobian_determinant,
    };
    #[cfg(feature = "rayon")]
    pub use crate::geometry::scan::par_scan_elements;
    pub use crate::geometry::scan::{ElementReport, scan_elements};
    pub use crate::quality_error::QualityError;
    pub use crate::topology::cell_type::CellType;
}
