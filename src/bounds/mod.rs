//! Certified bounds by adaptive subdivision.
//!
//! - [`rational`]: bound of a ratio of two Bernstein polynomials from their coefficients.
//! - [`cell`]: quality cells for the Jacobian, IGE and ICN.
//! - [`driver`]: two-phase best-first refinement of a set of cells.
//! - [`pool`], [`context`], [`config`]: buffers, per-task state and stopping rules.

pub mod cell;
pub mod config;
pub mod context;
pub mod driver;
pub mod pool;
pub mod rational;

pub use cell::{CellBounds, CellSpace, Measure, QualityCell};
pub use config::BoundConfig;
pub use context::BoundContext;
pub use driver::{
    RunningBounds, SubdivisionReport, finalize_min, finalize_min_max, subdivide_domains,
    subdivide_domains_observed,
};
pub use pool::{BufferId, BufferKind, CoeffPool, PoolStats};
pub use rational::{BoundSide, bound_rational};
