//! Curved element mappings and their quality.
//!
//! [`mapping`] samples the Jacobian of a high-order element, [`measures`]
//! evaluates IGE and ICN pointwise, [`quality`] turns both into certified
//! bounds and [`scan`] runs them over many elements.

pub mod mapping;
pub mod measures;
pub mod quality;
pub mod scan;
