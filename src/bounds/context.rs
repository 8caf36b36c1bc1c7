//! Per-task state of a bound search.

use super::config::BoundConfig;
use super::pool::{CoeffPool, PoolStats};
use crate::quality_error::QualityError;

/// Reusable temporaries for the rational bound combinations.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    /// Length-vector coefficients, column-major, one column per length.
    pub lengths: Vec<f64>,
    pub sum: Vec<f64>,
    pub product: Vec<f64>,
    pub acc: Vec<f64>,
    pub den1: Vec<f64>,
    pub den2: Vec<f64>,
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
}

/// Everything one search mutates: the coefficient pool, scratch space and
/// the stopping rules.
///
/// Contexts are cheap to create and must not be shared between concurrent
/// searches; give each worker its own.
#[derive(Debug, Default)]
pub struct BoundContext {
    pub(crate) pool: CoeffPool,
    pub(crate) scratch: Scratch,
    config: BoundConfig,
}

impl BoundContext {
    pub fn new(config: BoundConfig) -> Result<Self, QualityError> {
        config.validate()?;
        Ok(Self {
            pool: CoeffPool::new(),
            scratch: Scratch::default(),
            config,
        })
    }

    pub fn config(&self) -> &BoundConfig {
        &self.config
    }

    pub fn pool(&self) -> &CoeffPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut CoeffPool {
        &mut self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Drops every buffer, live or free. Used after a failed search.
    pub fn reset_pool(&mut self) {
        self.pool = CoeffPool::new();
    }
}
