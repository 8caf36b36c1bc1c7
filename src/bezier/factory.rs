//! Process-wide cache of bases, raisers and mapping samplers.
//!
//! Entries are immutable once built and handed out as `Arc`s, so the cache can
//! be shared freely between threads. Coefficient pools are deliberately not
//! cached here; see [`BoundContext`](crate::bounds::context::BoundContext).

use super::basis::BezierBasis;
use super::raiser::BezierRaiser;
use crate::geometry::mapping::MappingSampler;
use crate::quality_error::QualityError;
use crate::topology::cell_type::CellType;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static FACTORY: Lazy<BasisFactory> = Lazy::new(BasisFactory::default);

/// Shared factory used by the high-level quality functions.
pub fn global() -> &'static BasisFactory {
    &FACTORY
}

/// Key of a mapping sampler: shape, mapping order, sample degree.
type SamplerKey = (CellType, u32, u32);

#[derive(Debug, Default)]
pub struct BasisFactory {
    bases: DashMap<(CellType, u32), Arc<BezierBasis>>,
    raisers: DashMap<(CellType, u32), Arc<BezierRaiser>>,
    samplers: DashMap<SamplerKey, Arc<MappingSampler>>,
}

// Values are built outside the map guards, so concurrent first requests may
// build twice; the first insertion wins.
fn cached<K, V>(
    map: &DashMap<K, Arc<V>>,
    key: K,
    build: impl FnOnce() -> Result<V, QualityError>,
) -> Result<Arc<V>, QualityError>
where
    K: std::hash::Hash + Eq,
{
    if let Some(v) = map.get(&key) {
        return Ok(Arc::clone(v.value()));
    }
    let built = Arc::new(build()?);
    Ok(Arc::clone(map.entry(key).or_insert(built).value()))
}

impl BasisFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bezier_basis(&self, cell_type: CellType, degree: u32) -> Result<Arc<BezierBasis>, QualityError> {
        cached(&self.bases, (cell_type, degree), || {
            BezierBasis::new(cell_type, degree)
        })
    }

    pub fn raiser(&self, cell_type: CellType, degree: u32) -> Result<Arc<BezierRaiser>, QualityError> {
        cached(&self.raisers, (cell_type, degree), || {
            BezierRaiser::new(cell_type, degree)
        })
    }

    /// Sampler of the order-`order` mapping at the degree-`sample_degree` lattice.
    pub fn mapping_sampler(
        &self,
        cell_type: CellType,
        order: u32,
        sample_degree: u32,
    ) -> Result<Arc<MappingSampler>, QualityError> {
        if let Some(v) = self.samplers.get(&(cell_type, order, sample_degree)) {
            return Ok(Arc::clone(v.value()));
        }
        let map_basis = self.bezier_basis(cell_type, order)?;
        cached(&self.samplers, (cell_type, order, sample_degree), || {
            MappingSampler::new(&map_basis, sample_degree)
        })
    }

    /// Number of cached bases.
    pub fn num_bases(&self) -> usize {
        self.bases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookups_share_instances() {
        let factory = BasisFactory::new();
        let a = factory.bezier_basis(CellType::Triangle, 2).unwrap();
        let b = factory.bezier_basis(CellType::Triangle, 2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.num_bases(), 1);
        let r1 = factory.raiser(CellType::Hexahedron, 1).unwrap();
        let r2 = factory.raiser(CellType::Hexahedron, 1).unwrap();
        assert!(Arc::ptr_eq(&r1, &r2));
    }

    #[test]
    fn failures_are_not_cached() {
        let factory = BasisFactory::new();
        assert!(factory.bezier_basis(CellType::Pyramid, 1).is_err());
        assert_eq!(factory.num_bases(), 0);
    }

    #[test]
    fn shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| global().bezier_basis(CellType::Tetrahedron, 2).unwrap()))
            .collect();
        let bases: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for b in &bases[1..] {
            assert!(Arc::ptr_eq(&bases[0], b));
        }
    }
}
