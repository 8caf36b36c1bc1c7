use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use jacobian_quality::bounds::{BoundConfig, BoundContext};
use jacobian_quality::geometry::mapping::HighOrderElement;
use jacobian_quality::geometry::quality::{
    min_icn_measure_with, min_ige_measure_with, min_max_jacobian_determinant_with,
};
use jacobian_quality::geometry::scan::scan_elements;
use jacobian_quality::topology::cell_type::CellType;

fn jittered(ct: CellType, order: u32, amp: f64, seed: u64) -> HighOrderElement {
    let mut rng = SmallRng::seed_from_u64(seed);
    let dim = ct.dimension();
    let mut el = HighOrderElement::from_reference_map(ct, order, |x| *x).unwrap();
    for node in el.nodes_mut() {
        for c in node.iter_mut().take(dim) {
            *c += amp * (2.0 * rng.r#gen::<f64>() - 1.0);
        }
    }
    el
}

fn bench_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_element");
    for ct in [CellType::Triangle, CellType::Tetrahedron, CellType::Hexahedron] {
        let el = jittered(ct, 2, 0.05, 42);
        let mut ctx = BoundContext::default();
        group.bench_with_input(BenchmarkId::new("jacobian", ct.name()), &el, |b, el| {
            b.iter(|| min_max_jacobian_determinant_with(&mut ctx, el, None).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("ige", ct.name()), &el, |b, el| {
            b.iter(|| min_ige_measure_with(&mut ctx, el, true, false, None).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("icn", ct.name()), &el, |b, el| {
            b.iter(|| min_icn_measure_with(&mut ctx, el, true, false, None).unwrap())
        });
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let elements: Vec<_> = (0..64)
        .map(|seed| jittered(CellType::Quadrilateral, 3, 0.05, seed))
        .collect();
    let cfg = BoundConfig::default();
    c.bench_function("scan_64_cubic_quads", |b| {
        b.iter(|| scan_elements(&elements, &cfg, false).unwrap())
    });
}

criterion_group!(benches, bench_single, bench_scan);
criterion_main!(benches);
