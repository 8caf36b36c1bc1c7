mod util;

use jacobian_quality::bezier::basis::subdomain_maps;
use jacobian_quality::bezier::factory::global;
use jacobian_quality::geometry::quality::{
    min_icn_measure, min_ige_measure, min_max_jacobian_determinant, quality_orders,
    sample_icn_measure, sample_ige_measure, sample_jacobian, sampled_range,
};
use jacobian_quality::topology::cell_type::CellType;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use util::jittered;

const SAMPLE_DEGREE: u32 = 6;

fn shapes() -> impl Strategy<Value = CellType> {
    prop_oneof![
        Just(CellType::Triangle),
        Just(CellType::Quadrilateral),
        Just(CellType::Tetrahedron),
        Just(CellType::Hexahedron),
        Just(CellType::Prism),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn jacobian_bounds_bracket_samples(ct in shapes(), order in 1u32..=2, seed in any::<u64>()) {
        let el = jittered(ct, order, 0.08, seed);
        let jac = min_max_jacobian_determinant(&el).unwrap();
        let (lo, hi) = sampled_range(&sample_jacobian(&el, SAMPLE_DEGREE, None).unwrap());
        prop_assert!(jac.min <= lo + 1e-9, "{:?}: {} > {}", ct, jac.min, lo);
        prop_assert!(jac.max >= hi - 1e-9, "{:?}: {} < {}", ct, jac.max, hi);
    }

    #[test]
    fn measure_bounds_stay_below_samples(ct in shapes(), seed in any::<u64>()) {
        let el = jittered(ct, 2, 0.05, seed);
        prop_assume!(min_max_jacobian_determinant(&el).unwrap().is_valid());

        let ige = min_ige_measure(&el, true, false).unwrap();
        let (lo, _) = sampled_range(&sample_ige_measure(&el, SAMPLE_DEGREE).unwrap());
        prop_assert!(ige.value >= 0.0);
        prop_assert!(ige.value <= lo + 1e-9, "{:?} IGE: {} > {}", ct, ige.value, lo);

        let icn = min_icn_measure(&el, true, false).unwrap();
        let (lo, _) = sampled_range(&sample_icn_measure(&el, SAMPLE_DEGREE).unwrap());
        prop_assert!(icn.value >= 0.0);
        prop_assert!(icn.value <= lo + 1e-9, "{:?} ICN: {} > {}", ct, icn.value, lo);
    }
}

#[test]
fn corner_coefficients_are_corner_values() {
    let mut rng = SmallRng::seed_from_u64(7);
    for ct in util::SUPPORTED {
        for order in 1..=2 {
            let (det_degree, _) = quality_orders(ct, order).unwrap();
            let basis = global().bezier_basis(ct, det_degree).unwrap();
            let lag: Vec<f64> = (0..basis.num_coeffs()).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let bez = basis.lag_to_bez_vec(&lag, 1).unwrap();
            let corners = basis.num_corners();
            for k in 0..corners {
                assert!((bez[k] - lag[k]).abs() < 1e-8, "{ct:?} degree {det_degree} corner {k}");
            }
            if corners > 1 {
                for (k, x) in ct.reference_corners().iter().enumerate() {
                    let v = basis.evaluate(&bez, x).unwrap();
                    assert!((v - lag[k]).abs() < 1e-8, "{ct:?} degree {det_degree} corner {k}");
                }
            }
        }
    }
}

#[test]
fn subdivision_never_widens_the_hull() {
    let mut rng = SmallRng::seed_from_u64(11);
    for ct in util::SUPPORTED {
        let basis = global().bezier_basis(ct, 2).unwrap();
        let parent: Vec<f64> = (0..basis.num_coeffs()).map(|_| rng.r#gen::<f64>()).collect();
        let (lo, hi) = sampled_range(&parent);
        for child in basis.subdivide(&parent, 1).unwrap() {
            let (clo, chi) = sampled_range(&child);
            assert!(clo >= lo - 1e-12 && chi <= hi + 1e-12, "{ct:?}");
        }
    }
}

#[test]
fn children_reproduce_the_parent_polynomial() {
    let mut rng = SmallRng::seed_from_u64(13);
    for ct in util::SUPPORTED {
        let basis = global().bezier_basis(ct, 3).unwrap();
        let parent: Vec<f64> = (0..basis.num_coeffs()).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let children = basis.subdivide(&parent, 1).unwrap();
        let maps = subdomain_maps(ct);
        assert_eq!(children.len(), maps.len());
        for (child, map) in children.iter().zip(&maps) {
            for x in basis.lagrange_points().iter().step_by(3) {
                let here = basis.evaluate(child, x).unwrap();
                let there = basis.evaluate(&parent, &map.apply(x)).unwrap();
                assert!((here - there).abs() < 1e-10, "{ct:?}: {here} vs {there}");
            }
        }
    }
}
