#![allow(dead_code)]
use jacobian_quality::geometry::mapping::HighOrderElement;
use jacobian_quality::topology::cell_type::CellType;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Straight element on the reference shape.
pub fn straight(ct: CellType, order: u32) -> HighOrderElement {
    HighOrderElement::from_reference_map(ct, order, |x| *x).unwrap()
}

/// Quadratic triangle whose det is `1 - 4 b^2 x y`: corners at 1, minimum
/// `1 - b^2` at the middle of the hypotenuse.
pub fn pinched_triangle(b: f64) -> HighOrderElement {
    HighOrderElement::from_reference_map(CellType::Triangle, 2, |x| {
        [x[0] + b * x[1] * x[1], x[1] + b * x[0] * x[0], 0.0]
    })
    .unwrap()
}

/// Reference element with every node moved by up to `amp` per coordinate.
pub fn jittered(ct: CellType, order: u32, amp: f64, seed: u64) -> HighOrderElement {
    let mut rng = SmallRng::seed_from_u64(seed);
    let dim = ct.dimension();
    let mut el = straight(ct, order);
    for node in el.nodes_mut() {
        for c in node.iter_mut().take(dim) {
            *c += amp * (2.0 * rng.r#gen::<f64>() - 1.0);
        }
    }
    el
}

/// Shapes with a Bernstein basis.
pub const SUPPORTED: [CellType; 6] = [
    CellType::Segment,
    CellType::Triangle,
    CellType::Quadrilateral,
    CellType::Tetrahedron,
    CellType::Hexahedron,
    CellType::Prism,
];
