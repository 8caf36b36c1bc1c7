//! Cell type metadata for curved elements.
//!
//! Reference elements (vertex order):
//! - Segment: `[0, 1]`
//! - Triangle: `(0,0), (1,0), (0,1)`
//! - Quadrilateral: `(0,0), (1,0), (1,1), (0,1)`
//! - Tetrahedron: `(0,0,0), (1,0,0), (0,1,0), (0,0,1)`
//! - Hexahedron: `z=0` face counter-clockwise, then the `z=1` face
//! - Prism: triangle at `z=0`, then triangle at `z=1`
//! - Pyramid: base `[-1,1]^2` counter-clockwise, apex `(0,0,1)`

use serde::{Deserialize, Serialize};

/// Element shapes known to the bound engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellType {
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
}

impl CellType {
    /// Every shape, in declaration order.
    pub const ALL: [CellType; 7] = [
        CellType::Segment,
        CellType::Triangle,
        CellType::Quadrilateral,
        CellType::Tetrahedron,
        CellType::Hexahedron,
        CellType::Prism,
        CellType::Pyramid,
    ];

    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> usize {
        match self {
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron | CellType::Prism | CellType::Pyramid => 3,
        }
    }

    /// Number of vertices of the reference element.
    pub fn num_corners(self) -> usize {
        match self {
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral | CellType::Tetrahedron => 4,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
        }
    }

    /// Vertices of the reference element, padded to three coordinates.
    pub fn reference_corners(self) -> &'static [[f64; 3]] {
        match self {
            CellType::Segment => &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            CellType::Triangle => &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            CellType::Quadrilateral => &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            CellType::Tetrahedron => &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            CellType::Hexahedron => &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
            CellType::Prism => &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
            CellType::Pyramid => &[
                [-1.0, -1.0, 0.0],
                [1.0, -1.0, 0.0],
                [1.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    /// Barycenter of the reference element.
    pub fn barycenter(self) -> [f64; 3] {
        let corners = self.reference_corners();
        let inv = 1.0 / corners.len() as f64;
        let mut c = [0.0; 3];
        for p in corners {
            for d in 0..3 {
                c[d] += p[d] * inv;
            }
        }
        c
    }

    /// Whether the reference element is a simplex.
    pub fn is_simplex(self) -> bool {
        matches!(
            self,
            CellType::Segment | CellType::Triangle | CellType::Tetrahedron
        )
    }

    /// Short lowercase name used in log messages.
    pub fn name(self) -> &'static str {
        match self {
            CellType::Segment => "segment",
            CellType::Triangle => "triangle",
            CellType::Quadrilateral => "quadrilateral",
            CellType::Tetrahedron => "tetrahedron",
            CellType::Hexahedron => "hexahedron",
            CellType::Prism => "prism",
            CellType::Pyramid => "pyramid",
        }
    }
}
