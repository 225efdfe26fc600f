use core::cmp::Ordering;

use super::types::Vertex3;

/// Maps `-0.0` onto `0.0`, so that keys agree with `==` on coordinates.
#[inline]
fn canonical_coord(x: f64) -> f64 {
    x + 0.0
}

/// Lexicographic total order on vertex coordinates.
pub fn cmp_vertices(a: &Vertex3, b: &Vertex3) -> Ordering {
    let [ax, ay, az] = a.map(canonical_coord);
    let [bx, by, bz] = b.map(canonical_coord);

    ax.total_cmp(&bx)
        .then_with(|| ay.total_cmp(&by))
        .then_with(|| az.total_cmp(&bz))
}

/// Order independent, hashable identity of a simplex given by `N` vertices.
///
/// Two keys are equal iff the simplices consist of the same vertex values,
/// regardless of the order the vertices are given in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimplexKey<const N: usize>([[u64; 3]; N]);

/// Key of a triangle, used to match faces between tetrahedra.
pub type FaceKey = SimplexKey<3>;
/// Key of a tetrahedron.
pub type TetKey = SimplexKey<4>;

impl<const N: usize> SimplexKey<N> {
    pub fn new(vertices: &[Vertex3; N]) -> Self {
        let mut sorted = *vertices;
        sorted.sort_by(cmp_vertices);

        Self(sorted.map(|v| v.map(|x| canonical_coord(x).to_bits())))
    }
}
