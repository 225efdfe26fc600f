use core::fmt;

use nalgebra as na;

use crate::utils::{
    face_key::{cmp_vertices, FaceKey, TetKey},
    types::{Tetrahedron3, Triangle3, Vertex3},
};

/// Below this absolute determinant of the edge-vector matrix a tetrahedron is treated as flat.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// For each face index within a tetrahedron, the vertex indices of that face.
pub(crate) const FACE_SUBINDICES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

/// The sphere through all four vertices of a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circumsphere {
    pub center: Vertex3,
    pub radius_sq: f64,
}

impl Circumsphere {
    /// Computes the circumsphere of `[a, b, c, d]`, `None` if the points are (nearly) coplanar.
    ///
    /// All points are translated relative to `d`, such that the center `x` solves
    /// `2 (v - d) · x = |v - d|²` for `v ∈ {a, b, c}`.
    pub fn new(vertices: &Tetrahedron3) -> Option<Self> {
        let [a, b, c, d] = vertices.map(na::Vector3::<f64>::from);

        let (ad, bd, cd) = (a - d, b - d, c - d);
        let edges = na::Matrix3::from_rows(&[ad.transpose(), bd.transpose(), cd.transpose()]);

        if edges.determinant().abs() < DEGENERACY_TOLERANCE {
            return None;
        }

        let rhs = na::Vector3::new(ad.norm_squared(), bd.norm_squared(), cd.norm_squared()) * 0.5;
        let offset = edges.lu().solve(&rhs)?;

        let radius_sq = offset.norm_squared();
        if !radius_sq.is_finite() {
            return None;
        }

        Some(Self {
            center: (d + offset).into(),
            radius_sq,
        })
    }

    /// Strict containment, points on the sphere are outside.
    #[inline]
    pub fn contains(&self, p: &Vertex3) -> bool {
        dist_sq(&self.center, p) < self.radius_sq
    }
}

#[inline]
pub(crate) fn dist_sq(a: &Vertex3, b: &Vertex3) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Signed volume (times 6) of `[a, b, c, d]`, positive if `d` lies on the
/// side of `(a, b, c)` their counter-clockwise orientation points to.
pub(crate) fn orient_3d(a: &Vertex3, b: &Vertex3, c: &Vertex3, d: &Vertex3) -> f64 {
    let [a, b, c, d] = [a, b, c, d].map(|v| na::Vector3::<f64>::from(*v));
    (b - a).cross(&(c - a)).dot(&(d - a))
}

/// A triangular facet of a tetrahedron.
///
/// Equality is by vertex value and independent of the vertex order.
#[derive(Clone, Copy, Debug)]
pub struct Face {
    vertices: Triangle3,
}

impl Face {
    pub const fn new(vertices: Triangle3) -> Self {
        Self { vertices }
    }

    pub const fn vertices(&self) -> &Triangle3 {
        &self.vertices
    }

    pub fn key(&self) -> FaceKey {
        FaceKey::new(&self.vertices)
    }

    pub fn contains_vertex(&self, p: &Vertex3) -> bool {
        self.vertices.contains(p)
    }
}

impl PartialEq for Face {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.vertices;
        write!(f, "Face: {:?} -> {:?} -> {:?}", a, b, c)
    }
}

/// A single cell of the tetrahedralization.
///
/// The circumsphere is computed once on construction. A degenerate (flat)
/// tetrahedron has no circumcenter and an infinite circumradius, and never
/// contains any point in its circumsphere.
#[derive(Clone, Copy, Debug)]
pub struct Tetrahedron {
    vertices: Tetrahedron3,
    circumsphere: Option<Circumsphere>,
}

impl Tetrahedron {
    pub fn new(vertices: Tetrahedron3) -> Self {
        Self {
            vertices,
            circumsphere: Circumsphere::new(&vertices),
        }
    }

    pub const fn vertices(&self) -> &Tetrahedron3 {
        &self.vertices
    }

    pub const fn circumsphere(&self) -> Option<&Circumsphere> {
        self.circumsphere.as_ref()
    }

    pub fn circumcenter(&self) -> Option<Vertex3> {
        self.circumsphere.map(|s| s.center)
    }

    /// Squared circumradius, infinite for degenerate tetrahedra.
    pub fn circumradius_sq(&self) -> f64 {
        self.circumsphere.map_or(f64::INFINITY, |s| s.radius_sq)
    }

    pub const fn is_degenerate(&self) -> bool {
        self.circumsphere.is_none()
    }

    pub fn key(&self) -> TetKey {
        TetKey::new(&self.vertices)
    }

    /// Check if `p` lies strictly inside the circumsphere.
    pub fn circumsphere_contains(&self, p: &Vertex3) -> bool {
        match &self.circumsphere {
            Some(sphere) => sphere.contains(p),
            None => false,
        }
    }

    /// Check if `p` is one of the four vertices, compared by value.
    pub fn contains_vertex(&self, p: &Vertex3) -> bool {
        self.vertices.contains(p)
    }

    /// Check if `p` lies strictly inside the tetrahedron itself.
    pub fn contains_point(&self, p: &Vertex3) -> bool {
        let [a, b, c, d] = &self.vertices;
        let orientation = orient_3d(a, b, c, d);

        if orientation == 0.0 {
            return false;
        }

        [
            orient_3d(p, b, c, d),
            orient_3d(a, p, c, d),
            orient_3d(a, b, p, d),
            orient_3d(a, b, c, p),
        ]
        .iter()
        .all(|&o| o * orientation > 0.0)
    }

    /// The four faces, in the order `(0, 1, 2)`, `(0, 1, 3)`, `(0, 2, 3)`, `(1, 2, 3)`.
    pub fn faces(&self) -> [Face; 4] {
        FACE_SUBINDICES.map(|idxs| Face::new(idxs.map(|i| self.vertices[i])))
    }

    /// Check if both tetrahedra share exactly one face, i.e. three distinct vertices.
    ///
    /// Repeated vertices count once, so the check stays symmetric for
    /// tetrahedra built from duplicate points.
    pub fn is_adjacent(&self, other: &Self) -> bool {
        let mut shared: Vec<&Vertex3> = self
            .vertices
            .iter()
            .filter(|v| other.contains_vertex(v))
            .collect();
        shared.sort_by(|a, b| cmp_vertices(a, b));
        shared.dedup_by(|a, b| cmp_vertices(a, b).is_eq());

        shared.len() == 3
    }
}

/// Value equality, independent of the vertex order.
impl PartialEq for Tetrahedron {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for Tetrahedron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.vertices;
        write!(f, "Tetrahedron: {:?} -> {:?} -> {:?} -> {:?}", a, b, c, d)?;

        match self.circumcenter() {
            Some(center) => write!(f, " (circumcenter {:?})", center),
            None => write!(f, " (degenerate)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    const UNIT_TET: Tetrahedron3 = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];

    #[test]
    fn test_circumsphere_unit_tet() {
        let tet = Tetrahedron::new(UNIT_TET);

        let center = tet.circumcenter().unwrap();
        for c in center {
            assert_approx_eq!(c, 0.5);
        }
        assert_approx_eq!(tet.circumradius_sq(), 0.75);

        // all vertices lie on the sphere
        for v in tet.vertices() {
            assert_approx_eq!(dist_sq(&center, v), 0.75);
        }
    }

    #[test]
    fn test_circumsphere_independent_of_vertex_order() {
        let [a, b, c, d] = UNIT_TET;
        let tet = Tetrahedron::new(UNIT_TET);
        let shuffled = Tetrahedron::new([c, d, b, a]);

        let center = tet.circumcenter().unwrap();
        let shuffled_center = shuffled.circumcenter().unwrap();
        for i in 0..3 {
            assert_approx_eq!(center[i], shuffled_center[i]);
        }
        assert_eq!(tet, shuffled);
    }

    #[test]
    fn test_circumsphere_contains_is_strict() {
        let tet = Tetrahedron::new(UNIT_TET);

        assert!(tet.circumsphere_contains(&[0.5, 0.5, 0.5]));
        assert!(tet.circumsphere_contains(&[0.9, 0.9, 0.9]));
        assert!(!tet.circumsphere_contains(&[2.0, 2.0, 2.0]));

        // (1, 1, 1) lies exactly on the sphere
        assert!(!tet.circumsphere_contains(&[1.0, 1.0, 1.0]));
        // so do the vertices themselves
        for v in tet.vertices() {
            assert!(!tet.circumsphere_contains(v));
        }
    }

    #[test]
    fn test_degenerate_tet() {
        let flat = Tetrahedron::new([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]);

        assert!(flat.is_degenerate());
        assert!(flat.circumcenter().is_none());
        assert_eq!(flat.circumradius_sq(), f64::INFINITY);
        assert!(!flat.circumsphere_contains(&[0.5, 0.5, 0.0]));
        assert!(!flat.circumsphere_contains(&[1e9, -1e9, 0.0]));
        assert!(!flat.contains_point(&[0.5, 0.5, 0.0]));
    }

    #[test]
    fn test_nearly_flat_tet_is_degenerate() {
        let flat = Tetrahedron::new([
            [0.0, 0.0, 0.0],
            [1e-5, 0.0, 0.0],
            [0.0, 1e-5, 0.0],
            [0.0, 0.0, 1e-5],
        ]);

        assert!(flat.is_degenerate());
    }

    #[test]
    fn test_contains_vertex() {
        let tet = Tetrahedron::new(UNIT_TET);

        assert!(tet.contains_vertex(&[0.0, 1.0, 0.0]));
        assert!(tet.contains_vertex(&[-0.0, 1.0, 0.0]));
        assert!(!tet.contains_vertex(&[0.0, 1.0, 1e-12]));
    }

    #[test]
    fn test_contains_point() {
        let tet = Tetrahedron::new(UNIT_TET);

        assert!(tet.contains_point(&[0.1, 0.1, 0.1]));
        assert!(!tet.contains_point(&[0.5, 0.5, 0.5]));
        assert!(!tet.contains_point(&[0.0, 0.0, 0.0]));

        let [a, b, c, d] = UNIT_TET;
        assert!(Tetrahedron::new([b, a, c, d]).contains_point(&[0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_faces_order() {
        let [a, b, c, d] = UNIT_TET;
        let faces = Tetrahedron::new(UNIT_TET).faces();

        assert_eq!(faces[0].vertices(), &[a, b, c]);
        assert_eq!(faces[1].vertices(), &[a, b, d]);
        assert_eq!(faces[2].vertices(), &[a, c, d]);
        assert_eq!(faces[3].vertices(), &[b, c, d]);

        // every face misses exactly one vertex
        for (face, missing) in faces.iter().zip([d, c, b, a]) {
            assert!(!face.contains_vertex(&missing));
        }
    }

    #[test]
    fn test_face_equality_is_unordered() {
        let [a, b, c, _] = UNIT_TET;
        assert_eq!(Face::new([a, b, c]), Face::new([c, a, b]));
        assert_ne!(Face::new([a, b, c]), Face::new([a, b, [0.0, 0.0, 1.0]]));
    }

    #[test]
    fn test_adjacency() {
        let [a, b, c, d] = UNIT_TET;
        let tet = Tetrahedron::new(UNIT_TET);

        let across_abc = Tetrahedron::new([a, c, b, [0.2, 0.2, -1.0]]);
        let sharing_edge = Tetrahedron::new([a, b, [3.0, 3.0, 3.0], [0.2, 0.2, -1.0]]);
        let same = Tetrahedron::new([d, c, b, a]);

        assert!(tet.is_adjacent(&across_abc));
        assert!(!tet.is_adjacent(&sharing_edge));
        assert!(!tet.is_adjacent(&same));
        assert!(!tet.is_adjacent(&tet));

        for (x, y) in [
            (&tet, &across_abc),
            (&tet, &sharing_edge),
            (&across_abc, &sharing_edge),
            (&tet, &same),
        ] {
            assert_eq!(x.is_adjacent(y), y.is_adjacent(x));
        }
    }

    #[test]
    fn test_adjacency_with_repeated_vertex() {
        let [a, b, c, d] = UNIT_TET;
        let tet = Tetrahedron::new(UNIT_TET);
        let repeated = Tetrahedron::new([a, a, b, c]);
        let twice_repeated = Tetrahedron::new([a, a, b, b]);

        assert!(repeated.is_degenerate());
        assert!(tet.is_adjacent(&repeated));
        assert!(repeated.is_adjacent(&tet));
        assert!(!tet.is_adjacent(&twice_repeated));
        assert!(!twice_repeated.is_adjacent(&tet));

        let other = Tetrahedron::new([a, b, d, d]);
        assert_eq!(repeated.is_adjacent(&other), other.is_adjacent(&repeated));
    }
}
