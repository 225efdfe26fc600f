use std::collections::HashMap;

use crate::{
    bounds::BoundingBox,
    tetrahedron::{Face, Tetrahedron},
    utils::{
        face_key::FaceKey,
        types::{Tetrahedron3, Vertex3, VertexIdx},
    },
    voronoi::{voronoi_edges, Segment},
};
use anyhow::Result;
use log::{debug, error, warn};
use rayon::prelude::*;

/// Relative slack of the Delaunay validators, to not report rounding noise as a violation.
const VALIDATION_TOLERANCE: f64 = 1e-6;

/// Directions and stretch factors of the super-tetrahedron vertices.
///
/// Scaled by `s`, the hull of these contains the regular tetrahedron with vertices at
/// `±4s` and hence strictly encloses the cube `[-s, s]^3`. The stretch factors
/// differ to break the symmetry with axis aligned inputs.
const SUPER_TET_DIRECTIONS: [(f64, Vertex3); 4] = [
    (4.0, [1.0, 1.0, 1.0]),
    (4.5, [1.0, -1.0, -1.0]),
    (5.0, [-1.0, 1.0, -1.0]),
    (5.5, [-1.0, -1.0, 1.0]),
];

/// The topological change caused by inserting a single vertex.
///
/// Owned snapshot, unaffected by later insertions. `created[i]` is built from
/// `cavity_boundary[i]` and the inserted vertex.
#[derive(Clone, Debug, Default)]
pub struct InsertionDelta {
    /// Tetrahedra whose circumsphere contained the vertex.
    pub removed: Vec<Tetrahedron>,
    /// Faces belonging to exactly one removed tetrahedron.
    pub cavity_boundary: Vec<Face>,
    /// Tetrahedra connecting the cavity boundary to the vertex.
    pub created: Vec<Tetrahedron>,
}

impl InsertionDelta {
    /// No tetrahedron was removed, the insertion did not change the mesh.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.created.is_empty()
    }

    pub fn num_removed(&self) -> usize {
        self.removed.len()
    }

    pub fn num_created(&self) -> usize {
        self.created.len()
    }
}

impl std::fmt::Display for InsertionDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Removed {} tets, cavity of {} faces, created {} tets",
            self.removed.len(),
            self.cavity_boundary.len(),
            self.created.len()
        )
    }
}

/// Collects the faces of `bad` that belong to exactly one of them, in order of appearance.
pub(crate) fn cavity_boundary(bad: &[Tetrahedron]) -> Vec<Face> {
    let mut face_count: HashMap<FaceKey, usize> = HashMap::with_capacity(bad.len() * 4);
    let mut faces: Vec<(FaceKey, Face)> = Vec::with_capacity(bad.len() * 4);

    for tet in bad {
        for face in tet.faces() {
            let key = face.key();
            let count = face_count.entry(key).or_insert(0);
            if *count == 0 {
                faces.push((key, face));
            }
            *count += 1;
        }
    }

    faces
        .into_iter()
        .filter(|(key, _)| face_count[key] == 1)
        .map(|(_, face)| face)
        .collect()
}

/// Vertices of a super-tetrahedron enclosing the cube of half size `scale` around `center`.
fn super_tetrahedron(center: &Vertex3, scale: f64) -> Tetrahedron3 {
    SUPER_TET_DIRECTIONS.map(|(stretch, dir)| {
        [0, 1, 2].map(|axis| center[axis] + scale * stretch * dir[axis])
    })
}

/// A 3D Delaunay Tetrahedralization, built incrementally with the Bowyer-Watson algorithm.
///
/// The mesh starts out as a single super-tetrahedron and every inserted vertex
/// has to lie inside of it. Tetrahedra touching the super-tetrahedron are kept
/// internally but are not part of [`Tetrahedralization::tets`].
///
/// ```
/// use tetvoro::{BoundingBox, Tetrahedralization};
///
/// let vertices = vec![
///     [0.0, 0.0, -2.0],
///     [-0.5, 1.0, 0.5],
///     [0.0, 2.5, 2.5],
///     [2.0, 3.0, 5.0],
///     [4.0, 2.5, 9.5],
///     [1.0, 1.5, 6.5],
///     [4.5, 0.5, 5.0],
///     [2.5, -0.5, 2.0],
///     [1.5, 1.5, 3.0],
///     [3.0, 1.0, 4.0],
/// ];
///
/// let mut tetrahedralization = Tetrahedralization::new(20.0).unwrap();
/// for v in &vertices {
///     let delta = tetrahedralization.insert_vertex(*v).unwrap();
///     println!("{}", delta);
/// }
/// assert_eq!(tetrahedralization.par_is_delaunay(), 1.0);
///
/// let bbox = BoundingBox::from_vertices(&vertices).unwrap();
/// let edges = tetrahedralization.voronoi_edges(&bbox);
/// assert!(edges.iter().all(|e| bbox.contains(&e.start) && bbox.contains(&e.end)));
/// ```
#[derive(Clone, Debug)]
pub struct Tetrahedralization {
    super_vertices: Tetrahedron3,
    tets: Vec<Tetrahedron>,
    vertices: Vec<Vertex3>,
    /// Indices of vertices that changed the mesh
    used_vertices: Vec<VertexIdx>,
    /// Indices of vertices that were inside no circumsphere, i.e. not part of the mesh
    ignored_vertices: Vec<VertexIdx>,
    time_inserting: u128,
}

/// Create a new [`Tetrahedralization`] containing the given vertices.
///
/// Evaluates to an `anyhow::Result<Tetrahedralization>`.
///
/// ## Example
/// ```
/// # use tetvoro::tetrahedralization;
/// let vertices = [[0.0, 9.9, 4.2], [6.9, 12.3, 3.8], [5.2, 3.33, 1.92], [1.0, 1.0, 1.0]];
/// let t = tetrahedralization!(&vertices).unwrap();
/// assert!(t.num_real_tets() > 0);
/// // with an explicit super-tetrahedron scale
/// let t = tetrahedralization!(&vertices, scale = 50.0).unwrap();
/// assert_eq!(t.num_vertices(), 4);
/// ```
#[macro_export]
macro_rules! tetrahedralization {
    ($vertices:expr) => {{
        $crate::Tetrahedralization::from_vertices($vertices, None)
    }};
    ($vertices:expr, scale = $scale:expr) => {{
        $crate::Tetrahedralization::from_vertices($vertices, Some($scale))
    }};
}

impl Tetrahedralization {
    /// Starts with a super-tetrahedron enclosing the cube `[-scale, scale]^3`.
    pub fn new(scale: f64) -> Result<Self> {
        Self::centered([0.0; 3], scale)
    }

    /// Starts with a super-tetrahedron enclosing `bbox`, using twice its size as scale.
    pub fn enclosing(bbox: &BoundingBox) -> Result<Self> {
        Self::centered(bbox.center(), 2.0 * bbox.size())
    }

    /// Starts with a super-tetrahedron enclosing the cube of half size `scale` around `center`.
    pub fn centered(center: Vertex3, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(anyhow::Error::msg(format!(
                "Super-tetrahedron scale must be positive and finite, got {scale}"
            )));
        }
        if center.iter().any(|c| !c.is_finite()) {
            return Err(anyhow::Error::msg(format!(
                "Super-tetrahedron center must be finite, got {center:?}"
            )));
        }

        let super_vertices = super_tetrahedron(&center, scale);
        if super_vertices.iter().flatten().any(|c| !c.is_finite()) {
            anyhow::bail!(
                "Super-tetrahedron of scale {scale} around {center:?} overflows: {super_vertices:?}"
            );
        }

        Ok(Self {
            super_vertices,
            tets: vec![Tetrahedron::new(super_vertices)],
            vertices: Vec::new(),
            used_vertices: Vec::new(),
            ignored_vertices: Vec::new(),
            time_inserting: 0,
        })
    }

    /// Tetrahedralizes `vertices` in the given order.
    ///
    /// Without a `scale`, twice the largest absolute coordinate is used (at least `1`).
    pub fn from_vertices(vertices: &[Vertex3], scale: Option<f64>) -> Result<Self> {
        let scale = scale.unwrap_or_else(|| {
            vertices
                .iter()
                .flatten()
                .fold(0.5, |acc: f64, c| acc.max(c.abs()))
                * 2.0
        });

        let mut tetrahedralization = Self::new(scale)?;
        tetrahedralization.insert_vertices(vertices)?;

        Ok(tetrahedralization)
    }

    pub const fn super_vertices(&self) -> &Tetrahedron3 {
        &self.super_vertices
    }

    /// All inserted vertices, in insertion order.
    pub const fn vertices(&self) -> &Vec<Vertex3> {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub const fn used_vertices(&self) -> &Vec<VertexIdx> {
        &self.used_vertices
    }

    pub fn num_ignored_vertices(&self) -> usize {
        self.ignored_vertices.len()
    }

    /// The number of live tetrahedra, including the ones touching the super-tetrahedron.
    pub fn num_tets(&self) -> usize {
        self.tets.len()
    }

    /// The number of tetrahedra, without the ones touching the super-tetrahedron.
    pub fn num_real_tets(&self) -> usize {
        self.tets.iter().filter(|t| !self.touches_super(t)).count()
    }

    /// All live tetrahedra, including the ones touching the super-tetrahedron.
    pub fn all_tets(&self) -> &[Tetrahedron] {
        &self.tets
    }

    /// Get the tetrahedra of the tetrahedralization.
    ///
    /// Does not include tetrahedra with a super-tetrahedron vertex. Those stay
    /// part of the mesh, so further vertices can be inserted afterwards.
    pub fn tets(&self) -> Vec<Tetrahedron> {
        self.tets
            .iter()
            .filter(|t| !self.touches_super(t))
            .copied()
            .collect()
    }

    /// Check if `tet` has one of the super-tetrahedron vertices.
    pub fn touches_super(&self, tet: &Tetrahedron) -> bool {
        self.super_vertices.iter().any(|v| tet.contains_vertex(v))
    }

    /// Check if `v` lies strictly inside the super-tetrahedron.
    pub fn encloses(&self, v: &Vertex3) -> bool {
        Tetrahedron::new(self.super_vertices).contains_point(v)
    }

    /// Inserts a single vertex using the Bowyer-Watson method.
    ///
    /// Every tetrahedron whose circumsphere strictly contains `v` is removed, and
    /// the resulting cavity is filled with tetrahedra connecting its boundary
    /// faces to `v`. A vertex on a circumsphere leaves that tetrahedron intact.
    ///
    /// Errors only for non-finite coordinates, in which case the mesh is unchanged.
    pub fn insert_vertex(&mut self, v: Vertex3) -> Result<InsertionDelta> {
        if v.iter().any(|c| !c.is_finite()) {
            return Err(anyhow::Error::msg(format!(
                "Cannot insert vertex with non-finite coordinates {v:?}"
            )));
        }

        if !self.encloses(&v) {
            warn!("Vertex {v:?} lies outside the super-tetrahedron");
        }

        let now = std::time::Instant::now();

        let (removed, kept): (Vec<Tetrahedron>, Vec<Tetrahedron>) = std::mem::take(&mut self.tets)
            .into_iter()
            .partition(|tet| tet.circumsphere_contains(&v));
        self.tets = kept;

        let cavity_boundary = cavity_boundary(&removed);

        let created: Vec<Tetrahedron> = cavity_boundary
            .iter()
            .map(|face| {
                let [a, b, c] = *face.vertices();
                Tetrahedron::new([a, b, c, v])
            })
            .collect();

        for tet in created.iter().filter(|tet| tet.is_degenerate()) {
            warn!("Created degenerate {tet}");
        }

        self.tets.extend_from_slice(&created);

        let v_idx = self.vertices.len();
        self.vertices.push(v);

        if removed.is_empty() {
            warn!("Vertex {v:?} is inside no circumsphere, cavity is empty");
            self.ignored_vertices.push(v_idx);
        } else {
            self.used_vertices.push(v_idx);
        }

        let elapsed = now.elapsed().as_micros();
        self.time_inserting += elapsed;

        let delta = InsertionDelta {
            removed,
            cavity_boundary,
            created,
        };
        debug!("Inserted vertex {v_idx} in {elapsed} μs: {delta}");

        Ok(delta)
    }

    /// Inserts vertices one by one, in the given order.
    ///
    /// Stops at the first vertex that cannot be inserted.
    pub fn insert_vertices(&mut self, vertices: &[Vertex3]) -> Result<Vec<InsertionDelta>> {
        let deltas = vertices
            .iter()
            .map(|&v| self.insert_vertex(v))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "{} vertices inserted, insertions computed in {} μs",
            self.vertices.len(),
            self.time_inserting
        );

        Ok(deltas)
    }

    /// Voronoi edges of the current tetrahedralization, clipped to `bbox`.
    pub fn voronoi_edges(&self, bbox: &BoundingBox) -> Vec<Segment> {
        voronoi_edges(&self.tets(), bbox)
    }

    /// Check if `v` lies inside the circumsphere of `tet`, by more than rounding noise.
    fn violates(tet: &Tetrahedron, v: &Vertex3) -> bool {
        if tet.contains_vertex(v) {
            return false;
        }

        match tet.circumsphere() {
            Some(sphere) => {
                let dist_sq = (0..3).map(|i| (v[i] - sphere.center[i]).powi(2)).sum::<f64>();
                sphere.radius_sq - dist_sq > VALIDATION_TOLERANCE * sphere.radius_sq
            }
            None => false,
        }
    }

    fn used_vertex_violating(&self, tet: &Tetrahedron) -> Option<VertexIdx> {
        self.used_vertices
            .iter()
            .copied()
            .find(|&v_idx| Self::violates(tet, &self.vertices[v_idx]))
    }

    /// Check if the tetrahedralization is Delaunay, i.e. no inserted vertex is inside the circumsphere of any tetrahedron.
    ///
    /// Returns the verdict and the fraction of non-violated tetrahedra.
    pub fn is_delaunay(&self) -> (bool, f64) {
        let mut num_violated_tets = 0;

        for tet in &self.tets {
            if let Some(v_idx) = self.used_vertex_violating(tet) {
                error!("Non Delaunay {tet}: contains vertex {v_idx} in its circumsphere");
                num_violated_tets += 1;
            }
        }

        (
            num_violated_tets == 0,
            1.0 - num_violated_tets as f64 / self.tets.len() as f64,
        )
    }

    /// Checks the Delaunay property in a parallel manner using `rayon`s `par_iter()`.
    ///
    /// Returns the fraction of non-violated tetrahedra.
    pub fn par_is_delaunay(&self) -> f64 {
        let num_violated_tets = self
            .tets
            .par_iter()
            .filter(|tet| self.used_vertex_violating(tet).is_some())
            .count();

        1.0 - num_violated_tets as f64 / self.tets.len() as f64
    }

    /// Check the mesh topology.
    ///
    /// Every tetrahedron has four distinct vertices, every face is shared by at
    /// most two tetrahedra and the unshared faces are exactly the faces of the
    /// super-tetrahedron.
    pub fn is_sound(&self) -> bool {
        let mut sound = true;
        let mut face_count: HashMap<FaceKey, usize> = HashMap::with_capacity(self.tets.len() * 2);

        for tet in &self.tets {
            let [v0, v1, v2, v3] = tet.vertices();
            if v0 == v1 || v0 == v2 || v0 == v3 || v1 == v2 || v1 == v3 || v2 == v3 {
                error!("{tet}: tetrahedron with duplicate vertices.");
                sound = false;
            }

            for face in tet.faces() {
                *face_count.entry(face.key()).or_insert(0) += 1;
            }
        }

        let hull: Vec<FaceKey> = Tetrahedron::new(self.super_vertices)
            .faces()
            .iter()
            .map(Face::key)
            .collect();

        for (key, count) in &face_count {
            match count {
                1 if !hull.contains(key) => {
                    error!("Unshared face {key:?} inside the super-tetrahedron.");
                    sound = false;
                }
                1 | 2 => (),
                _ => {
                    error!("Face {key:?} shared by {count} tetrahedra.");
                    sound = false;
                }
            }
        }

        if hull.iter().any(|key| !face_count.contains_key(key)) {
            error!("Super-tetrahedron face missing from the mesh.");
            sound = false;
        }

        sound
    }
}

impl std::fmt::Display for Tetrahedralization {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Tetrahedralization with {} vertices and {} tets ({} touching the super-tetrahedron)",
            self.vertices.len(),
            self.tets.len(),
            self.tets.len() - self.num_real_tets()
        )
    }
}
