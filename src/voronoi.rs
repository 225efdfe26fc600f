//! Voronoi dual of a tetrahedralization.
//!
//! Every pair of face-adjacent tetrahedra contributes the segment between
//! their circumcenters, clipped to an axis-aligned box. Voronoi cells are not
//! assembled.

use std::collections::HashMap;

use crate::{
    bounds::BoundingBox,
    tetrahedron::Tetrahedron,
    utils::{
        face_key::FaceKey,
        types::{TetIdx, Vertex3},
    },
};

/// A (possibly clipped) Voronoi edge.
///
/// For a clipped edge, `start` is the circumcenter inside the box and `end`
/// lies on the box surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vertex3,
    pub end: Vertex3,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (0..3)
            .map(|i| (self.end[i] - self.start[i]).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Index pairs `(i, j)`, `i < j`, of tetrahedra sharing exactly one face, in lexicographic order.
///
/// Same result as testing [`Tetrahedron::is_adjacent`] on all pairs, but
/// candidates are found by grouping tetrahedra on their face keys.
pub fn adjacent_pairs(tets: &[Tetrahedron]) -> Vec<(TetIdx, TetIdx)> {
    let mut tets_by_face: HashMap<FaceKey, Vec<TetIdx>> = HashMap::with_capacity(tets.len() * 2);

    for (tet_idx, tet) in tets.iter().enumerate() {
        for face in tet.faces() {
            tets_by_face.entry(face.key()).or_default().push(tet_idx);
        }
    }

    let mut pairs: Vec<(TetIdx, TetIdx)> = tets_by_face
        .values()
        .flat_map(|sharing| {
            sharing.iter().enumerate().flat_map(move |(k, &i)| {
                sharing[k + 1..].iter().map(move |&j| (i.min(j), i.max(j)))
            })
        })
        .filter(|&(i, j)| i != j && tets[i].is_adjacent(&tets[j]))
        .collect();

    pairs.sort_unstable();
    pairs.dedup();

    pairs
}

/// The dual edge of two adjacent tetrahedra, clipped to `bbox`.
///
/// `None` if either tetrahedron is degenerate, both circumcenters are outside
/// the box, or the clipping ray misses the box. An inside circumcenter on the
/// box surface gives a zero-length segment.
pub fn dual_edge(a: &Tetrahedron, b: &Tetrahedron, bbox: &BoundingBox) -> Option<Segment> {
    let (ca, cb) = (a.circumcenter()?, b.circumcenter()?);

    let (inside, outside) = match (bbox.contains(&ca), bbox.contains(&cb)) {
        (true, true) => return Some(Segment { start: ca, end: cb }),
        (true, false) => (ca, cb),
        (false, true) => (cb, ca),
        (false, false) => return None,
    };

    let direction = [0, 1, 2].map(|i| outside[i] - inside[i]);
    match bbox.ray_exit(&inside, &direction) {
        Some(end) => Some(Segment { start: inside, end }),
        None => {
            log::debug!("Ray from {inside:?} towards {outside:?} misses the box, skipping edge");
            None
        }
    }
}

/// Voronoi edges between the circumcenters of adjacent tetrahedra, clipped to `bbox`.
///
/// Edges with both circumcenters outside the box, or touching a degenerate
/// tetrahedron, are left out.
pub fn voronoi_edges(tets: &[Tetrahedron], bbox: &BoundingBox) -> Vec<Segment> {
    adjacent_pairs(tets)
        .into_iter()
        .filter_map(|(i, j)| dual_edge(&tets[i], &tets[j], bbox))
        .collect()
}
