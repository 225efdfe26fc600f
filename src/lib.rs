//! # tetvoro
//!
//! An incremental 3D Delaunay tetrahedralization via the Bowyer-Watson algorithm,
//! and the Voronoi dual of the result, clipped to an axis-aligned box.
//!
//! Every insertion step reports the tetrahedra it removed, the boundary of the
//! resulting cavity and the tetrahedra it created, so callers can observe the
//! algorithm one vertex at a time.
#![forbid(unsafe_code)]
#![deny(unused, clippy::incompatible_msrv)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

pub use bounds::BoundingBox;
pub use tetrahedralization::{InsertionDelta, Tetrahedralization};
pub use tetrahedron::{Circumsphere, Face, Tetrahedron, DEGENERACY_TOLERANCE};
pub use utils::face_key::{FaceKey, SimplexKey, TetKey};
pub use utils::sampling;
pub use utils::types::{Tetrahedron3, Triangle3, Vertex3};
pub use voronoi::{voronoi_edges, Segment};

pub mod bounds;
pub mod tetrahedralization;
pub mod tetrahedron;
mod utils;
pub mod voronoi;
