//! Point generation helpers.
//!
//! Exact coplanar or cospherical configurations are not handled by the
//! tetrahedralization beyond a fixed tolerance. Jittering the input by a small
//! normal offset moves such configurations into general position.

use anyhow::Result;
use rand::{distributions::Uniform, prelude::Distribution, Rng};
use rand_distr::Normal;

use crate::{bounds::BoundingBox, utils::types::Vertex3};

/// Samples `n` vertices uniformly inside `bbox`.
pub fn sample_vertices_in_box<R: Rng + ?Sized>(
    n: usize,
    bbox: &BoundingBox,
    rng: &mut R,
) -> Vec<Vertex3> {
    let uniforms = [0, 1, 2].map(|axis| Uniform::new_inclusive(bbox.min[axis], bbox.max[axis]));

    let mut vertices: Vec<Vertex3> = Vec::with_capacity(n);
    for _ in 0..n {
        let x = uniforms[0].sample(rng);
        let y = uniforms[1].sample(rng);
        let z = uniforms[2].sample(rng);

        vertices.push([x, y, z]);
    }

    vertices
}

/// Offsets every coordinate by a sample of `N(0, sigma)`.
pub fn jitter<R: Rng + ?Sized>(
    vertices: &[Vertex3],
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<Vertex3>> {
    // rand_distr only rejects a non-finite standard deviation
    if !(sigma >= 0.0) {
        anyhow::bail!("Jitter sigma must be non-negative, got {sigma}");
    }

    let normal = Normal::new(0.0, sigma)
        .map_err(|e| anyhow::Error::msg(format!("Invalid jitter sigma {sigma}: {e}")))?;

    Ok(vertices
        .iter()
        .map(|v| v.map(|c| c + normal.sample(rng)))
        .collect())
}

/// The `n × n × n` lattice spanning `bbox`, jittered by `sigma`.
///
/// Lattices are highly cospherical, so a `sigma` of zero yields many
/// degenerate tetrahedra.
pub fn jittered_grid<R: Rng + ?Sized>(
    n: usize,
    bbox: &BoundingBox,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<Vertex3>> {
    let step = |axis: usize, i: usize| {
        if n > 1 {
            bbox.min[axis] + (bbox.max[axis] - bbox.min[axis]) * i as f64 / (n - 1) as f64
        } else {
            bbox.center()[axis]
        }
    };

    let mut lattice: Vec<Vertex3> = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                lattice.push([step(0, i), step(1, j), step(2, k)]);
            }
        }
    }

    jitter(&lattice, sigma, rng)
}
