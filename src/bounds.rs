use anyhow::Result;

use crate::utils::types::Vertex3;

/// Axis-aligned bounding box in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vertex3,
    pub max: Vertex3,
}

impl BoundingBox {
    pub fn new(min: Vertex3, max: Vertex3) -> Result<Self> {
        if min.iter().chain(max.iter()).any(|c| !c.is_finite()) {
            anyhow::bail!("Bounding box needs finite bounds, got {min:?} to {max:?}");
        }

        if (0..3).any(|axis| min[axis] > max[axis]) {
            anyhow::bail!("Bounding box min {min:?} exceeds max {max:?}");
        }

        Ok(Self { min, max })
    }

    /// The cube `[-half_size, half_size]^3` around the origin.
    pub fn cube(half_size: f64) -> Result<Self> {
        Self::new([-half_size; 3], [half_size; 3])
    }

    /// Smallest box containing all `vertices`, `None` if there are none.
    pub fn from_vertices(vertices: &[Vertex3]) -> Option<Self> {
        let (first, rest) = vertices.split_first()?;

        let (min, max) = rest.iter().fold((*first, *first), |(mut min, mut max), v| {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
            (min, max)
        });

        Some(Self { min, max })
    }

    pub fn center(&self) -> Vertex3 {
        [0, 1, 2].map(|axis| 0.5 * (self.min[axis] + self.max[axis]))
    }

    /// The largest extent over all three axes.
    pub fn size(&self) -> f64 {
        (0..3)
            .map(|axis| self.max[axis] - self.min[axis])
            .fold(0.0, f64::max)
    }

    /// Check if `p` lies inside the box, boundary included.
    pub fn contains(&self, p: &Vertex3) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }

    /// Intersects the ray `origin + t * direction`, `t >= 0`, with the box surface (slab method).
    ///
    /// Returns the first intersection point along the ray. For an origin inside
    /// the box this is where the ray leaves the box, which is the origin itself
    /// if it lies on the surface and the ray points outward.
    pub fn ray_exit(&self, origin: &Vertex3, direction: &Vertex3) -> Option<Vertex3> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for axis in 0..3 {
            if direction[axis] == 0.0 {
                // parallel to the slab, either always or never inside
                if origin[axis] < self.min[axis] || origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }

            let t0 = (self.min[axis] - origin[axis]) / direction[axis];
            let t1 = (self.max[axis] - origin[axis]) / direction[axis];

            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
        }

        if t_near > t_far || t_far < 0.0 || !t_far.is_finite() {
            return None;
        }

        let t = if t_near > 0.0 { t_near } else { t_far };

        // clamped, so rounding never puts the point outside the box
        Some([0, 1, 2].map(|axis| {
            (origin[axis] + t * direction[axis]).clamp(self.min[axis], self.max[axis])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_new_rejects_invalid_bounds() {
        assert!(BoundingBox::new([0.0; 3], [1.0; 3]).is_ok());
        assert!(BoundingBox::new([0.0; 3], [0.0; 3]).is_ok());
        assert!(BoundingBox::new([0.0, 2.0, 0.0], [1.0; 3]).is_err());
        assert!(BoundingBox::new([0.0; 3], [1.0, f64::NAN, 1.0]).is_err());
        assert!(BoundingBox::new([f64::NEG_INFINITY; 3], [1.0; 3]).is_err());
    }

    #[test]
    fn test_from_vertices() {
        assert!(BoundingBox::from_vertices(&[]).is_none());

        let bbox =
            BoundingBox::from_vertices(&[[1.0, -2.0, 0.5], [-1.0, 4.0, 0.25], [0.0, 0.0, 3.0]])
                .unwrap();
        assert_eq!(bbox.min, [-1.0, -2.0, 0.25]);
        assert_eq!(bbox.max, [1.0, 4.0, 3.0]);
        assert_eq!(bbox.size(), 6.0);
        assert_eq!(bbox.center(), [0.0, 1.0, 1.625]);
    }

    #[test]
    fn test_contains_includes_boundary() {
        let bbox = BoundingBox::cube(1.0).unwrap();

        assert!(bbox.contains(&[0.0, 0.0, 0.0]));
        assert!(bbox.contains(&[1.0, -1.0, 0.5]));
        assert!(!bbox.contains(&[1.0 + 1e-9, 0.0, 0.0]));
    }

    #[test]
    fn test_ray_exit_from_inside() {
        let bbox = BoundingBox::cube(1.0).unwrap();

        let exit = bbox.ray_exit(&[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0]).unwrap();
        assert_eq!(exit, [1.0, 0.0, 0.0]);

        let exit = bbox.ray_exit(&[0.5, 0.5, 0.0], &[1.0, 2.0, 0.0]).unwrap();
        assert_approx_eq!(exit[0], 0.75);
        assert_approx_eq!(exit[1], 1.0);
        assert_eq!(exit[2], 0.0);
    }

    #[test]
    fn test_ray_exit_from_outside() {
        let bbox = BoundingBox::cube(1.0).unwrap();

        // hits the near side first
        let hit = bbox.ray_exit(&[-3.0, 0.5, 0.5], &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(hit, [-1.0, 0.5, 0.5]);

        // pointing away
        assert!(bbox.ray_exit(&[-3.0, 0.5, 0.5], &[-1.0, 0.0, 0.0]).is_none());
        // parallel and outside the slab
        assert!(bbox.ray_exit(&[-3.0, 2.0, 0.5], &[1.0, 0.0, 0.0]).is_none());
        // starting on the surface, pointing outward
        let exit = bbox.ray_exit(&[1.0, 0.5, 0.0], &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(exit, [1.0, 0.5, 0.0]);
        // zero direction
        assert!(bbox.ray_exit(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).is_none());
    }
}
