//! Convex culling volumes.
//!
//! [`ConvexVolume`] is a set of inward-facing planes. A view's culling frustum is
//! one extracted from its view-projection matrix; custom volumes (portals, light
//! cones) can be built from explicit planes.

use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use super::bounds::{Aabb, Sphere};

const DEGENERATE_PLANE_EPSILON: f32 = 1e-6;

/// Convex volume described by planes whose positive half-space is "inside".
///
/// Each plane is stored as `(normal.xyz, d)` with a unit normal so that
/// `dot(normal, p) + d` is the signed distance of `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexVolume {
    planes: SmallVec<[Vec4; 6]>,
}

impl Default for ConvexVolume {
    /// An empty volume contains everything.
    fn default() -> Self {
        Self {
            planes: SmallVec::new(),
        }
    }
}

impl ConvexVolume {
    /// Builds a volume from arbitrary planes, normalizing each one.
    ///
    /// Planes with a (near) zero normal are dropped; they carry no constraint.
    #[must_use]
    pub fn from_planes<I>(planes: I) -> Self
    where
        I: IntoIterator<Item = Vec4>,
    {
        let planes = planes
            .into_iter()
            .filter_map(|plane| {
                let length = plane.truncate().length();
                (length > DEGENERATE_PLANE_EPSILON).then(|| plane / length)
            })
            .collect();
        Self { planes }
    }

    /// Extracts the six frustum planes of a view-projection matrix with a
    /// `[0, 1]` depth range (Gribb-Hartmann).
    ///
    /// Infinite projections produce one degenerate plane, which is dropped.
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        Self::from_planes([
            rows[3] + rows[0], // Left
            rows[3] - rows[0], // Right
            rows[3] + rows[1], // Bottom
            rows[3] - rows[1], // Top
            rows[2],           // Near
            rows[3] - rows[2], // Far
        ])
    }

    #[inline]
    #[must_use]
    pub fn planes(&self) -> &[Vec4] {
        &self.planes
    }

    /// Sphere test. Conservative: a sphere straddling two planes outside a
    /// corner may still be reported as intersecting.
    #[must_use]
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(sphere.center) + plane.w >= -sphere.radius)
    }

    /// Box test using the positive vertex of each plane.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(positive) + plane.w >= 0.0
        })
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frustum() -> ConvexVolume {
        // Camera at origin looking down -Z
        let proj = Mat4::perspective_rh(60.0_f32.to_radians(), 1.0, 0.1, 100.0);
        ConvexVolume::from_matrix(proj)
    }

    #[test]
    fn frustum_has_six_planes() {
        assert_eq!(test_frustum().planes().len(), 6);
    }

    #[test]
    fn infinite_projection_drops_degenerate_plane() {
        let proj = Mat4::perspective_infinite_reverse_rh(60.0_f32.to_radians(), 1.0, 0.1);
        let volume = ConvexVolume::from_matrix(proj);
        assert_eq!(volume.planes().len(), 5);
        assert!(volume.contains_point(Vec3::new(0.0, 0.0, -10_000.0)));
    }

    #[test]
    fn sphere_in_front_is_inside() {
        let frustum = test_frustum();
        assert!(frustum.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0)));
    }

    #[test]
    fn sphere_behind_is_outside() {
        let frustum = test_frustum();
        assert!(!frustum.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)));
    }

    #[test]
    fn sphere_beyond_far_is_outside() {
        let frustum = test_frustum();
        assert!(!frustum.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, -200.0), 1.0)));
    }

    #[test]
    fn aabb_straddling_left_plane_intersects() {
        let frustum = test_frustum();
        // Left edge of a 60° frustum at z = -10 is around x = -5.77
        let aabb = Aabb::new(Vec3::new(-7.0, -0.5, -10.5), Vec3::new(-5.0, 0.5, -9.5));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn aabb_far_to_the_side_is_outside() {
        let frustum = test_frustum();
        let aabb = Aabb::new(Vec3::new(40.0, -0.5, -10.5), Vec3::new(41.0, 0.5, -9.5));
        assert!(!frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn empty_volume_contains_everything() {
        let volume = ConvexVolume::default();
        assert!(volume.intersects_sphere(&Sphere::new(Vec3::splat(1e6), 0.0)));
        assert!(volume.contains_point(Vec3::splat(-1e6)));
    }
}
