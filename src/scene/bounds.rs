//! Bounding volumes used for culling.

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered at `center` with half extents `half_size`.
    #[must_use]
    pub fn from_center_half_size(center: Vec3, half_size: Vec3) -> Self {
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms all eight corners and returns the box enclosing them.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);

        for point in corners {
            let p = matrix.transform_point3(point);
            new_min = new_min.min(p);
            new_max = new_max.max(p);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

/// Bounding sphere in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Paired sphere and box bounds of a renderable.
///
/// The sphere drives the cheap distance and frustum rejection, the box the
/// precise frustum test that follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub sphere: Sphere,
    pub aabb: Aabb,
}

impl Bounds {
    #[must_use]
    pub fn new(sphere: Sphere, aabb: Aabb) -> Self {
        Self { sphere, aabb }
    }

    /// Derives the enclosing sphere from a box.
    #[must_use]
    pub fn from_aabb(aabb: Aabb) -> Self {
        let sphere = Sphere::new(aabb.center(), aabb.size().length() * 0.5);
        Self { sphere, aabb }
    }

    /// Bounds of a local-space box placed by `world`.
    #[must_use]
    pub fn from_local_aabb(local: &Aabb, world: &Mat4) -> Self {
        Self::from_aabb(local.transform(world))
    }
}
