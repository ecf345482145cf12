//! Scene-side geometry consumed by culling: bounding volumes and convex
//! culling volumes.

pub mod bounds;
pub mod frustum;

pub use bounds::{Aabb, Bounds, Sphere};
pub use frustum::ConvexVolume;
