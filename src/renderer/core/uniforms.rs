//! GPU parameter blocks.
//!
//! Plain `#[repr(C)]` structs uploaded verbatim by the device layer. Vectors
//! that would be `vec3` on the GPU are stored as [`Vec4`] with a padding lane
//! to keep std140-compatible layout.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-view camera block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerCameraData {
    pub proj: Mat4,
    pub view: Mat4,
    pub view_proj: Mat4,
    /// xyz: view direction, w: padding
    pub view_dir: Vec4,
    /// xyz: view origin, w: padding
    pub view_origin: Vec4,
}

impl Default for PerCameraData {
    fn default() -> Self {
        Self {
            proj: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            view_dir: Vec4::new(0.0, 0.0, -1.0, 0.0),
            view_origin: Vec4::ZERO,
        }
    }
}

impl PerCameraData {
    #[must_use]
    pub fn new(proj: Mat4, view: Mat4, view_dir: Vec3, view_origin: Vec3) -> Self {
        Self {
            proj,
            view,
            view_proj: proj * view,
            view_dir: view_dir.extend(0.0),
            view_origin: view_origin.extend(0.0),
        }
    }
}

/// Per-object transform block, recomputed when a renderable moves.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerObjectData {
    pub world: Mat4,
    pub inv_world: Mat4,
    pub world_no_scale: Mat4,
    pub inv_world_no_scale: Mat4,
    pub prev_world: Mat4,
    pub layer: i32,
    pub _padding: [i32; 3],
}

impl Default for PerObjectData {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            inv_world: Mat4::IDENTITY,
            world_no_scale: Mat4::IDENTITY,
            inv_world_no_scale: Mat4::IDENTITY,
            prev_world: Mat4::IDENTITY,
            layer: 0,
            _padding: [0; 3],
        }
    }
}

impl PerObjectData {
    #[must_use]
    pub fn new(world: Mat4, world_no_scale: Mat4, prev_world: Mat4, layer: i32) -> Self {
        Self {
            world,
            inv_world: world.inverse(),
            world_no_scale,
            inv_world_no_scale: world_no_scale.inverse(),
            prev_world,
            layer,
            _padding: [0; 3],
        }
    }
}

/// One element of an instanced draw's per-instance buffer.
///
/// Same content as [`PerObjectData`]; kept as its own type because the
/// instance buffer layout is bound as a vertex stream, not a uniform block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerInstanceData {
    pub world: Mat4,
    pub inv_world: Mat4,
    pub world_no_scale: Mat4,
    pub inv_world_no_scale: Mat4,
    pub prev_world: Mat4,
    pub layer: i32,
    pub _padding: [i32; 3],
}

impl From<&PerObjectData> for PerInstanceData {
    fn from(data: &PerObjectData) -> Self {
        Self {
            world: data.world,
            inv_world: data.inv_world,
            world_no_scale: data.world_no_scale,
            inv_world_no_scale: data.inv_world_no_scale,
            prev_world: data.prev_world,
            layer: data.layer,
            _padding: [0; 3],
        }
    }
}

/// Per-draw block holding the combined world-view-projection matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PerCallData {
    pub world_view_proj: Mat4,
}
