use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::scene::Aabb;

static NEXT_MESH_ID: AtomicU32 = AtomicU32::new(1);

/// Primitive topology used when drawing a sub-mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawOperation {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// A contiguous index range of a mesh drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubMesh {
    pub index_offset: u32,
    pub index_count: u32,
    pub draw_op: DrawOperation,
}

impl SubMesh {
    #[must_use]
    pub fn new(index_offset: u32, index_count: u32) -> Self {
        Self {
            index_offset,
            index_count,
            draw_op: DrawOperation::TriangleList,
        }
    }
}

/// GPU-resident mesh as seen by the renderer.
///
/// Vertex and index buffers live in the device layer; the renderer only needs
/// the ranges it draws and the local bounds. Two renderables share a mesh when
/// they hold the same `Arc<Mesh>`; identity, not contents, decides batching.
#[derive(Debug)]
pub struct Mesh {
    id: u32,
    pub name: Cow<'static, str>,
    pub vertex_count: u32,
    pub sub_meshes: Vec<SubMesh>,
    pub local_bounds: Aabb,
}

impl Mesh {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        vertex_count: u32,
        sub_meshes: Vec<SubMesh>,
        local_bounds: Aabb,
    ) -> Self {
        Self {
            id: NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            vertex_count,
            sub_meshes,
            local_bounds,
        }
    }

    /// Process-unique id, stable for the lifetime of the mesh.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }
}
