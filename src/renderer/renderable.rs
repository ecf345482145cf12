//! Renderer-side scene data.
//!
//! [`SceneInfo`] is the flat, index-addressed snapshot the renderer works on.
//! Renderables and their [`CullInfo`] live in parallel arrays so visibility
//! can scan the cull data without touching draw data.

use std::sync::Arc;

use glam::Mat4;
use smallvec::SmallVec;

use crate::renderer::core::gpu::SkyboxDesc;
use crate::renderer::core::uniforms::PerObjectData;
use crate::resources::{Material, Mesh, SubMesh};
use crate::scene::Bounds;

/// One drawable range of a renderable: a sub-mesh with its material.
#[derive(Debug, Clone)]
pub struct RenderableElement {
    pub sub_mesh: SubMesh,
    pub material: Arc<Material>,
    /// Technique used unless a pass overrides it.
    pub technique: u32,
}

/// A drawable scene entity as tracked by the renderer.
#[derive(Debug, Clone)]
pub struct RendererRenderable {
    mesh: Arc<Mesh>,
    materials: SmallVec<[Arc<Material>; 2]>,
    elements: SmallVec<[RenderableElement; 4]>,
    object_data: PerObjectData,
}

impl RendererRenderable {
    /// Sub-mesh `i` is drawn with material `i`; extra sub-meshes reuse the
    /// last material. A renderable without materials has no elements.
    pub fn new(mesh: Arc<Mesh>, materials: impl IntoIterator<Item = Arc<Material>>) -> Self {
        let materials: SmallVec<[Arc<Material>; 2]> = materials.into_iter().collect();

        let elements = match materials.last() {
            Some(fallback) => mesh
                .sub_meshes
                .iter()
                .enumerate()
                .map(|(i, sub_mesh)| RenderableElement {
                    sub_mesh: *sub_mesh,
                    material: materials.get(i).unwrap_or(fallback).clone(),
                    technique: 0,
                })
                .collect(),
            None => SmallVec::new(),
        };

        Self {
            mesh,
            materials,
            elements,
            object_data: PerObjectData::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    #[inline]
    #[must_use]
    pub fn materials(&self) -> &[Arc<Material>] {
        &self.materials
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[RenderableElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [RenderableElement] {
        &mut self.elements
    }

    #[inline]
    #[must_use]
    pub fn object_data(&self) -> &PerObjectData {
        &self.object_data
    }

    #[inline]
    #[must_use]
    pub fn world(&self) -> Mat4 {
        self.object_data.world
    }

    /// Moves the renderable. The previous world transform is kept for
    /// velocity output.
    pub fn set_transform(&mut self, world: Mat4, layer_mask: u64) {
        let prev_world = self.object_data.world;
        let (_, rotation, translation) = world.to_scale_rotation_translation();
        let world_no_scale = Mat4::from_rotation_translation(rotation, translation);
        self.object_data =
            PerObjectData::new(world, world_no_scale, prev_world, most_significant_bit(layer_mask));
    }

    /// Two renderables can share an instanced draw when they use the very same
    /// mesh and the very same materials, in order.
    #[must_use]
    pub fn is_instancing_compatible(&self, other: &RendererRenderable) -> bool {
        Arc::ptr_eq(&self.mesh, &other.mesh)
            && self.materials.len() == other.materials.len()
            && self
                .materials
                .iter()
                .zip(&other.materials)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

fn most_significant_bit(mask: u64) -> i32 {
    if mask == 0 {
        0
    } else {
        (63 - mask.leading_zeros()) as i32
    }
}

/// Per-renderable data consumed by visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullInfo {
    /// World-space bounds.
    pub bounds: Bounds,
    pub layer: u64,
    /// Scales the view's base cull distance for this renderable.
    pub cull_distance_factor: f32,
}

impl CullInfo {
    #[must_use]
    pub fn new(bounds: Bounds, layer: u64) -> Self {
        Self {
            bounds,
            layer,
            cull_distance_factor: 1.0,
        }
    }
}

/// Everything the renderer knows about a scene for one frame.
#[derive(Debug, Clone, Default)]
pub struct SceneInfo {
    renderables: Vec<RendererRenderable>,
    cull_infos: Vec<CullInfo>,
    skybox: Option<SkyboxDesc>,
}

impl SceneInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a renderable placed at `world` and returns its index.
    pub fn add_renderable(&mut self, mut renderable: RendererRenderable, world: Mat4, layer: u64) -> usize {
        renderable.set_transform(world, layer);
        // First placement has no motion.
        renderable.object_data.prev_world = world;

        let bounds = Bounds::from_local_aabb(&renderable.mesh.local_bounds, &world);
        self.renderables.push(renderable);
        self.cull_infos.push(CullInfo::new(bounds, layer));
        self.renderables.len() - 1
    }

    /// Moves renderable `index`. Returns `false` if the index is out of range.
    pub fn update_transform(&mut self, index: usize, world: Mat4) -> bool {
        let (Some(renderable), Some(cull)) =
            (self.renderables.get_mut(index), self.cull_infos.get_mut(index))
        else {
            return false;
        };
        renderable.set_transform(world, cull.layer);
        cull.bounds = Bounds::from_local_aabb(&renderable.mesh.local_bounds, &world);
        true
    }

    pub fn set_cull_distance_factor(&mut self, index: usize, factor: f32) {
        if let Some(cull) = self.cull_infos.get_mut(index) {
            cull.cull_distance_factor = factor;
        }
    }

    pub fn set_skybox(&mut self, skybox: Option<SkyboxDesc>) {
        self.skybox = skybox;
    }

    #[inline]
    #[must_use]
    pub fn skybox(&self) -> Option<&SkyboxDesc> {
        self.skybox.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn renderables(&self) -> &[RendererRenderable] {
        &self.renderables
    }

    #[inline]
    #[must_use]
    pub fn cull_infos(&self) -> &[CullInfo] {
        &self.cull_infos
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use crate::resources::ShaderFlags;
    use crate::scene::Aabb;

    fn cube() -> Arc<Mesh> {
        Arc::new(Mesh::new(
            "cube",
            24,
            vec![SubMesh::new(0, 36)],
            Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
        ))
    }

    #[test]
    fn compatibility_uses_identity() {
        let mesh = cube();
        let material = Arc::new(Material::new("m", ShaderFlags::FORWARD));
        let twin = Arc::new(Material::new("m", ShaderFlags::FORWARD));

        let a = RendererRenderable::new(mesh.clone(), [material.clone()]);
        let b = RendererRenderable::new(mesh.clone(), [material]);
        let c = RendererRenderable::new(mesh, [twin]);

        assert!(a.is_instancing_compatible(&b));
        assert!(!a.is_instancing_compatible(&c));
    }

    #[test]
    fn extra_sub_meshes_reuse_last_material() {
        let mesh = Arc::new(Mesh::new(
            "two",
            8,
            vec![SubMesh::new(0, 6), SubMesh::new(6, 6)],
            Aabb::new(Vec3::ZERO, Vec3::ONE),
        ));
        let material = Arc::new(Material::new("m", ShaderFlags::FORWARD));
        let r = RendererRenderable::new(mesh, [material.clone()]);
        assert_eq!(r.elements().len(), 2);
        assert!(Arc::ptr_eq(&r.elements()[1].material, &material));
    }

    #[test]
    fn update_transform_tracks_previous_world() {
        let mut scene = SceneInfo::new();
        let material = Arc::new(Material::new("m", ShaderFlags::FORWARD));
        let idx = scene.add_renderable(RendererRenderable::new(cube(), [material]), Mat4::IDENTITY, 1 << 3);

        let moved = Mat4::from_translation(Vec3::X * 4.0);
        assert!(scene.update_transform(idx, moved));

        let data = scene.renderables()[idx].object_data();
        assert_eq!(data.prev_world, Mat4::IDENTITY);
        assert_eq!(data.world, moved);
        assert_eq!(data.layer, 3);
        assert_eq!(scene.cull_infos()[idx].bounds.aabb.center(), Vec3::X * 4.0);
        assert!(!scene.update_transform(99, moved));
    }
}
