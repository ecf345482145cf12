//! Renderer View Group
//!
//! Views that render the same scene in the same frame. The group runs
//! visibility for all of them at once and builds their render queues,
//! batching renderables that share mesh and materials into instanced draws.

use std::sync::Arc;

use smallvec::SmallVec;

use super::renderable::{RendererRenderable, SceneInfo};
use super::view::RendererView;
use crate::errors::Result;
use crate::renderer::core::gpu::GpuDevice;
use crate::resources::{Material, Mesh};

/// Renderables sharing the same mesh and the same materials are batched only
/// when the group is larger than this.
pub const INSTANCING_THRESHOLD: usize = 5;

/// A set of instancing-compatible renderables.
///
/// Compatibility is by identity: the same `Arc<Mesh>` and the same
/// `Arc<Material>`s in the same order.
#[derive(Debug, Clone)]
pub struct InstancedBuffer {
    mesh: Arc<Mesh>,
    materials: SmallVec<[Arc<Material>; 2]>,
    members: Vec<usize>,
}

impl InstancedBuffer {
    fn for_renderable(renderable: &RendererRenderable, index: usize) -> Self {
        Self {
            mesh: renderable.mesh().clone(),
            materials: renderable.materials().iter().cloned().collect(),
            members: vec![index],
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

    /// Scene indices of the batched renderables, in scene order.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Copy restricted to members marked visible in `visibility`.
    #[must_use]
    pub fn visible_subset(&self, visibility: &[bool]) -> Self {
        Self {
            mesh: self.mesh.clone(),
            materials: self.materials.clone(),
            members: self
                .members
                .iter()
                .copied()
                .filter(|&i| visibility.get(i).copied().unwrap_or(false))
                .collect(),
        }
    }
}

/// Groups renderables by mesh and material identity with a linear scan.
#[must_use]
pub fn group_instancing_candidates(scene: &SceneInfo) -> Vec<InstancedBuffer> {
    let mut buffers: Vec<InstancedBuffer> = Vec::new();

    for (index, renderable) in scene.renderables().iter().enumerate() {
        let existing = buffers.iter_mut().find(|b| {
            scene.renderables()[b.members[0]].is_instancing_compatible(renderable)
        });
        match existing {
            Some(buffer) => buffer.members.push(index),
            None => buffers.push(InstancedBuffer::for_renderable(renderable, index)),
        }
    }

    buffers
}

/// Views sharing a scene.
#[derive(Debug, Default)]
pub struct RendererViewGroup {
    views: Vec<RendererView>,
    visibility: Vec<bool>,
}

impl RendererViewGroup {
    #[must_use]
    pub fn new(views: Vec<RendererView>) -> Self {
        let mut group = Self::default();
        group.set_views(views);
        group
    }

    /// Replaces the views; each view learns its index in the group.
    pub fn set_views(&mut self, views: Vec<RendererView>) {
        self.views = views;
        for (index, view) in self.views.iter_mut().enumerate() {
            view.set_view_index(index);
        }
    }

    #[inline]
    #[must_use]
    pub fn views(&self) -> &[RendererView] {
        &self.views
    }

    #[inline]
    pub fn views_mut(&mut self) -> &mut [RendererView] {
        &mut self.views
    }

    #[must_use]
    pub fn view(&self, index: usize) -> Option<&RendererView> {
        self.views.get(index)
    }

    pub fn view_mut(&mut self, index: usize) -> Option<&mut RendererView> {
        self.views.get_mut(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Renderables visible to at least one view during the last
    /// [`determine_visibility`](Self::determine_visibility).
    ///
    /// This is a coarse gate for systems such as animation; queueing uses
    /// each view's own visibility.
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> &[bool] {
        &self.visibility
    }

    /// Computes per-view visibility and the group-wide union.
    ///
    /// Returns without touching anything when no view draws 3D content this
    /// frame.
    pub fn determine_visibility(&mut self, scene: &SceneInfo) {
        if !self.views.iter().any(RendererView::should_draw_3d) {
            return;
        }

        self.visibility.clear();
        self.visibility.resize(scene.len(), false);

        for view in &mut self.views {
            let visible = view.determine_visible(scene);
            for (any, &mine) in self.visibility.iter_mut().zip(visible) {
                *any |= mine;
            }
        }
    }

    /// Fills every view's render queues.
    ///
    /// With instancing enabled, groups of more than [`INSTANCING_THRESHOLD`]
    /// compatible renderables are drawn as one instanced element per view and
    /// removed from that view's per-renderable visibility. Everything else is
    /// queued individually.
    pub fn generate_render_queue(
        &mut self,
        scene: &SceneInfo,
        instancing_enabled: bool,
        device: &mut dyn GpuDevice,
    ) -> Result<()> {
        let batches: Vec<InstancedBuffer> = if instancing_enabled {
            group_instancing_candidates(scene)
                .into_iter()
                .filter(|b| b.len() > INSTANCING_THRESHOLD)
                .collect()
        } else {
            Vec::new()
        };

        for view in &mut self.views {
            view.clear_instanced_elements();

            if !view.should_draw_3d() {
                continue;
            }

            for batch in &batches {
                let visible = batch.visible_subset(view.visibility());
                for &member in batch.members() {
                    if let Some(v) = view.visibility_mut().get_mut(member) {
                        *v = false;
                    }
                }
                view.queue_render_instanced_elements(scene, &visible, device)?;
            }

            view.queue_render_elements(scene);
        }

        Ok(())
    }
}
