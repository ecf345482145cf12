//! Renderer View
//!
//! A [`RendererView`] is one camera rendering into one target. It owns:
//!
//! - the camera transforms and culling volume ([`RendererViewProperties`])
//! - its [`RenderSettings`] and the [`RenderCompositor`] built from them
//! - per-frame visibility and the opaque / transparent [`RenderQueue`]s
//! - redraw gating for on-demand views
//!
//! # Frame Flow
//!
//! ```text
//! begin_frame ─► determine_visible ─► queue_* ─► execute ─► end_frame
//! ```
//!
//! Views are normally driven through a
//! [`RendererViewGroup`](super::view_group::RendererViewGroup), which runs the
//! visibility and queueing steps for all of its views.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use super::view_group::InstancedBuffer;
use crate::errors::Result;
use crate::renderer::core::gpu::{
    BufferId, ClearFlags, GpuDevice, NormRect, Rect, RenderTargetHandle,
};
use crate::renderer::core::uniforms::{PerCameraData, PerInstanceData};
use crate::renderer::graph::compositor::RenderCompositor;
use crate::renderer::graph::passes::FinalResolvePass;
use crate::renderer::graph::registry::{CompositorNode, NodeTypeRegistry};
use crate::renderer::graph::transient_pool::TransientTexturePool;
use crate::renderer::queue::{ElementRef, RenderQueue};
use crate::renderer::renderable::{CullInfo, SceneInfo};
use crate::renderer::settings::{RenderSettings, StateReduction};
use crate::resources::{Material, SubMesh};
use crate::scene::ConvexVolume;

/// Timing information for the frame being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInfo {
    /// Seconds since start.
    pub time: f32,
    /// Seconds since the previous frame.
    pub time_delta: f32,
    pub frame_number: u64,
}

/// Redraw gating state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedrawState {
    #[default]
    Idle,
    RedrawRequested,
    Rendering,
}

/// The surface a view renders to and how it is cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetDesc {
    /// `None` renders to the device's default surface.
    pub target: Option<RenderTargetHandle>,
    pub target_width: u32,
    pub target_height: u32,
    /// Area of the target covered by the view.
    pub viewport: NormRect,
    /// `viewport` in pixels, refreshed when the target size changes.
    pub view_rect: Rect,
    pub clear_color: Vec4,
    pub clear_flags: ClearFlags,
    pub num_samples: u32,
}

impl Default for RenderTargetDesc {
    fn default() -> Self {
        Self {
            target: None,
            target_width: 0,
            target_height: 0,
            viewport: NormRect::default(),
            view_rect: Rect::default(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_flags: ClearFlags::all(),
            num_samples: 1,
        }
    }
}

impl RenderTargetDesc {
    /// Full-viewport description of `target`.
    #[must_use]
    pub fn for_target(target: RenderTargetHandle) -> Self {
        let mut desc = Self {
            target: Some(target),
            ..Self::default()
        };
        desc.sync_target_size();
        desc
    }

    fn handle_size(&self) -> (u32, u32) {
        self.target.map_or((0, 0), |t| (t.width, t.height))
    }

    /// Updates the cached size from the target handle. Returns `true` when it
    /// changed.
    fn sync_target_size(&mut self) -> bool {
        let (width, height) = self.handle_size();
        if width == self.target_width && height == self.target_height {
            return false;
        }
        self.target_width = width;
        self.target_height = height;
        self.view_rect = self.viewport.to_pixels(width, height);
        true
    }
}

/// Construction parameters of a view.
#[derive(Debug, Clone)]
pub struct RendererViewDesc {
    pub target: RenderTargetDesc,
    pub view_origin: Vec3,
    pub view_direction: Vec3,
    pub view_transform: Mat4,
    pub proj_transform: Mat4,
    /// World-space culling volume; derived from `proj * view` when `None`.
    pub cull_frustum: Option<ConvexVolume>,
    pub visible_layers: u64,
    /// Only render when a redraw was requested.
    pub on_demand: bool,
    pub run_post_processing: bool,
    /// Flip vertically when resolving to the target.
    pub flip_view: bool,
}

impl Default for RendererViewDesc {
    fn default() -> Self {
        Self {
            target: RenderTargetDesc::default(),
            view_origin: Vec3::ZERO,
            view_direction: Vec3::NEG_Z,
            view_transform: Mat4::IDENTITY,
            proj_transform: Mat4::IDENTITY,
            cull_frustum: None,
            visible_layers: u64::MAX,
            on_demand: false,
            run_post_processing: true,
            flip_view: false,
        }
    }
}

/// Camera, target and frame state of a view.
#[derive(Debug, Clone)]
pub struct RendererViewProperties {
    pub view_origin: Vec3,
    pub view_direction: Vec3,
    pub view_transform: Mat4,
    pub proj_transform: Mat4,
    pub view_proj_transform: Mat4,
    pub cull_frustum: ConvexVolume,
    pub visible_layers: u64,
    pub target: RenderTargetDesc,
    /// Advances once per drawn frame; frozen while an on-demand view idles.
    pub frame_idx: u64,
    pub on_demand: bool,
    pub run_post_processing: bool,
    pub flip_view: bool,
}

impl RendererViewProperties {
    fn from_desc(desc: &RendererViewDesc, frame_idx: u64) -> Self {
        let view_proj_transform = desc.proj_transform * desc.view_transform;
        let mut target = desc.target;
        target.sync_target_size();

        Self {
            view_origin: desc.view_origin,
            view_direction: desc.view_direction,
            view_transform: desc.view_transform,
            proj_transform: desc.proj_transform,
            view_proj_transform,
            cull_frustum: desc
                .cull_frustum
                .clone()
                .unwrap_or_else(|| ConvexVolume::from_matrix(view_proj_transform)),
            visible_layers: desc.visible_layers,
            target,
            frame_idx,
            on_demand: desc.on_demand,
            run_post_processing: desc.run_post_processing,
            flip_view: desc.flip_view,
        }
    }
}

/// Render element synthesized for an instanced batch.
#[derive(Debug, Clone)]
pub struct InstancedElement {
    pub mesh_id: u32,
    pub sub_mesh: SubMesh,
    pub material: Arc<Material>,
    pub technique: u32,
    pub instance_count: u32,
    pub instance_buffer: BufferId,
}

/// One camera rendering into one target.
pub struct RendererView {
    properties: RendererViewProperties,
    settings: RenderSettings,
    registry: Arc<NodeTypeRegistry>,
    compositor: RenderCompositor,
    final_node: &'static str,

    opaque_queue: RenderQueue,
    transparent_queue: RenderQueue,
    visibility: Vec<bool>,
    instanced_elements: Vec<InstancedElement>,

    camera_data: PerCameraData,
    camera_dirty: bool,
    frame_info: FrameInfo,
    view_index: usize,

    redraw_state: RedrawState,
    redraw_this_frame: bool,
    redraw_for_frames: u32,
    redraw_for_seconds: f32,
    drawing: bool,
}

impl RendererView {
    /// Creates a view and builds its compositor ending in `FinalResolve`.
    ///
    /// A failed build is logged and leaves the compositor invalid; the view is
    /// still usable.
    #[must_use]
    pub fn new(desc: &RendererViewDesc, settings: RenderSettings, registry: Arc<NodeTypeRegistry>) -> Self {
        let mut view = Self {
            properties: RendererViewProperties::from_desc(desc, 0),
            opaque_queue: RenderQueue::new(settings.state_reduction),
            transparent_queue: RenderQueue::transparent(settings.state_reduction),
            settings: RenderSettings::default(),
            registry,
            compositor: RenderCompositor::new(),
            final_node: FinalResolvePass::ID,
            visibility: Vec::new(),
            instanced_elements: Vec::new(),
            camera_data: PerCameraData::default(),
            camera_dirty: true,
            frame_info: FrameInfo::default(),
            view_index: 0,
            redraw_state: RedrawState::Idle,
            redraw_this_frame: false,
            redraw_for_frames: 0,
            redraw_for_seconds: 0.0,
            drawing: false,
        };
        view.set_render_settings(settings);
        view.update_camera_data();
        view
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replaces the render settings and rebuilds the compositor.
    pub fn set_render_settings(&mut self, settings: RenderSettings) {
        let reduction = settings.state_reduction;
        self.settings = settings;
        self.set_state_reduction_mode(reduction);
        // Failures are reported by `rebuild_compositor` and leave the view
        // with an invalid compositor.
        let _ = self.rebuild_compositor();
    }

    /// Recreates both queues. The transparent queue sorts by distance
    /// whenever material reduction is requested.
    pub fn set_state_reduction_mode(&mut self, mode: StateReduction) {
        self.settings.state_reduction = mode;
        self.opaque_queue = RenderQueue::new(mode);
        self.transparent_queue = RenderQueue::transparent(mode);
    }

    pub fn set_transform(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        view: Mat4,
        proj: Mat4,
        world_frustum: ConvexVolume,
    ) {
        let props = &mut self.properties;
        props.view_origin = origin;
        props.view_direction = direction;
        props.view_transform = view;
        props.proj_transform = proj;
        props.view_proj_transform = proj * view;
        props.cull_frustum = world_frustum;
        self.camera_dirty = true;
    }

    /// Replaces the view description. The frame index is preserved.
    pub fn set_view(&mut self, desc: &RendererViewDesc) {
        let post_processing_changed = desc.run_post_processing != self.properties.run_post_processing;
        self.properties = RendererViewProperties::from_desc(desc, self.properties.frame_idx);
        self.set_state_reduction_mode(self.settings.state_reduction);
        self.camera_dirty = true;

        if post_processing_changed {
            let _ = self.rebuild_compositor();
        }
    }

    /// Swaps the output target. The new size is picked up by the next
    /// [`begin_frame`](Self::begin_frame).
    pub fn set_output_target(&mut self, target: Option<RenderTargetHandle>) {
        self.properties.target.target = target;
    }

    /// Builds the compositor for a custom final node.
    pub fn build_compositor(&mut self, final_node: &'static str) -> Result<()> {
        self.final_node = final_node;
        self.rebuild_compositor()
    }

    /// Rebuilds the compositor for the current final node.
    pub fn rebuild_compositor(&mut self) -> Result<()> {
        let mut compositor = std::mem::take(&mut self.compositor);
        let result = compositor.build(&self.registry, self, self.final_node);
        self.compositor = compositor;

        if let Err(err) = &result {
            log::warn!("View {}: compositor build failed: {err}", self.view_index);
        }
        result
    }

    pub(crate) fn set_view_index(&mut self, index: usize) {
        self.view_index = index;
    }

    // ========================================================================
    // Redraw gating
    // ========================================================================

    /// Requests rendering for at least `frames` frames and `seconds` seconds.
    pub fn request_redraw(&mut self, frames: u32, seconds: f32) {
        self.redraw_for_frames = self.redraw_for_frames.max(frames);
        self.redraw_for_seconds = self.redraw_for_seconds.max(seconds);
        self.mark_redraw_requested();
    }

    /// Requests rendering of the current frame.
    pub fn notify_needs_redraw(&mut self) {
        self.redraw_this_frame = true;
        self.mark_redraw_requested();
    }

    fn mark_redraw_requested(&mut self) {
        if self.redraw_state == RedrawState::Idle {
            self.redraw_state = RedrawState::RedrawRequested;
        }
    }

    fn redraw_pending(&self) -> bool {
        self.redraw_this_frame || self.redraw_for_frames > 0 || self.redraw_for_seconds > 0.0
    }

    #[must_use]
    pub fn should_draw(&self) -> bool {
        !self.properties.on_demand || self.redraw_pending()
    }

    /// Whether this view draws scene geometry this frame.
    #[must_use]
    pub fn should_draw_3d(&self) -> bool {
        !self.settings.overlay_only && self.should_draw()
    }

    /// Whether the forward pass has to output per-pixel velocity.
    #[must_use]
    pub fn requires_velocity_writes(&self) -> bool {
        self.properties.run_post_processing && self.settings.motion_blur.enabled
    }

    #[inline]
    #[must_use]
    pub fn redraw_state(&self) -> RedrawState {
        self.redraw_state
    }

    // ========================================================================
    // Frame lifecycle
    // ========================================================================

    /// Starts a frame. Camera parameters are recomputed only when the target
    /// size or the transforms changed.
    pub fn begin_frame(&mut self, frame_info: FrameInfo) {
        self.frame_info = frame_info;

        if self.properties.target.sync_target_size() {
            self.camera_dirty = true;
        }
        if self.camera_dirty {
            self.update_camera_data();
        }

        self.drawing = self.should_draw();
        if self.drawing {
            self.redraw_state = RedrawState::Rendering;
        }
    }

    /// Finishes a frame: advances the frame index if the view drew, clears
    /// the queues and counts down pending redraw requests.
    pub fn end_frame(&mut self) {
        if self.drawing {
            self.properties.frame_idx += 1;
        }

        self.opaque_queue.clear();
        self.transparent_queue.clear();
        self.instanced_elements.clear();

        self.redraw_for_frames = self.redraw_for_frames.saturating_sub(1);
        if self.redraw_for_seconds > 0.0 {
            self.redraw_for_seconds = (self.redraw_for_seconds - self.frame_info.time_delta).max(0.0);
        }
        self.redraw_this_frame = false;
        self.drawing = false;

        self.redraw_state = if self.properties.on_demand && self.redraw_pending() {
            RedrawState::RedrawRequested
        } else {
            RedrawState::Idle
        };
    }

    fn update_camera_data(&mut self) {
        let props = &self.properties;
        self.camera_data = PerCameraData::new(
            props.proj_transform,
            props.view_transform,
            props.view_direction,
            props.view_origin,
        );
        self.camera_dirty = false;
    }

    // ========================================================================
    // Visibility & queueing
    // ========================================================================

    /// Computes which renderables this view sees.
    ///
    /// All entries are `false` when the view does not draw 3D content this
    /// frame.
    pub fn determine_visible(&mut self, scene: &SceneInfo) -> &[bool] {
        self.visibility.clear();
        self.visibility.resize(scene.len(), false);

        if self.should_draw_3d() {
            self.calculate_visibility(scene.cull_infos());
        }
        &self.visibility
    }

    fn calculate_visibility(&mut self, cull_infos: &[CullInfo]) {
        let props = &self.properties;
        let camera_layers = props.visible_layers;
        let frustum = &props.cull_frustum;
        let camera_position = props.view_origin;
        let base_cull_distance = self.settings.cull_distance;
        let frustum_culling = self.settings.frustum_culling();

        for (visible, cull) in self.visibility.iter_mut().zip(cull_infos) {
            if cull.layer & camera_layers == 0 {
                continue;
            }

            let sphere = &cull.bounds.sphere;
            let distance_sq = camera_position.distance_squared(sphere.center);
            let max_distance = cull.cull_distance_factor * base_cull_distance + sphere.radius;
            if distance_sq > max_distance * max_distance {
                continue;
            }

            if frustum_culling
                && (!frustum.intersects_sphere(sphere) || !frustum.intersects_aabb(&cull.bounds.aabb))
            {
                continue;
            }

            *visible = true;
        }
    }

    pub(crate) fn visibility_mut(&mut self) -> &mut [bool] {
        &mut self.visibility
    }

    fn distance_to(&self, cull: &CullInfo) -> f32 {
        (self.properties.view_origin - cull.bounds.aabb.center()).length()
    }

    /// Queues every element of every visible renderable and sorts the queues.
    pub fn queue_render_elements(&mut self, scene: &SceneInfo) {
        for (index, (renderable, cull)) in scene
            .renderables()
            .iter()
            .zip(scene.cull_infos())
            .enumerate()
        {
            if !self.visibility.get(index).copied().unwrap_or(false) {
                continue;
            }

            let distance = self.distance_to(cull);
            for (element_index, element) in renderable.elements().iter().enumerate() {
                let element_ref = ElementRef::Scene {
                    renderable: index,
                    element: element_index,
                };
                let queue = if element.material.is_transparent() {
                    &mut self.transparent_queue
                } else {
                    &mut self.opaque_queue
                };
                queue.add(element_ref, &element.material, distance, element.technique);
            }
        }

        self.opaque_queue.sort();
        self.transparent_queue.sort();
    }

    /// Queues one instanced element per element of the batch's first member,
    /// drawing every member of `batch` in a single call.
    ///
    /// The per-instance data of all members is uploaded as one buffer. Does
    /// nothing for an empty batch.
    pub fn queue_render_instanced_elements(
        &mut self,
        scene: &SceneInfo,
        batch: &InstancedBuffer,
        device: &mut dyn GpuDevice,
    ) -> Result<()> {
        let members = batch.members();
        let Some(&first) = members.first() else {
            return Ok(());
        };
        let (Some(renderable), Some(cull)) =
            (scene.renderables().get(first), scene.cull_infos().get(first))
        else {
            return Ok(());
        };

        let distance = self.distance_to(cull);

        let instance_data: Vec<PerInstanceData> = members
            .iter()
            .filter_map(|&i| scene.renderables().get(i))
            .map(|r| PerInstanceData::from(r.object_data()))
            .collect();
        let instance_buffer = device.upload_instance_data(bytemuck::cast_slice(&instance_data))?;
        let instance_count = instance_data.len() as u32;

        for element in renderable.elements() {
            let index = self.instanced_elements.len();
            self.instanced_elements.push(InstancedElement {
                mesh_id: renderable.mesh().id(),
                sub_mesh: element.sub_mesh,
                material: element.material.clone(),
                technique: element.technique,
                instance_count,
                instance_buffer,
            });

            let queue = if element.material.is_transparent() {
                &mut self.transparent_queue
            } else {
                &mut self.opaque_queue
            };
            queue.add(
                ElementRef::Instanced(index),
                &element.material,
                distance,
                element.technique,
            );
        }

        Ok(())
    }

    pub(crate) fn clear_instanced_elements(&mut self) {
        self.instanced_elements.clear();
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Runs the compositor for this frame.
    ///
    /// Does nothing when the view is not due for drawing or its compositor is
    /// invalid. Resource errors from the device propagate.
    pub fn execute(
        &mut self,
        scene: &SceneInfo,
        device: &mut dyn GpuDevice,
        pool: &TransientTexturePool,
    ) -> Result<()> {
        if !self.should_draw() {
            return Ok(());
        }

        let mut compositor = std::mem::take(&mut self.compositor);
        let result = compositor.execute(self, scene, device, pool);
        self.compositor = compositor;
        result
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &RendererViewProperties {
        &self.properties
    }

    #[inline]
    #[must_use]
    pub fn render_settings(&self) -> &RenderSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<NodeTypeRegistry> {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn compositor(&self) -> &RenderCompositor {
        &self.compositor
    }

    #[inline]
    #[must_use]
    pub fn camera_data(&self) -> &PerCameraData {
        &self.camera_data
    }

    #[inline]
    #[must_use]
    pub fn opaque_queue(&self) -> &RenderQueue {
        &self.opaque_queue
    }

    #[inline]
    #[must_use]
    pub fn transparent_queue(&self) -> &RenderQueue {
        &self.transparent_queue
    }

    /// Per-renderable visibility from the last
    /// [`determine_visible`](Self::determine_visible), minus instanced members.
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> &[bool] {
        &self.visibility
    }

    #[inline]
    #[must_use]
    pub fn instanced_elements(&self) -> &[InstancedElement] {
        &self.instanced_elements
    }

    #[inline]
    #[must_use]
    pub fn frame_info(&self) -> &FrameInfo {
        &self.frame_info
    }

    /// Position of this view in its group.
    #[inline]
    #[must_use]
    pub fn view_index(&self) -> usize {
        self.view_index
    }
}

impl std::fmt::Debug for RendererView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererView")
            .field("view_index", &self.view_index)
            .field("frame_idx", &self.properties.frame_idx)
            .field("redraw_state", &self.redraw_state)
            .field("compositor", &self.compositor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_demand_view() -> RendererView {
        let desc = RendererViewDesc {
            on_demand: true,
            ..RendererViewDesc::default()
        };
        RendererView::new(
            &desc,
            RenderSettings::default(),
            Arc::new(NodeTypeRegistry::with_default_nodes()),
        )
    }

    fn frame(delta: f32) -> FrameInfo {
        FrameInfo {
            time: 0.0,
            time_delta: delta,
            frame_number: 0,
        }
    }

    #[test]
    fn on_demand_view_idles_until_requested() {
        let mut view = on_demand_view();
        assert!(!view.should_draw());
        assert_eq!(view.redraw_state(), RedrawState::Idle);

        view.begin_frame(frame(0.016));
        view.end_frame();
        assert_eq!(view.properties().frame_idx, 0);

        view.notify_needs_redraw();
        assert_eq!(view.redraw_state(), RedrawState::RedrawRequested);
        view.begin_frame(frame(0.016));
        assert_eq!(view.redraw_state(), RedrawState::Rendering);
        view.end_frame();

        assert_eq!(view.properties().frame_idx, 1);
        assert_eq!(view.redraw_state(), RedrawState::Idle);
        assert!(!view.should_draw());
    }

    #[test]
    fn frame_count_request_expires() {
        let mut view = on_demand_view();
        view.request_redraw(2, 0.0);

        for _ in 0..2 {
            assert!(view.should_draw());
            view.begin_frame(frame(0.016));
            view.end_frame();
        }
        assert!(!view.should_draw());
        assert_eq!(view.properties().frame_idx, 2);
    }

    #[test]
    fn time_request_counts_down_with_frame_delta() {
        let mut view = on_demand_view();
        view.request_redraw(0, 0.25);

        view.begin_frame(frame(0.2));
        view.end_frame();
        assert!(view.should_draw());
        assert_eq!(view.redraw_state(), RedrawState::RedrawRequested);

        view.begin_frame(frame(0.2));
        view.end_frame();
        assert!(!view.should_draw());
    }

    #[test]
    fn overlay_view_never_draws_3d() {
        let view = RendererView::new(
            &RendererViewDesc::default(),
            RenderSettings::overlay(),
            Arc::new(NodeTypeRegistry::with_default_nodes()),
        );
        assert!(view.should_draw());
        assert!(!view.should_draw_3d());
    }

    #[test]
    fn transparent_queue_follows_reduction_mode() {
        let mut view = on_demand_view();
        view.set_state_reduction_mode(StateReduction::Material);
        assert_eq!(view.opaque_queue().state_reduction(), StateReduction::Material);
        assert_eq!(view.transparent_queue().state_reduction(), StateReduction::Distance);

        view.set_state_reduction_mode(StateReduction::None);
        assert_eq!(view.transparent_queue().state_reduction(), StateReduction::None);
    }

    #[test]
    fn begin_frame_picks_up_target_resize() {
        let mut view = on_demand_view();
        view.set_output_target(Some(RenderTargetHandle {
            id: 1,
            width: 800,
            height: 600,
        }));
        view.begin_frame(FrameInfo::default());
        assert_eq!(view.properties().target.view_rect.width, 800);
        assert_eq!(view.properties().target.target_height, 600);
    }
}
