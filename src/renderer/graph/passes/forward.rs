//! Forward Render Pass
//!
//! Allocates the scene targets for the view, clears them and draws the
//! view's sorted opaque queue followed by its sorted transparent queue.
//!
//! # Targets
//!
//! | Target     | Format                 | When                          |
//! |------------|------------------------|-------------------------------|
//! | color      | `Rgba8`                | always                        |
//! | normal     | `Rgba8`                | always                        |
//! | emissive   | `Rgba8`                | always                        |
//! | velocity   | `Rg16Snorm`            | view requires velocity writes |
//! | depth      | `Depth32FloatStencil8` | always                        |
//!
//! All targets come from the transient pool and are released in `clear`.
//!
//! # State Changes
//!
//! Within one queue, full material state is bound only when the material
//! differs from the previous draw; otherwise only parameter blocks are
//! refreshed. Pass state is applied on entries flagged by the queue sort.

use smallvec::SmallVec;

use crate::errors::Result;
use crate::renderer::core::gpu::{
    DrawCall, GpuDevice, MaterialBind, PixelFormat, TextureDesc, TextureId,
};
use crate::renderer::core::uniforms::PerCallData;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::graph::transient_pool::PooledTexture;
use crate::renderer::queue::{ElementRef, RenderQueue};
use crate::renderer::renderable::SceneInfo;
use crate::renderer::view::RendererView;

#[derive(Default)]
pub struct ForwardPass {
    scene_color: Option<PooledTexture>,
    normal: Option<PooledTexture>,
    emissive: Option<PooledTexture>,
    velocity: Option<PooledTexture>,
    depth: Option<PooledTexture>,
}

impl ForwardPass {
    #[must_use]
    pub fn scene_color(&self) -> Option<TextureId> {
        self.scene_color.as_ref().map(PooledTexture::id)
    }

    #[must_use]
    pub fn normal(&self) -> Option<TextureId> {
        self.normal.as_ref().map(PooledTexture::id)
    }

    #[must_use]
    pub fn emissive(&self) -> Option<TextureId> {
        self.emissive.as_ref().map(PooledTexture::id)
    }

    #[must_use]
    pub fn velocity(&self) -> Option<TextureId> {
        self.velocity.as_ref().map(PooledTexture::id)
    }

    #[must_use]
    pub fn depth(&self) -> Option<TextureId> {
        self.depth.as_ref().map(PooledTexture::id)
    }
}

impl RenderNode for ForwardPass {
    fn name(&self) -> &'static str {
        "Forward Pass"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        let view = inputs.view;
        let target = &view.properties().target;
        let width = target.view_rect.width.max(1);
        let height = target.view_rect.height.max(1);
        let samples = target.num_samples.max(1);
        let pool = inputs.pool;

        let color_desc = |label| TextureDesc::color(label, PixelFormat::Rgba8, width, height, samples);

        let scene_color = pool.acquire(inputs.device, &color_desc("Scene Color"))?;
        let normal = pool.acquire(inputs.device, &color_desc("Scene Normal"))?;
        let emissive = pool.acquire(inputs.device, &color_desc("Scene Emissive"))?;
        let velocity = if view.requires_velocity_writes() {
            let desc = TextureDesc::color("Scene Velocity", PixelFormat::Rg16Snorm, width, height, samples);
            Some(pool.acquire(inputs.device, &desc)?)
        } else {
            None
        };
        let depth = pool.acquire(inputs.device, &TextureDesc::depth("Scene Depth", width, height, samples))?;

        let mut colors: SmallVec<[TextureId; 4]> = SmallVec::new();
        colors.extend([scene_color.id(), normal.id(), emissive.id()]);
        colors.extend(velocity.as_ref().map(PooledTexture::id));

        let device = &mut *inputs.device;
        device.set_render_targets(&colors, Some(depth.id()));
        device.clear(target.clear_flags, target.clear_color);
        device.bind_camera(view.camera_data());

        draw_queue(view.opaque_queue(), view, inputs.scene, device);
        draw_queue(view.transparent_queue(), view, inputs.scene, device);

        self.scene_color = Some(scene_color);
        self.normal = Some(normal);
        self.emissive = Some(emissive);
        self.velocity = velocity;
        self.depth = Some(depth);
        Ok(())
    }

    fn clear(&mut self) {
        self.scene_color = None;
        self.normal = None;
        self.emissive = None;
        self.velocity = None;
        self.depth = None;
    }

    fn output(&self) -> Option<TextureId> {
        self.scene_color()
    }
}

impl CompositorNode for ForwardPass {
    const ID: &'static str = "ForwardPass";

    fn dependencies(_view: &RendererView) -> NodeIdList {
        NodeIdList::new()
    }
}

/// Submits every entry of a sorted queue.
fn draw_queue(queue: &RenderQueue, view: &RendererView, scene: &SceneInfo, device: &mut dyn GpuDevice) {
    let view_proj = view.properties().view_proj_transform;
    let mut last_material: Option<u32> = None;

    for entry in queue.sorted_elements() {
        let call = match entry.element {
            ElementRef::Scene {
                renderable,
                element,
            } => {
                let Some(renderable) = scene.renderables().get(renderable) else {
                    continue;
                };
                let Some(element) = renderable.elements().get(element) else {
                    continue;
                };
                DrawCall {
                    mesh_id: renderable.mesh().id(),
                    sub_mesh: element.sub_mesh,
                    material_id: entry.material_id,
                    technique: entry.technique,
                    pass: entry.pass,
                    apply_pass: entry.apply_pass,
                    bind: MaterialBind::Full,
                    instance_count: 0,
                    instance_buffer: None,
                    per_call: Some(PerCallData {
                        world_view_proj: view_proj * renderable.world(),
                    }),
                }
            }
            ElementRef::Instanced(index) => {
                let Some(instanced) = view.instanced_elements().get(index) else {
                    continue;
                };
                DrawCall {
                    mesh_id: instanced.mesh_id,
                    sub_mesh: instanced.sub_mesh,
                    material_id: entry.material_id,
                    technique: entry.technique,
                    pass: entry.pass,
                    apply_pass: entry.apply_pass,
                    bind: MaterialBind::Full,
                    instance_count: instanced.instance_count,
                    instance_buffer: Some(instanced.instance_buffer),
                    per_call: None,
                }
            }
        };

        let bind = if last_material == Some(entry.material_id) {
            MaterialBind::ParamsOnly
        } else {
            last_material = Some(entry.material_id);
            MaterialBind::Full
        };

        device.draw(&DrawCall { bind, ..call });
    }
}
