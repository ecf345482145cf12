use super::post_process::apply_stage;
use crate::errors::Result;
use crate::renderer::core::gpu::PostEffect;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

/// Per-pixel motion blur. Reads the velocity target the forward pass writes
/// while this stage is enabled.
#[derive(Default)]
pub struct MotionBlurPass;

impl RenderNode for MotionBlurPass {
    fn name(&self) -> &'static str {
        "Motion Blur"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        apply_stage(inputs, PostEffect::MotionBlur, |post| {
            [post.scene_depth(), post.scene_velocity()]
        });
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for MotionBlurPass {
    const ID: &'static str = "MotionBlur";

    fn dependencies(view: &RendererView) -> NodeIdList {
        super::stage_dependencies(view, Self::ID)
    }
}
