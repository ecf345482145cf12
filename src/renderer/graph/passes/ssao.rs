use super::post_process::apply_stage;
use crate::errors::Result;
use crate::renderer::core::gpu::PostEffect;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

/// Screen-space ambient occlusion from scene depth and normals.
#[derive(Default)]
pub struct SsaoPass;

impl RenderNode for SsaoPass {
    fn name(&self) -> &'static str {
        "Ambient Occlusion"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        apply_stage(inputs, PostEffect::AmbientOcclusion, |post| {
            [post.scene_depth(), post.scene_normal()]
        });
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for SsaoPass {
    const ID: &'static str = "AmbientOcclusion";

    fn dependencies(view: &RendererView) -> NodeIdList {
        super::stage_dependencies(view, Self::ID)
    }
}
