use super::post_process::apply_stage;
use crate::errors::Result;
use crate::renderer::core::gpu::PostEffect;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

#[derive(Default)]
pub struct GaussianDofPass;

impl RenderNode for GaussianDofPass {
    fn name(&self) -> &'static str {
        "Gaussian DOF"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        apply_stage(inputs, PostEffect::GaussianDof, |post| [post.scene_depth()]);
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for GaussianDofPass {
    const ID: &'static str = "GaussianDOF";

    fn dependencies(view: &RendererView) -> NodeIdList {
        super::stage_dependencies(view, Self::ID)
    }
}
