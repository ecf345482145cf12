use super::post_process::apply_stage;
use crate::errors::Result;
use crate::renderer::core::gpu::PostEffect;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

/// Fast approximate anti-aliasing, normally the last stage of the chain.
#[derive(Default)]
pub struct FxaaPass;

impl RenderNode for FxaaPass {
    fn name(&self) -> &'static str {
        "FXAA"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        apply_stage(inputs, PostEffect::Fxaa, |_| []);
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for FxaaPass {
    const ID: &'static str = "FXAA";

    fn dependencies(view: &RendererView) -> NodeIdList {
        super::stage_dependencies(view, Self::ID)
    }
}
