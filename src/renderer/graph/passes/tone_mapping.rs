use super::post_process::apply_stage;
use super::BloomPass;
use crate::errors::Result;
use crate::renderer::core::gpu::PostEffect;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

/// Maps the HDR chain to display range, compositing bloom when present.
#[derive(Default)]
pub struct ToneMapPass;

impl RenderNode for ToneMapPass {
    fn name(&self) -> &'static str {
        "Tonemapping"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        let bloom = inputs.find::<BloomPass>().and_then(|bloom| bloom.output());
        apply_stage(inputs, PostEffect::Tonemapping, |_| [bloom]);
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for ToneMapPass {
    const ID: &'static str = "Tonemapping";

    fn dependencies(view: &RendererView) -> NodeIdList {
        let mut deps = super::stage_dependencies(view, Self::ID);
        if view.render_settings().bloom.enabled {
            deps.push(BloomPass::ID);
        }
        deps
    }
}
