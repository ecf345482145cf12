//! Final Resolve
//!
//! Copies the view's finished image into the output target, applying the
//! viewport and the optional vertical flip. The source is the last output of
//! the post-processing chain, or the forward scene color when the view runs
//! without post-processing.

use super::{ForwardPass, PostProcessPass, SkyboxPass};
use crate::errors::Result;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

#[derive(Default)]
pub struct FinalResolvePass;

impl RenderNode for FinalResolvePass {
    fn name(&self) -> &'static str {
        "Final Resolve"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        let props = inputs.view.properties();
        let source = if props.run_post_processing {
            inputs.find::<PostProcessPass>().and_then(PostProcessPass::last_output)
        } else {
            inputs.find::<ForwardPass>().and_then(ForwardPass::scene_color)
        };
        let Some(source) = source else {
            log::warn!("Final Resolve: no source image for view {}", inputs.view.view_index());
            return Ok(());
        };

        let target = &props.target;
        inputs.device.set_output_target(target.target);
        inputs.device.set_viewport(target.viewport);
        inputs.device.blit(source, target.target, props.flip_view);
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for FinalResolvePass {
    const ID: &'static str = "FinalResolve";

    /// With post-processing, the chain plus its last enabled stage. The
    /// forward pass stands in for the last stage when none is enabled, since
    /// the chain output is then the forward scene color.
    fn dependencies(view: &RendererView) -> NodeIdList {
        if view.properties().run_post_processing {
            let last = super::last_stage(view.render_settings()).unwrap_or(ForwardPass::ID);
            NodeIdList::from_slice(&[PostProcessPass::ID, last])
        } else {
            NodeIdList::from_slice(&[ForwardPass::ID, SkyboxPass::ID])
        }
    }
}
