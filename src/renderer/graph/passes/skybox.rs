use crate::errors::Result;
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::view::RendererView;

use super::ForwardPass;

/// Draws the scene skybox behind the forward pass output.
///
/// Does nothing when the skybox is disabled in the view settings, the scene
/// has none, or the view draws no 3D content.
#[derive(Default)]
pub struct SkyboxPass;

impl RenderNode for SkyboxPass {
    fn name(&self) -> &'static str {
        "Skybox"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        if !inputs.view.render_settings().enable_skybox || !inputs.view.should_draw_3d() {
            return Ok(());
        }
        let Some(skybox) = inputs.scene.skybox() else {
            return Ok(());
        };
        let Some(forward) = inputs.input::<ForwardPass>(0) else {
            return Ok(());
        };
        let Some(color) = forward.scene_color() else {
            return Ok(());
        };

        inputs.device.set_render_targets(&[color], forward.depth());
        inputs.device.draw_skybox(skybox);
        Ok(())
    }

    fn clear(&mut self) {}
}

impl CompositorNode for SkyboxPass {
    const ID: &'static str = "Skybox";

    fn dependencies(_view: &RendererView) -> NodeIdList {
        NodeIdList::from_slice(&[ForwardPass::ID])
    }
}
