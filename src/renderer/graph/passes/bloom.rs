//! Bloom
//!
//! Bloom is a side branch of the post-processing chain: it reads the chain
//! input tone mapping is about to consume and renders the bright-pass blur
//! into its own half-resolution target. Tone mapping composites it.

use super::{PostProcessPass, ToneMapPass};
use crate::errors::Result;
use crate::renderer::core::gpu::{PixelFormat, PostEffect, TextureDesc, TextureId};
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::graph::transient_pool::PooledTexture;
use crate::renderer::view::RendererView;

#[derive(Default)]
pub struct BloomPass {
    target: Option<PooledTexture>,
}

impl RenderNode for BloomPass {
    fn name(&self) -> &'static str {
        "Bloom"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        let Some(source) = inputs.find::<PostProcessPass>().and_then(PostProcessPass::read_target) else {
            log::warn!("Bloom: post-process chain missing");
            return Ok(());
        };

        let rect = inputs.view.properties().target.view_rect;
        let desc = TextureDesc::color(
            "Bloom",
            PixelFormat::Rgba16Float,
            (rect.width / 2).max(1),
            (rect.height / 2).max(1),
            1,
        );
        let target = inputs.pool.acquire(inputs.device, &desc)?;
        inputs.device.apply_effect(PostEffect::Bloom, &[source], target.id());
        self.target = Some(target);
        Ok(())
    }

    fn clear(&mut self) {
        self.target = None;
    }

    fn output(&self) -> Option<TextureId> {
        self.target.as_ref().map(PooledTexture::id)
    }
}

impl CompositorNode for BloomPass {
    const ID: &'static str = "Bloom";

    /// Same inputs as tone mapping, so both see the same chain input.
    fn dependencies(view: &RendererView) -> NodeIdList {
        super::stage_dependencies(view, ToneMapPass::ID)
    }
}
