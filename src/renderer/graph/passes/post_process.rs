//! Post-Processing Chain
//!
//! [`PostProcessPass`] owns two pooled HDR targets used as a ping-pong pair
//! by the effect stages. Before any stage runs, the chain input is the
//! forward scene color; each stage reads the current input, writes the
//! other target and flips the pair.

use std::cell::Cell;

use super::ForwardPass;
use super::SkyboxPass;
use crate::errors::Result;
use crate::renderer::core::gpu::{PixelFormat, PostEffect, TextureDesc, TextureId};
use crate::renderer::graph::node::{NodeInputs, RenderNode};
use crate::renderer::graph::registry::{CompositorNode, NodeIdList};
use crate::renderer::graph::transient_pool::PooledTexture;
use crate::renderer::view::RendererView;

#[derive(Default)]
pub struct PostProcessPass {
    targets: [Option<PooledTexture>; 2],
    scene_color: Option<TextureId>,
    scene_depth: Option<TextureId>,
    scene_normal: Option<TextureId>,
    scene_velocity: Option<TextureId>,
    /// Index of the target the next stage writes.
    current: Cell<usize>,
    written: Cell<bool>,
}

impl PostProcessPass {
    /// Input of the next stage.
    #[must_use]
    pub fn read_target(&self) -> Option<TextureId> {
        if self.written.get() {
            let read = 1 - self.current.get();
            self.targets[read].as_ref().map(PooledTexture::id)
        } else {
            self.scene_color
        }
    }

    /// Output of the next stage.
    #[must_use]
    pub fn write_target(&self) -> Option<TextureId> {
        self.targets[self.current.get()].as_ref().map(PooledTexture::id)
    }

    /// Swaps input and output after a stage wrote its result.
    pub fn flip(&self) {
        self.current.set(1 - self.current.get());
        self.written.set(true);
    }

    /// Result of the chain so far: the last stage's output, or the scene
    /// color when no stage ran.
    #[must_use]
    pub fn last_output(&self) -> Option<TextureId> {
        self.read_target()
    }

    #[must_use]
    pub fn scene_depth(&self) -> Option<TextureId> {
        self.scene_depth
    }

    #[must_use]
    pub fn scene_normal(&self) -> Option<TextureId> {
        self.scene_normal
    }

    #[must_use]
    pub fn scene_velocity(&self) -> Option<TextureId> {
        self.scene_velocity
    }

    /// Size of the ping-pong targets, if allocated.
    #[must_use]
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.targets[0].as_ref().map(PooledTexture::size)
    }
}

impl RenderNode for PostProcessPass {
    fn name(&self) -> &'static str {
        "Post Process"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        let Some(forward) = inputs.find::<ForwardPass>() else {
            log::warn!("Post Process: forward pass output missing");
            return Ok(());
        };

        self.scene_color = forward.scene_color();
        self.scene_depth = forward.depth();
        self.scene_normal = forward.normal();
        self.scene_velocity = forward.velocity();
        self.current.set(0);
        self.written.set(false);

        if super::last_stage(inputs.view.render_settings()).is_none() {
            return Ok(());
        }

        let rect = inputs.view.properties().target.view_rect;
        let (width, height) = (rect.width.max(1), rect.height.max(1));
        for (slot, label) in self.targets.iter_mut().zip(["Post Process A", "Post Process B"]) {
            let desc = TextureDesc::color(label, PixelFormat::Rgba16Float, width, height, 1);
            *slot = Some(inputs.pool.acquire(inputs.device, &desc)?);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.targets = [None, None];
        self.scene_color = None;
        self.scene_depth = None;
        self.scene_normal = None;
        self.scene_velocity = None;
        self.current.set(0);
        self.written.set(false);
    }

    fn output(&self) -> Option<TextureId> {
        self.last_output()
    }
}

impl CompositorNode for PostProcessPass {
    const ID: &'static str = "PostProcess";

    fn dependencies(_view: &RendererView) -> NodeIdList {
        NodeIdList::from_slice(&[ForwardPass::ID, SkyboxPass::ID])
    }
}

/// Runs `effect` as one step of the ping-pong chain.
///
/// The effect reads the chain input followed by the textures `side_inputs`
/// picks, writes the chain output, then the pair flips. Skipped with a
/// warning when the chain is not set up.
pub(crate) fn apply_stage<const N: usize>(
    inputs: &mut NodeInputs<'_>,
    effect: PostEffect,
    side_inputs: impl FnOnce(&PostProcessPass) -> [Option<TextureId>; N],
) {
    let Some(post) = inputs.find::<PostProcessPass>() else {
        log::warn!("{effect:?}: post-process chain missing");
        return;
    };
    let (Some(source), Some(target)) = (post.read_target(), post.write_target()) else {
        log::warn!("{effect:?}: post-process targets not allocated");
        return;
    };

    let mut textures = smallvec::SmallVec::<[TextureId; 4]>::new();
    textures.push(source);
    textures.extend(side_inputs(post).into_iter().flatten());

    inputs.device.apply_effect(effect, &textures, target);
    post.flip();
}
