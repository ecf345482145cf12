//! Built-in compositor passes.
//!
//! | Node id            | Dependencies                                              |
//! |--------------------|-----------------------------------------------------------|
//! | `ForwardPass`      | –                                                         |
//! | `Skybox`           | `ForwardPass`                                             |
//! | `PostProcess`      | `ForwardPass`, `Skybox`                                   |
//! | effect stages      | previous enabled stage, `PostProcess`, `ForwardPass`      |
//! | `Tonemapping`      | as above, plus `Bloom` when bloom is enabled              |
//! | `FinalResolve`     | `PostProcess` + last enabled stage, or `ForwardPass` + `Skybox` |
//!
//! Effect stages run in a fixed order and are only part of the graph while
//! enabled in the view's settings:
//!
//! ```text
//! AmbientOcclusion → MotionBlur → [Bloom] → Tonemapping → GaussianDOF → FXAA
//! ```
//!
//! Bloom renders into its own target and is read by tone mapping; every other
//! stage reads the post-process ping-pong input and writes its output.

mod bloom;
mod dof;
mod final_resolve;
mod forward;
mod fxaa;
mod motion_blur;
mod post_process;
mod skybox;
mod ssao;
mod tone_mapping;

pub use bloom::BloomPass;
pub use dof::GaussianDofPass;
pub use final_resolve::FinalResolvePass;
pub use forward::ForwardPass;
pub use fxaa::FxaaPass;
pub use motion_blur::MotionBlurPass;
pub use post_process::PostProcessPass;
pub use skybox::SkyboxPass;
pub use ssao::SsaoPass;
pub use tone_mapping::ToneMapPass;

use smallvec::SmallVec;

use super::registry::{CompositorNode, NodeIdList, NodeTypeRegistry};
use crate::renderer::settings::RenderSettings;
use crate::renderer::view::RendererView;

/// Registers every built-in pass.
pub fn register_default_nodes(registry: &mut NodeTypeRegistry) {
    registry.register_node::<ForwardPass>();
    registry.register_node::<SkyboxPass>();
    registry.register_node::<PostProcessPass>();
    registry.register_node::<SsaoPass>();
    registry.register_node::<MotionBlurPass>();
    registry.register_node::<BloomPass>();
    registry.register_node::<ToneMapPass>();
    registry.register_node::<GaussianDofPass>();
    registry.register_node::<FxaaPass>();
    registry.register_node::<FinalResolvePass>();
}

/// Effect stages that read and write the ping-pong chain, in execution
/// order, with whether each is enabled.
fn stages(settings: &RenderSettings) -> [(&'static str, bool); 5] {
    [
        (SsaoPass::ID, settings.ambient_occlusion.enabled),
        (MotionBlurPass::ID, settings.motion_blur.enabled),
        (ToneMapPass::ID, settings.tone_mapping.enabled),
        (GaussianDofPass::ID, settings.depth_of_field.enabled),
        (FxaaPass::ID, settings.fxaa.enabled),
    ]
}

/// Last enabled chain stage strictly before `id` (or before the end of the
/// chain when `id` is `None`).
fn previous_stage(settings: &RenderSettings, id: Option<&str>) -> Option<&'static str> {
    let stages = stages(settings);
    let end = id
        .and_then(|id| stages.iter().position(|&(stage, _)| stage == id))
        .unwrap_or(stages.len());

    stages[..end]
        .iter()
        .rev()
        .find(|&&(_, enabled)| enabled)
        .map(|&(stage, _)| stage)
}

/// Last enabled chain stage, if any.
pub(crate) fn last_stage(settings: &RenderSettings) -> Option<&'static str> {
    previous_stage(settings, None)
}

/// Dependencies shared by all effect stages.
pub(crate) fn stage_dependencies(view: &RendererView, id: &'static str) -> NodeIdList {
    let mut deps: NodeIdList = SmallVec::new();
    if let Some(previous) = previous_stage(view.render_settings(), Some(id)) {
        deps.push(previous);
    }
    deps.push(PostProcessPass::ID);
    deps.push(ForwardPass::ID);
    deps
}
