//! Renderer
//!
//! Provides:
//! - RendererView: one camera rendering into one target through its compositor
//! - RendererViewGroup: views sharing a scene, with joint visibility and instancing
//! - RenderQueue: sorted per-view draw lists
//! - RenderSettings: per-view feature and effect configuration
//! - core: the device seam and uniform layouts
//! - graph: the node registry, compositor and built-in passes

pub mod core;
pub mod graph;
pub mod queue;
pub mod renderable;
pub mod settings;
pub mod view;
pub mod view_group;

pub use queue::{ElementRef, RenderQueue, RenderQueueElement};
pub use renderable::{CullInfo, RenderableElement, RendererRenderable, SceneInfo};
pub use settings::{
    AmbientOcclusionSettings, BloomSettings, CullingFlags, DepthOfFieldSettings, FxaaSettings,
    InstancingMode, MotionBlurSettings, RenderSettings, StateReduction, ToneMappingSettings,
};
pub use view::{
    FrameInfo, InstancedElement, RedrawState, RenderTargetDesc, RendererView, RendererViewDesc,
    RendererViewProperties,
};
pub use view_group::{INSTANCING_THRESHOLD, InstancedBuffer, RendererViewGroup};
