#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{RenderError, Result};
pub use renderer::core::{GpuDevice, HeadlessDevice};
pub use renderer::graph::{
    CompositorNode, NodeInputs, NodeTypeDescriptor, NodeTypeRegistry, RenderCompositor, RenderNode,
    TransientTexturePool,
};
pub use renderer::{
    FrameInfo, RenderSettings, RendererRenderable, RendererView, RendererViewDesc,
    RendererViewGroup, SceneInfo,
};
pub use resources::{Material, Mesh, ShaderFlags, SubMesh, Technique};
pub use scene::{Aabb, Bounds, ConvexVolume, Sphere};
