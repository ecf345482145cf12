//! Render graph
//!
//! Provides:
//! - RenderNode: render node trait and its per-frame inputs
//! - NodeTypeRegistry: node identifier to factory + dependency query
//! - RenderCompositor: per-view execution list built from the registry
//! - TransientTexturePool: pooled render targets shared by all views
//! - passes: the built-in nodes

pub mod compositor;
pub mod node;
pub mod passes;
pub mod registry;
pub mod transient_pool;

pub use compositor::{NodeInfo, RenderCompositor};
pub use node::{NodeInputs, RenderNode};
pub use registry::{CompositorNode, NodeIdList, NodeTypeDescriptor, NodeTypeRegistry};
pub use transient_pool::{PooledTexture, TransientTexturePool};
