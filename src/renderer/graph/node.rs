//! Render Node Trait
//!
//! Defines the abstract interface of a compositor node. Every node is one
//! rendering pass instance created by a [`NodeTypeDescriptor`] factory while
//! the compositor builds its execution list.
//!
//! # Lifecycle
//!
//! ```text
//! build ──► render(inputs) ──► (downstream nodes read outputs) ──► clear()
//!                 ▲                                                   │
//!                 └──────────────────── next frame ◄──────────────────┘
//! ```
//!
//! - `render` allocates transient targets from the pool and records device work.
//! - `clear` drops every [`PooledTexture`] the node holds. The compositor calls
//!   it once no later node lists this node as a dependency.
//!
//! [`NodeTypeDescriptor`]: super::registry::NodeTypeDescriptor
//! [`PooledTexture`]: super::transient_pool::PooledTexture

use std::any::Any;

use crate::errors::Result;
use crate::renderer::core::gpu::{GpuDevice, TextureId};
use crate::renderer::graph::transient_pool::TransientTexturePool;
use crate::renderer::renderable::SceneInfo;
use crate::renderer::view::RendererView;

/// Render Node Trait
///
/// All compositor passes implement this interface.
///
/// # Design Principles
/// - A node only reads its dependencies through [`NodeInputs::input_nodes`];
///   they are guaranteed to have rendered earlier in the same frame.
/// - Resources acquired in `render` must be released by the same node's
///   `clear`, never by another node.
pub trait RenderNode: Any {
    /// Returns the node name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Records this node's work for the current frame.
    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()>;

    /// Releases transient resources acquired in `render`.
    fn clear(&mut self);

    /// Primary color output read by downstream nodes, if any.
    fn output(&self) -> Option<TextureId> {
        None
    }
}

/// Everything a node sees while rendering.
pub struct NodeInputs<'a> {
    /// View that owns the executing compositor.
    pub view: &'a RendererView,
    pub scene: &'a SceneInfo,
    pub device: &'a mut dyn GpuDevice,
    pub pool: &'a TransientTexturePool,
    /// Resolved dependencies, in the order the node's dependency query
    /// returned them.
    pub input_nodes: &'a [&'a (dyn RenderNode + 'static)],
}

impl<'a> NodeInputs<'a> {
    /// Returns the dependency at `index` if it is a `T`.
    #[must_use]
    pub fn input<T: RenderNode>(&self, index: usize) -> Option<&'a T> {
        let node: &'a (dyn RenderNode + 'static) = self.input_nodes.get(index).copied()?;
        let any: &'a (dyn Any + 'static) = node;
        any.downcast_ref::<T>()
    }

    /// Returns the first dependency of type `T`.
    #[must_use]
    pub fn find<T: RenderNode>(&self) -> Option<&'a T> {
        let nodes: &'a [&'a (dyn RenderNode + 'static)] = self.input_nodes;
        nodes.iter().find_map(|&node| {
            let any: &'a (dyn Any + 'static) = node;
            any.downcast_ref::<T>()
        })
    }
}
