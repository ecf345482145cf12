//! Render Compositor
//!
//! Builds a per-view node execution list from a requested final node and runs
//! it once per frame.
//!
//! # Build
//!
//! Dependencies are resolved depth-first. An identifier is marked in-progress
//! before its dependencies are visited, so meeting an in-progress identifier
//! again means the dependency graph has a cycle. A node is appended only after
//! all of its dependencies, which makes the list a topological order. Shared
//! dependencies are instantiated once.
//!
//! Each node records the position of its latest consumer (`last_use`). During
//! execution a node is cleared as soon as the current position reaches its
//! last use, which bounds the number of live transient targets.
//!
//! ```text
//! FinalResolve ─► PostProcess ─► ForwardPass
//!      │               └───────► Skybox ─► ForwardPass
//!      └──────────► Skybox
//!
//! order:     [ForwardPass, Skybox, PostProcess, FinalResolve]
//! last_use:  [     2     ,   3   ,      3     ,     None    ]
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::node::{NodeInputs, RenderNode};
use super::registry::{NodeTypeDescriptor, NodeTypeRegistry};
use super::transient_pool::TransientTexturePool;
use crate::errors::{RenderError, Result};
use crate::renderer::core::gpu::GpuDevice;
use crate::renderer::renderable::SceneInfo;
use crate::renderer::view::RendererView;

/// One instantiated node of a built compositor.
pub struct NodeInfo {
    node: Box<dyn RenderNode>,
    descriptor: Arc<NodeTypeDescriptor>,
    inputs: SmallVec<[usize; 4]>,
    last_use: Option<usize>,
}

impl NodeInfo {
    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.descriptor.id()
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> &dyn RenderNode {
        self.node.as_ref()
    }

    /// Positions of this node's dependencies in the execution list.
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Position of the latest node that depends on this one. `None` for the
    /// final node.
    #[inline]
    #[must_use]
    pub fn last_use(&self) -> Option<usize> {
        self.last_use
    }
}

impl std::fmt::Debug for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInfo")
            .field("id", &self.id())
            .field("inputs", &self.inputs)
            .field("last_use", &self.last_use)
            .finish()
    }
}

#[derive(Clone, Copy)]
enum Visit {
    InProgress,
    Resolved(usize),
}

/// Executable node graph owned by a single view.
#[derive(Default, Debug)]
pub struct RenderCompositor {
    nodes: Vec<NodeInfo>,
    valid: bool,
}

impl RenderCompositor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the execution list ending in `final_node`.
    ///
    /// On failure the compositor is left empty and invalid.
    pub fn build(
        &mut self,
        registry: &NodeTypeRegistry,
        view: &RendererView,
        final_node: &str,
    ) -> Result<()> {
        self.clear();

        let mut processed = FxHashMap::default();
        if let Err(err) = self.register_node(registry, view, final_node, &mut processed) {
            self.clear();
            return Err(err);
        }

        self.valid = true;
        log::debug!(
            "Render compositor built for \"{final_node}\": {} nodes {:?}",
            self.nodes.len(),
            self.node_ids().collect::<SmallVec<[_; 16]>>()
        );
        Ok(())
    }

    fn register_node(
        &mut self,
        registry: &NodeTypeRegistry,
        view: &RendererView,
        id: &str,
        processed: &mut FxHashMap<&'static str, Visit>,
    ) -> Result<usize> {
        let descriptor = registry
            .lookup(id)
            .ok_or_else(|| RenderError::UnknownNodeType { id: id.to_owned() })?
            .clone();
        let node_id = descriptor.id();

        if let Some(Visit::Resolved(idx)) = processed.get(node_id) {
            return Ok(*idx);
        }
        processed.insert(node_id, Visit::InProgress);

        let mut inputs = SmallVec::<[usize; 4]>::new();
        for dependency in descriptor.dependencies(view) {
            if let Some(Visit::InProgress) = processed.get(dependency) {
                return Err(RenderError::DependencyCycle {
                    node: node_id.to_owned(),
                    dependency: dependency.to_owned(),
                });
            }
            inputs.push(self.register_node(registry, view, dependency, processed)?);
        }

        let idx = self.nodes.len();
        for &input in &inputs {
            let last_use = &mut self.nodes[input].last_use;
            *last_use = Some(last_use.map_or(idx, |prev| prev.max(idx)));
        }

        self.nodes.push(NodeInfo {
            node: descriptor.instantiate(),
            descriptor,
            inputs,
            last_use: None,
        });
        processed.insert(node_id, Visit::Resolved(idx));

        Ok(idx)
    }

    /// Runs every node in order. Does nothing on an invalid compositor.
    ///
    /// Nodes are cleared once the current position reaches their last use; the
    /// final node is cleared after the loop. Errors from a node (allocation
    /// failures) abort the frame after releasing every live node.
    pub fn execute(
        &mut self,
        view: &RendererView,
        scene: &SceneInfo,
        device: &mut dyn GpuDevice,
        pool: &TransientTexturePool,
    ) -> Result<()> {
        if !self.valid {
            return Ok(());
        }

        let mut active: SmallVec<[usize; 16]> = SmallVec::new();

        for idx in 0..self.nodes.len() {
            let result = {
                let (executed, rest) = self.nodes.split_at_mut(idx);
                let info = &mut rest[0];

                let input_nodes: SmallVec<[&(dyn RenderNode + 'static); 4]> = info
                    .inputs
                    .iter()
                    .map(|&input| -> &(dyn RenderNode + 'static) { executed[input].node.as_ref() })
                    .collect();

                let mut node_inputs = NodeInputs {
                    view,
                    scene,
                    device: &mut *device,
                    pool,
                    input_nodes: &input_nodes,
                };

                info.node.render(&mut node_inputs)
            };

            if let Err(err) = result {
                log::warn!("Render compositor node \"{}\" failed: {err}", self.nodes[idx].id());
                self.nodes[idx].node.clear();
                for &live in &active {
                    self.nodes[live].node.clear();
                }
                return Err(err);
            }

            active.push(idx);

            let nodes = &mut self.nodes;
            active.retain(|&mut live| {
                let done = nodes[live].last_use.is_some_and(|last| last <= idx);
                if done {
                    log::trace!("Clearing render compositor node \"{}\"", nodes[live].id());
                    nodes[live].node.clear();
                }
                !done
            });
        }

        if let Some(last) = self.nodes.last_mut() {
            log::trace!("Clearing final render compositor node \"{}\"", last.id());
            last.node.clear();
        }

        Ok(())
    }

    /// Like [`execute`](Self::execute) but reports an invalid compositor.
    pub fn try_execute(
        &mut self,
        view: &RendererView,
        scene: &SceneInfo,
        device: &mut dyn GpuDevice,
        pool: &TransientTexturePool,
    ) -> Result<()> {
        if !self.valid {
            return Err(RenderError::CompositorInvalid);
        }
        self.execute(view, scene, device, pool)
    }

    /// Destroys every node and marks the compositor invalid.
    pub fn clear(&mut self) {
        for info in &mut self.nodes {
            info.node.clear();
        }
        self.nodes.clear();
        self.valid = false;
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in execution order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    /// Node identifiers in execution order.
    pub fn node_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nodes.iter().map(NodeInfo::id)
    }

    /// Execution position of `id`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|info| info.id() == id)
    }

    #[must_use]
    pub fn node_info(&self, id: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|info| info.id() == id)
    }

    /// Last-use position of `id`; `None` if the node is absent or final.
    #[must_use]
    pub fn last_use(&self, id: &str) -> Option<usize> {
        self.node_info(id).and_then(NodeInfo::last_use)
    }
}
