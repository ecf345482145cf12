//! Node Type Registry
//!
//! Maps a node identifier to the descriptor that knows how to create the node
//! and which identifiers it depends on for a given view.
//!
//! The registry is built once at startup, wrapped in an `Arc` and shared
//! read-only by every view. Registering an identifier twice replaces the
//! earlier descriptor.
//!
//! ```rust,ignore
//! let mut registry = NodeTypeRegistry::with_default_nodes();
//! registry.register_node::<MyOutlinePass>();
//! let registry = Arc::new(registry);
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::node::RenderNode;
use super::passes;
use crate::renderer::view::RendererView;

/// Ordered dependency identifiers returned by a dependency query.
pub type NodeIdList = SmallVec<[&'static str; 4]>;

type NodeFactory = Box<dyn Fn() -> Box<dyn RenderNode> + Send + Sync>;
type DependencyQuery = Box<dyn Fn(&RendererView) -> NodeIdList + Send + Sync>;

/// Describes one kind of compositor node.
pub struct NodeTypeDescriptor {
    id: &'static str,
    factory: NodeFactory,
    dependencies: DependencyQuery,
}

impl NodeTypeDescriptor {
    pub fn new<F, D>(id: &'static str, factory: F, dependencies: D) -> Self
    where
        F: Fn() -> Box<dyn RenderNode> + Send + Sync + 'static,
        D: Fn(&RendererView) -> NodeIdList + Send + Sync + 'static,
    {
        Self {
            id,
            factory: Box::new(factory),
            dependencies: Box::new(dependencies),
        }
    }

    /// Descriptor for a statically known node type.
    #[must_use]
    pub fn of<T: CompositorNode>() -> Self {
        Self::new(
            T::ID,
            || -> Box<dyn RenderNode> { Box::new(T::default()) },
            T::dependencies,
        )
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Creates a fresh node instance.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn RenderNode> {
        (self.factory)()
    }

    /// Identifiers this node depends on when rendering `view`.
    #[must_use]
    pub fn dependencies(&self, view: &RendererView) -> NodeIdList {
        (self.dependencies)(view)
    }
}

impl std::fmt::Debug for NodeTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTypeDescriptor")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A node type with a compile-time identifier.
pub trait CompositorNode: RenderNode + Default {
    const ID: &'static str;

    fn dependencies(view: &RendererView) -> NodeIdList;
}

/// Identifier → descriptor table.
#[derive(Default, Debug)]
pub struct NodeTypeRegistry {
    descriptors: FxHashMap<&'static str, Arc<NodeTypeDescriptor>>,
}

impl NodeTypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in pass.
    #[must_use]
    pub fn with_default_nodes() -> Self {
        let mut registry = Self::new();
        passes::register_default_nodes(&mut registry);
        registry
    }

    /// Stores `descriptor`, returning the one it replaced.
    pub fn register(&mut self, descriptor: NodeTypeDescriptor) -> Option<Arc<NodeTypeDescriptor>> {
        let id = descriptor.id;
        let previous = self.descriptors.insert(id, Arc::new(descriptor));
        if previous.is_some() {
            log::debug!("Render compositor node type \"{id}\" re-registered, replacing previous descriptor");
        }
        previous
    }

    pub fn register_node<T: CompositorNode>(&mut self) -> Option<Arc<NodeTypeDescriptor>> {
        self.register(NodeTypeDescriptor::of::<T>())
    }

    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&Arc<NodeTypeDescriptor>> {
        self.descriptors.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered identifiers in arbitrary order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::renderer::graph::node::NodeInputs;
    use smallvec::smallvec;

    #[derive(Default)]
    struct Marker(u32);

    impl RenderNode for Marker {
        fn name(&self) -> &'static str {
            "Marker"
        }

        fn render(&mut self, _inputs: &mut NodeInputs<'_>) -> Result<()> {
            Ok(())
        }

        fn clear(&mut self) {}
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = NodeTypeRegistry::new();
        assert!(
            registry
                .register(NodeTypeDescriptor::new(
                    "A",
                    || -> Box<dyn RenderNode> { Box::new(Marker(1)) },
                    |_| smallvec![],
                ))
                .is_none()
        );
        let replaced = registry.register(NodeTypeDescriptor::new(
            "A",
            || -> Box<dyn RenderNode> { Box::new(Marker(2)) },
            |_| smallvec!["B"],
        ));

        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
        let node = registry.lookup("A").map(|d| d.instantiate());
        let any = node.as_deref().map(|n| n as &dyn std::any::Any);
        assert_eq!(any.and_then(|a| a.downcast_ref::<Marker>()).map(|m| m.0), Some(2));
    }

    #[test]
    fn lookup_of_unknown_id_is_none() {
        let registry = NodeTypeRegistry::with_default_nodes();
        assert!(registry.lookup("DoesNotExist").is_none());
        assert!(registry.contains("FinalResolve"));
        assert!(registry.contains("ForwardPass"));
    }
}
