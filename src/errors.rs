//! Error Types
//!
//! This module defines the error types used by the compositor and the view layer.
//!
//! # Overview
//!
//! [`RenderError`] covers the three failure families of frame composition:
//! - Configuration errors: a node references an identifier nobody registered
//! - Structural errors: node dependencies form a cycle
//! - Resource errors: the graphics device failed to hand out a render target
//!
//! The first two are detected while building a compositor and only invalidate
//! that compositor. Resource errors are produced by the device layer and bubble
//! out of execution unchanged.
//!
//! ```rust,ignore
//! use myth_compositor::errors::{RenderError, Result};
//!
//! fn rebuild(view: &mut RendererView) -> Result<()> {
//!     view.rebuild_compositor()
//! }
//! ```

use thiserror::Error;

/// The main error type for frame composition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    // ========================================================================
    // Graph Build Errors
    // ========================================================================
    /// A node identifier was requested that has no registered node type.
    #[error("Cannot find render compositor node of type \"{id}\"")]
    UnknownNodeType {
        /// The unregistered identifier
        id: String,
    },

    /// Node dependencies form a cycle.
    #[error(
        "Render compositor node recursion detected: node \"{node}\" depends on node \"{dependency}\" which is not available at this stage"
    )]
    DependencyCycle {
        /// Node whose dependency list closed the cycle
        node: String,
        /// Dependency that was still being resolved
        dependency: String,
    },

    /// Execution was requested on a compositor whose last build failed.
    #[error("Render compositor is not valid; rebuild it before executing")]
    CompositorInvalid,

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The graphics device could not allocate a transient resource.
    #[error("Resource allocation failed: {0}")]
    ResourceAllocation(String),
}

impl RenderError {
    /// Returns `true` for errors that are detected while building a graph.
    #[inline]
    #[must_use]
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownNodeType { .. } | Self::DependencyCycle { .. }
        )
    }
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
