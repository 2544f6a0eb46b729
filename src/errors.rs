//! Error Types
//!
//! This module defines the error type used throughout the engine core.
//!
//! # Overview
//!
//! [`PrismError`] covers the structural failures the core can detect:
//! - Invariant violations in geometry construction (duplicate attributes,
//!   morph weight count mismatches, invalid group indices)
//! - Draw ranges that exceed the buffers they address
//! - Degenerate vertex data detected while computing derived properties
//!
//! Missing optional data (no normals, no indices, no materials) is not an
//! error: dependent algorithms skip the feature instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism::errors::{PrismError, Result};
//!
//! fn build() -> Result<()> {
//!     geometry.add_vertex_buffer(vbo)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Prism engine core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrismError {
    // ========================================================================
    // Geometry Construction Errors
    // ========================================================================
    /// A vertex buffer declares an attribute that another buffer of the same
    /// geometry already provides.
    #[error("Geometry already has a vertex buffer with attribute '{name}'")]
    DuplicateAttribute {
        /// Name of the conflicting attribute
        name: String,
    },

    /// All vertex buffers of a geometry must describe the same vertex count.
    #[error("Vertex count mismatch: geometry has {expected} vertices, buffer has {actual}")]
    VertexCountMismatch {
        /// Vertex count of the buffers already owned
        expected: usize,
        /// Vertex count of the rejected buffer
        actual: usize,
    },

    /// Morph weights must match the number of morph targets one to one.
    #[error("Morph weight count mismatch: expected {expected}, got {actual}")]
    WeightCountMismatch {
        /// Number of morph targets
        expected: usize,
        /// Number of weights supplied
        actual: usize,
    },

    /// A geometry group index outside `0..count` was requested.
    #[error("Invalid geometry group index {index} (group count: {count})")]
    InvalidGroupIndex {
        /// The invalid index
        index: usize,
        /// Number of groups in the geometry
        count: usize,
    },

    /// Position, normal and tangent attributes carry three components or more.
    #[error("Attribute '{name}' has {components} components, at least 3 are required")]
    AttributeTooNarrow {
        /// Name of the rejected attribute
        name: String,
        /// Declared component count
        components: u32,
    },

    /// A required vertex attribute is missing.
    #[error("Geometry has no '{0}' attribute")]
    MissingAttribute(String),

    // ========================================================================
    // Numeric Errors
    // ========================================================================
    /// Derived geometric data could not be computed from the vertex data.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    // ========================================================================
    // Rendering Errors
    // ========================================================================
    /// A material binding addresses elements past the end of the geometry.
    #[error("Draw range {start}..{end} exceeds {available} available elements")]
    DrawRangeOutOfBounds {
        /// First element of the range
        start: usize,
        /// One past the last element of the range
        end: usize,
        /// Number of indices (or vertices for non-indexed geometry)
        available: usize,
    },

    // ========================================================================
    // Scene Errors
    // ========================================================================
    /// The requested scene node does not exist (removed or never created).
    #[error("Scene node not found")]
    NodeNotFound,

    /// Attaching would make a node its own ancestor.
    #[error("Attaching the node would create a cycle in the hierarchy")]
    HierarchyCycle,
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;
