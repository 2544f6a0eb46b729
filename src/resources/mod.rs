//! Core resource definitions
//!
//! CPU-side data the drawing core works with, independent of any device:
//! - VertexBuffer: interleaved vertex attributes
//! - Geometry / MorphGeometry: buffers, indices, groups, derived properties
//! - GeometryHandle: shared, owner-counted geometry reference
//! - Material: device state setup and culled side
//! - ShaderDefines: shader feature macros
//! - primitives: procedural box / sphere generators

pub mod buffer;
pub mod geometry;
pub mod geometry_kind;
pub mod material;
pub mod morph;
pub mod primitives;
pub mod shader_defines;

pub use buffer::{AttribKind, BufferResidency, VertexAttribute, VertexBuffer};
pub use geometry::{Face, Geometry, GeometryResidency, Group, Segment};
pub use geometry_kind::{GeometryHandle, GeometryKind};
pub use material::{BasicMaterial, Blending, Material, MaterialSettings, Side};
pub use morph::{ActiveTargets, MorphGeometry, MORPH_WEIGHTS_UNIFORM, NUM_MORPH_TARGETS};
pub use shader_defines::ShaderDefines;
