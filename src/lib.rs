//! Prism: geometry buffers and drawable graphics for a retained scene graph.
//!
//! - [`resources`]: vertex buffers, geometries, morph targets, materials
//! - [`graphic`]: meshes, lines, points, sprites and skinned meshes
//! - [`scene`]: nodes, transforms, cameras, skeletons
//! - [`renderer`]: the device boundary and the frame loop
//! - [`raycaster`]: picking

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod graphic;
pub mod math;
pub mod raycaster;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{PrismError, Result};
pub use graphic::{Graphic, GraphicKind, GraphicMaterial, MaterialRef, RenderInfo};
pub use math::{BoundingBox, BoundingSphere, Ray};
pub use raycaster::{Intersection, Raycaster};
pub use renderer::{GraphicsDevice, RecordingDevice, RenderStats, Renderer, RendererSettings};
pub use resources::primitives::*;
pub use resources::{
    AttribKind, BasicMaterial, Geometry, GeometryHandle, GeometryKind, Material, MorphGeometry,
    ShaderDefines, Side, VertexBuffer,
};
pub use scene::{Camera, Node, NodeHandle, Scene, Skeleton, Transform};
