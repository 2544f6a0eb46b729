//! Scene graph
//!
//! - Node: hierarchy, transform and an optional graphic component
//! - Transform: TRS with cached local/world matrices
//! - TransformSystem: world-matrix propagation
//! - Camera: view/projection and frustum
//! - Skeleton: bone list and per-frame bone matrices
//! - Scene: node and graphic storage, lookup, raycasting

pub mod camera;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use camera::{Camera, Frustum, ProjectionType};
pub use node::Node;
pub use scene::Scene;
pub use skeleton::Skeleton;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct GraphicKey;
}
