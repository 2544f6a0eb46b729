use glam::Mat4;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::scene::{Node, NodeHandle};

/// Ordered bone list for a skinned mesh.
///
/// `bones[i]` is the node driving joint `i` in the shader; its inverse bind
/// matrix maps mesh space into that bone's bind-pose local space.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub uuid: Uuid,
    pub name: String,

    bones: Vec<NodeHandle>,
    inverse_bind_matrices: Vec<Mat4>,

    /// Last computed bone matrices, one per bone.
    bone_matrices: Vec<Mat4>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new("Skeleton")
    }
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            bones: Vec::new(),
            inverse_bind_matrices: Vec::new(),
            bone_matrices: Vec::new(),
        }
    }

    /// Appends a bone. The inverse bind matrix defaults to identity.
    pub fn add_bone(&mut self, node: NodeHandle, inverse_bind_matrix: Option<Mat4>) {
        self.bones.push(node);
        self.inverse_bind_matrices
            .push(inverse_bind_matrix.unwrap_or(Mat4::IDENTITY));
        self.bone_matrices.push(Mat4::IDENTITY);
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[NodeHandle] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Matrices from the last [`Skeleton::bone_matrices`] call.
    #[inline]
    #[must_use]
    pub fn matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    /// Recomputes `inv_root * (bone_world * inverse_bind)` for every bone.
    ///
    /// `inv_root` is the inverse world matrix of the skinned mesh's node, so
    /// the result is in mesh space. Bones whose node no longer exists keep
    /// their previous matrix.
    pub fn bone_matrices(&mut self, nodes: &SlotMap<NodeHandle, Node>, inv_root: &Mat4) -> &[Mat4] {
        for (i, &bone) in self.bones.iter().enumerate() {
            let Some(node) = nodes.get(bone) else {
                continue;
            };
            let bone_world = Mat4::from(node.transform.world_matrix);
            self.bone_matrices[i] = *inv_root * (bone_world * self.inverse_bind_matrices[i]);
        }
        &self.bone_matrices
    }
}
