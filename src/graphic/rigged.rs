use crate::renderer::device::GraphicsDevice;
use crate::resources::shader_defines::ShaderDefines;
use crate::scene::skeleton::Skeleton;

/// Uniform array receiving the bone matrices.
pub const BONES_UNIFORM: &str = "mBones";

/// Bone weights per vertex expected by the skinning shader.
pub const BONE_INFLUENCERS: usize = 4;

pub(super) fn transfer_bones(skeleton: &Skeleton, device: &mut dyn GraphicsDevice) {
    match device.uniform_location(BONES_UNIFORM) {
        Some(location) => device.uniform_mat4_array(location, skeleton.matrices()),
        None => log::warn!("RiggedMesh: program has no '{BONES_UNIFORM}' uniform"),
    }
}

pub(super) fn shader_defines(skeleton: &Skeleton) -> ShaderDefines {
    let mut defines = ShaderDefines::new();
    defines.set("TOTAL_BONES", &skeleton.bone_count().to_string());
    defines.set("BONE_INFLUENCERS", &BONE_INFLUENCERS.to_string());
    defines
}
