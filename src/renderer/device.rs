//! Graphics Device Abstraction
//!
//! The engine core never talks to a driver directly. Every vertex array,
//! buffer, uniform and draw call funnels through [`GraphicsDevice`], which an
//! application implements on top of its actual graphics backend.
//!
//! The trait is object safe; the core always receives it as
//! `&mut dyn GraphicsDevice`.

use glam::{Mat3, Mat4, Vec4};
use wgpu::{BufferUsages, PrimitiveTopology, VertexFormat};

use crate::resources::material::Blending;

/// Opaque vertex array object handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// Opaque device buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Location of a uniform in the currently bound program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Binding point for [`GraphicsDevice::bind_buffer`] and
/// [`GraphicsDevice::buffer_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

impl BufferTarget {
    #[must_use]
    pub fn usage(self) -> BufferUsages {
        match self {
            Self::Vertex => BufferUsages::VERTEX | BufferUsages::COPY_DST,
            Self::Index => BufferUsages::INDEX | BufferUsages::COPY_DST,
        }
    }
}

/// Face culling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Capability set the engine core requires from a graphics backend.
pub trait GraphicsDevice {
    // === Vertex arrays ===
    fn create_vertex_array(&mut self) -> VertexArrayId;
    fn bind_vertex_array(&mut self, vao: VertexArrayId);
    fn delete_vertex_array(&mut self, vao: VertexArrayId);

    // === Buffers ===
    fn create_buffer(&mut self) -> BufferId;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);
    fn delete_buffer(&mut self, buffer: BufferId);
    /// Uploads `data` into the buffer currently bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsages);

    // === Vertex attributes (current program) ===
    /// Returns `None` when the current program has no attribute `name`.
    fn attrib_location(&mut self, name: &str) -> Option<u32>;
    fn vertex_attrib_pointer(&mut self, location: u32, format: VertexFormat, stride: u32, offset: u32);

    // === Uniforms (current program) ===
    /// Returns `None` when the current program has no uniform `name`.
    fn uniform_location(&mut self, name: &str) -> Option<UniformLocation>;
    fn uniform_f32_array(&mut self, location: UniformLocation, values: &[f32]);
    fn uniform_vec4(&mut self, location: UniformLocation, value: Vec4);
    fn uniform_mat3_array(&mut self, location: UniformLocation, values: &[Mat3]);
    fn uniform_mat4_array(&mut self, location: UniformLocation, values: &[Mat4]);

    // === Fixed-function state ===
    /// Clears the color and depth targets.
    fn clear(&mut self, color: [f32; 4]);
    fn set_cull_mode(&mut self, mode: CullMode);
    fn set_depth_state(&mut self, test: bool, write: bool);
    fn set_blending(&mut self, blending: Blending);

    // === Draws ===
    /// Draws `count` indices of the bound index buffer starting at `first_index`.
    fn draw_elements(&mut self, topology: PrimitiveTopology, count: u32, first_index: u32);
    /// Draws `count` vertices in buffer order starting at `first_vertex`.
    fn draw_arrays(&mut self, topology: PrimitiveTopology, first_vertex: u32, count: u32);
}

/// Looks up `name` and uploads a single matrix. Missing uniforms are skipped:
/// a program is free to not consume every matrix the engine provides.
pub fn upload_mat4(device: &mut dyn GraphicsDevice, name: &str, value: &Mat4) {
    if let Some(location) = device.uniform_location(name) {
        device.uniform_mat4_array(location, std::slice::from_ref(value));
    }
}

pub fn upload_mat3(device: &mut dyn GraphicsDevice, name: &str, value: &Mat3) {
    if let Some(location) = device.uniform_location(name) {
        device.uniform_mat3_array(location, std::slice::from_ref(value));
    }
}
