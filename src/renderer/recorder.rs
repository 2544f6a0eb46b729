//! Headless Recording Device
//!
//! [`RecordingDevice`] implements [`GraphicsDevice`] without a GPU: it hands
//! out sequential handles, tracks which resources are alive and appends every
//! call to a command log. It backs the test-suite and headless tooling that
//! needs to inspect what a frame would submit.

use glam::{Mat3, Mat4, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use wgpu::{BufferUsages, PrimitiveTopology, VertexFormat};

use crate::renderer::device::{
    BufferId, BufferTarget, CullMode, GraphicsDevice, UniformLocation, VertexArrayId,
};
use crate::resources::material::Blending;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateVertexArray(VertexArrayId),
    BindVertexArray(VertexArrayId),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, BufferId),
    DeleteBuffer(BufferId),
    BufferData { target: BufferTarget, bytes: usize },
    VertexAttribPointer { name: String, format: VertexFormat, stride: u32, offset: u32 },
    UniformF32 { name: String, values: Vec<f32> },
    UniformVec4 { name: String, value: Vec4 },
    UniformMat3 { name: String, values: Vec<Mat3> },
    UniformMat4 { name: String, values: Vec<Mat4> },
    Clear([f32; 4]),
    SetCullMode(CullMode),
    SetDepthState { test: bool, write: bool },
    SetBlending(Blending),
    DrawElements { topology: PrimitiveTopology, count: u32, first_index: u32 },
    DrawArrays { topology: PrimitiveTopology, first_vertex: u32, count: u32 },
}

/// A draw call extracted from the command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub topology: PrimitiveTopology,
    pub indexed: bool,
    pub start: u32,
    pub count: u32,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
    next_handle: u32,

    live_vertex_arrays: FxHashSet<VertexArrayId>,
    live_buffers: FxHashSet<BufferId>,
    invalid_deletes: usize,

    /// Names the simulated program does not expose.
    hidden_names: FxHashSet<String>,
    locations: FxHashMap<String, u32>,
    names: Vec<String>,
}

impl RecordingDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the simulated program report attribute/uniform `name` as absent.
    pub fn hide(&mut self, name: &str) {
        self.hidden_names.insert(name.to_string());
    }

    #[must_use]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.len()
    }

    #[must_use]
    pub fn live_vertex_arrays(&self) -> usize {
        self.live_vertex_arrays.len()
    }

    /// Number of deletes that targeted a handle that was not alive.
    #[must_use]
    pub fn invalid_deletes(&self) -> usize {
        self.invalid_deletes
    }

    #[must_use]
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.commands
            .iter()
            .filter_map(|cmd| match *cmd {
                DeviceCommand::DrawElements { topology, count, first_index } => Some(DrawCall {
                    topology,
                    indexed: true,
                    start: first_index,
                    count,
                }),
                DeviceCommand::DrawArrays { topology, first_vertex, count } => Some(DrawCall {
                    topology,
                    indexed: false,
                    start: first_vertex,
                    count,
                }),
                _ => None,
            })
            .collect()
    }

    /// Number of `BufferData` uploads recorded so far.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DeviceCommand::BufferData { .. }))
            .count()
    }

    /// Most recent matrix array uploaded to uniform `name`.
    #[must_use]
    pub fn last_mat4(&self, name: &str) -> Option<&[Mat4]> {
        self.commands.iter().rev().find_map(|cmd| match cmd {
            DeviceCommand::UniformMat4 { name: n, values } if n == name => Some(values.as_slice()),
            _ => None,
        })
    }

    #[must_use]
    pub fn last_f32(&self, name: &str) -> Option<&[f32]> {
        self.commands.iter().rev().find_map(|cmd| match cmd {
            DeviceCommand::UniformF32 { name: n, values } if n == name => Some(values.as_slice()),
            _ => None,
        })
    }

    /// Names of all attributes bound with `vertex_attrib_pointer`, in order.
    #[must_use]
    pub fn bound_attributes(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DeviceCommand::VertexAttribPointer { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn location_of(&mut self, name: &str) -> Option<u32> {
        if self.hidden_names.contains(name) {
            return None;
        }
        if let Some(&loc) = self.locations.get(name) {
            return Some(loc);
        }
        let loc = self.names.len() as u32;
        self.names.push(name.to_string());
        self.locations.insert(name.to_string(), loc);
        Some(loc)
    }

    fn name_of(&self, location: u32) -> String {
        self.names.get(location as usize).cloned().unwrap_or_default()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.next());
        self.live_vertex_arrays.insert(id);
        self.commands.push(DeviceCommand::CreateVertexArray(id));
        id
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        self.commands.push(DeviceCommand::BindVertexArray(vao));
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        if !self.live_vertex_arrays.remove(&vao) {
            log::warn!("RecordingDevice: deleting dead vertex array {vao:?}");
            self.invalid_deletes += 1;
        }
        self.commands.push(DeviceCommand::DeleteVertexArray(vao));
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next());
        self.live_buffers.insert(id);
        self.commands.push(DeviceCommand::CreateBuffer(id));
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        self.commands.push(DeviceCommand::BindBuffer(target, buffer));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if !self.live_buffers.remove(&buffer) {
            log::warn!("RecordingDevice: deleting dead buffer {buffer:?}");
            self.invalid_deletes += 1;
        }
        self.commands.push(DeviceCommand::DeleteBuffer(buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], _usage: BufferUsages) {
        self.commands.push(DeviceCommand::BufferData { target, bytes: data.len() });
    }

    fn attrib_location(&mut self, name: &str) -> Option<u32> {
        self.location_of(name)
    }

    fn vertex_attrib_pointer(&mut self, location: u32, format: VertexFormat, stride: u32, offset: u32) {
        let name = self.name_of(location);
        self.commands.push(DeviceCommand::VertexAttribPointer { name, format, stride, offset });
    }

    fn uniform_location(&mut self, name: &str) -> Option<UniformLocation> {
        self.location_of(name).map(UniformLocation)
    }

    fn uniform_f32_array(&mut self, location: UniformLocation, values: &[f32]) {
        let name = self.name_of(location.0);
        self.commands.push(DeviceCommand::UniformF32 { name, values: values.to_vec() });
    }

    fn uniform_vec4(&mut self, location: UniformLocation, value: Vec4) {
        let name = self.name_of(location.0);
        self.commands.push(DeviceCommand::UniformVec4 { name, value });
    }

    fn uniform_mat3_array(&mut self, location: UniformLocation, values: &[Mat3]) {
        let name = self.name_of(location.0);
        self.commands.push(DeviceCommand::UniformMat3 { name, values: values.to_vec() });
    }

    fn uniform_mat4_array(&mut self, location: UniformLocation, values: &[Mat4]) {
        let name = self.name_of(location.0);
        self.commands.push(DeviceCommand::UniformMat4 { name, values: values.to_vec() });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(DeviceCommand::Clear(color));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.commands.push(DeviceCommand::SetCullMode(mode));
    }

    fn set_depth_state(&mut self, test: bool, write: bool) {
        self.commands.push(DeviceCommand::SetDepthState { test, write });
    }

    fn set_blending(&mut self, blending: Blending) {
        self.commands.push(DeviceCommand::SetBlending(blending));
    }

    fn draw_elements(&mut self, topology: PrimitiveTopology, count: u32, first_index: u32) {
        self.commands.push(DeviceCommand::DrawElements { topology, count, first_index });
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first_vertex: u32, count: u32) {
        self.commands.push(DeviceCommand::DrawArrays { topology, first_vertex, count });
    }
}
