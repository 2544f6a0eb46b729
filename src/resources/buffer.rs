use glam::Vec3;
use uuid::Uuid;
use wgpu::VertexFormat;

use crate::renderer::device::{BufferId, BufferTarget, GraphicsDevice};

/// Semantic of a vertex attribute.
///
/// A geometry holds at most one attribute of each kind except [`AttribKind::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttribKind {
    Position,
    Normal,
    Tangent,
    TexCoord,
    Color,
    SkinIndex,
    SkinWeight,
    Custom,
}

impl AttribKind {
    /// Shader attribute name used when none is given explicitly.
    #[must_use]
    pub fn default_name(self) -> &'static str {
        match self {
            Self::Position => "VertexPosition",
            Self::Normal => "VertexNormal",
            Self::Tangent => "VertexTangent",
            Self::TexCoord => "VertexTexcoord",
            Self::Color => "VertexColor",
            Self::SkinIndex => "matricesIndices",
            Self::SkinWeight => "matricesWeights",
            Self::Custom => "Custom",
        }
    }

    /// Suffix of the `HAS_*` shader define for this kind.
    #[must_use]
    pub fn define_name(self) -> Option<&'static str> {
        match self {
            Self::Position => Some("HAS_POSITION"),
            Self::Normal => Some("HAS_NORMAL"),
            Self::Tangent => Some("HAS_TANGENT"),
            Self::TexCoord => Some("HAS_UV"),
            Self::Color => Some("HAS_COLOR"),
            Self::SkinIndex => Some("HAS_SKIN_INDEX"),
            Self::SkinWeight => Some("HAS_SKIN_WEIGHT"),
            Self::Custom => None,
        }
    }

    /// Whether the kind is read and written as a `Vec3`.
    #[must_use]
    pub fn is_vector(self) -> bool {
        matches!(self, Self::Position | Self::Normal | Self::Tangent)
    }
}

/// One entry of a vertex buffer's attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    pub kind: AttribKind,
    pub name: String,
    /// Number of `f32` components (1..=4).
    pub components: u32,
}

impl VertexAttribute {
    #[must_use]
    pub fn format(&self) -> VertexFormat {
        match self.components {
            1 => VertexFormat::Float32,
            2 => VertexFormat::Float32x2,
            4 => VertexFormat::Float32x4,
            _ => VertexFormat::Float32x3,
        }
    }
}

/// Device residency of a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferResidency {
    #[default]
    Uninitialized,
    Resident { buffer: BufferId },
}

/// Interleaved `f32` vertex data plus the table describing its layout.
///
/// Offsets are derived from declaration order: the first attribute starts at
/// byte 0, the next one right after it, and so on. `stride()` is the sum of
/// all attribute sizes.
#[derive(Debug)]
pub struct VertexBuffer {
    pub uuid: Uuid,
    attributes: Vec<VertexAttribute>,
    data: Vec<f32>,
    needs_update: bool,
    residency: BufferResidency,
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning copies the CPU data only; the clone has its own device residency.
impl Clone for VertexBuffer {
    fn clone(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            attributes: self.attributes.clone(),
            data: self.data.clone(),
            needs_update: true,
            residency: BufferResidency::Uninitialized,
        }
    }
}

impl VertexBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            attributes: Vec::new(),
            data: Vec::new(),
            needs_update: true,
            residency: BufferResidency::Uninitialized,
        }
    }

    /// Convenience constructor for a single `Vec3` attribute.
    #[must_use]
    pub fn from_vec3(kind: AttribKind, values: &[Vec3]) -> Self {
        let mut vbo = Self::new().with_attribute(kind, 3);
        vbo.data = values.iter().flat_map(|v| v.to_array()).collect();
        vbo
    }

    #[must_use]
    pub fn with_attribute(mut self, kind: AttribKind, components: u32) -> Self {
        self.add_attribute(kind, kind.default_name(), components);
        self
    }

    #[must_use]
    pub fn with_named_attribute(mut self, kind: AttribKind, name: &str, components: u32) -> Self {
        self.add_attribute(kind, name, components);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.set_data(data);
        self
    }

    pub fn add_attribute(&mut self, kind: AttribKind, name: &str, components: u32) {
        self.attributes.push(VertexAttribute {
            kind,
            name: name.to_string(),
            components: components.clamp(1, 4),
        });
    }

    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, kind: AttribKind) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.kind == kind)
    }

    #[must_use]
    pub fn attribute_by_name(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Renames the attribute of the given kind. Returns `false` when absent.
    pub fn set_attribute_name(&mut self, kind: AttribKind, name: &str) -> bool {
        match self.attributes.iter_mut().find(|a| a.kind == kind) {
            Some(attr) => {
                if attr.name != name {
                    name.clone_into(&mut attr.name);
                }
                true
            }
            None => false,
        }
    }

    /// Offset in floats of the attribute of `kind` within one vertex.
    #[must_use]
    pub fn attribute_offset(&self, kind: AttribKind) -> Option<usize> {
        let mut offset = 0;
        for attr in &self.attributes {
            if attr.kind == kind {
                return Some(offset);
            }
            offset += attr.components as usize;
        }
        None
    }

    /// Number of floats per vertex.
    #[must_use]
    pub fn floats_per_vertex(&self) -> usize {
        self.attributes.iter().map(|a| a.components as usize).sum()
    }

    /// Bytes per vertex.
    #[must_use]
    pub fn stride(&self) -> u32 {
        (self.floats_per_vertex() * std::mem::size_of::<f32>()) as u32
    }

    /// Number of vertices described by the data.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self.floats_per_vertex() {
            0 => 0,
            n => self.data.len() / n,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the raw data; marks the buffer for upload.
    pub fn data_mut(&mut self) -> &mut Vec<f32> {
        self.needs_update = true;
        &mut self.data
    }

    pub fn set_data(&mut self, data: Vec<f32>) {
        self.data = data;
        self.needs_update = true;
    }

    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    #[must_use]
    pub fn residency(&self) -> BufferResidency {
        self.residency
    }

    /// Reads the `Vec3` stored at float offset `offset` of vertex `index`.
    #[must_use]
    pub fn vec3_at(&self, offset: usize, index: usize) -> Option<Vec3> {
        let start = index * self.floats_per_vertex() + offset;
        self.data.get(start..start + 3).map(Vec3::from_slice)
    }

    pub fn set_vec3_at(&mut self, offset: usize, index: usize, value: Vec3) {
        let start = index * self.floats_per_vertex() + offset;
        if let Some(slot) = self.data.get_mut(start..start + 3) {
            value.write_to_slice(slot);
            self.needs_update = true;
        }
    }

    /// Float offset of attribute `kind` when it holds at least three components.
    fn vec3_offset(&self, kind: AttribKind) -> Option<usize> {
        match self.attribute(kind) {
            Some(attr) if attr.components >= 3 => self.attribute_offset(kind),
            _ => None,
        }
    }

    /// Visits every `Vec3` of attribute `kind` in vertex order. The callback
    /// returns `true` to stop early.
    pub fn read_vec3(&self, kind: AttribKind, mut f: impl FnMut(Vec3) -> bool) {
        let Some(offset) = self.vec3_offset(kind) else {
            return;
        };
        let step = self.floats_per_vertex();
        for chunk in self.data.chunks_exact(step) {
            if f(Vec3::from_slice(&chunk[offset..offset + 3])) {
                break;
            }
        }
    }

    /// Mutates every `Vec3` of attribute `kind` in place. The callback returns
    /// `true` to stop early. Marks the buffer for upload.
    pub fn operate_on_vec3(&mut self, kind: AttribKind, mut f: impl FnMut(&mut Vec3) -> bool) {
        let Some(offset) = self.vec3_offset(kind) else {
            return;
        };
        let step = self.floats_per_vertex();
        for chunk in self.data.chunks_exact_mut(step) {
            let slot = &mut chunk[offset..offset + 3];
            let mut v = Vec3::from_slice(slot);
            let stop = f(&mut v);
            v.write_to_slice(slot);
            if stop {
                break;
            }
        }
        self.needs_update = true;
    }

    /// Binds this buffer's attributes for the current program, creating the
    /// device buffer on first use and uploading the data when dirty.
    pub fn transfer(&mut self, device: &mut dyn GraphicsDevice) {
        let buffer = match self.residency {
            BufferResidency::Resident { buffer } => buffer,
            BufferResidency::Uninitialized => {
                let buffer = device.create_buffer();
                log::debug!("VertexBuffer {}: created device buffer {buffer:?}", self.uuid);
                self.residency = BufferResidency::Resident { buffer };
                self.needs_update = true;
                buffer
            }
        };

        device.bind_buffer(BufferTarget::Vertex, buffer);
        if self.needs_update {
            log::trace!("VertexBuffer {}: uploading {} floats", self.uuid, self.data.len());
            device.buffer_data(
                BufferTarget::Vertex,
                bytemuck::cast_slice(&self.data),
                BufferTarget::Vertex.usage(),
            );
            self.needs_update = false;
        }

        let stride = self.stride();
        let mut offset = 0u32;
        for attr in &self.attributes {
            match device.attrib_location(&attr.name) {
                Some(location) => device.vertex_attrib_pointer(location, attr.format(), stride, offset),
                None => log::debug!("VertexBuffer: program has no attribute '{}'", attr.name),
            }
            offset += attr.components * std::mem::size_of::<f32>() as u32;
        }
    }

    /// Releases the device buffer, if any. The CPU data is kept.
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        if let BufferResidency::Resident { buffer } = self.residency {
            log::debug!("VertexBuffer {}: deleting device buffer {buffer:?}", self.uuid);
            device.delete_buffer(buffer);
            self.residency = BufferResidency::Uninitialized;
            self.needs_update = true;
        }
    }
}
