use std::cell::Cell;

use glam::{Mat3, Mat4, Vec3};
use uuid::Uuid;

use crate::errors::{PrismError, Result};
use crate::math::normal_matrix;
use crate::math::{BoundingBox, BoundingSphere};
use crate::renderer::device::{BufferId, BufferTarget, GraphicsDevice, VertexArrayId};
use crate::resources::buffer::{AttribKind, VertexBuffer};
use crate::resources::shader_defines::ShaderDefines;

/// A contiguous run of indices (or vertices, for non-indexed geometry)
/// drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub start: usize,
    pub count: usize,
    pub material_index: usize,
}

/// Device residency of a geometry's vertex array and index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryResidency {
    #[default]
    Uninitialized,
    Resident {
        vao: VertexArrayId,
        index_buffer: BufferId,
    },
}

/// A triangle produced by [`Geometry::faces`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Position of the face's first element in the draw stream: an index
    /// buffer position for indexed geometry, a vertex position otherwise.
    pub first: usize,
    /// Vertex indices of the three corners.
    pub vertices: [usize; 3],
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

/// A line segment produced by [`Geometry::segments`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub first: usize,
    pub a: Vec3,
    pub b: Vec3,
}

/// Strided view over the `Vec3` attribute of one vertex buffer.
#[derive(Debug, Clone, Copy)]
struct Vec3View<'a> {
    data: &'a [f32],
    step: usize,
    offset: usize,
}

impl Vec3View<'_> {
    fn get(&self, index: usize) -> Option<Vec3> {
        let start = index * self.step + self.offset;
        self.data.get(start..start + 3).map(Vec3::from_slice)
    }

    fn len(&self) -> usize {
        self.data.len() / self.step
    }
}

/// Geometry: vertex buffers, indices and material groups plus lazily
/// computed derived properties.
///
/// Device resources are shared between all owners; see [`Geometry::incref`]
/// and [`Geometry::dispose`].
#[derive(Debug)]
pub struct Geometry {
    pub uuid: Uuid,

    vbos: Vec<VertexBuffer>,
    indices: Vec<u32>,
    indices_dirty: bool,
    groups: Vec<Group>,

    bounding_box: Cell<Option<BoundingBox>>,
    bounding_sphere: Cell<Option<BoundingSphere>>,
    area: Cell<Option<f32>>,
    volume: Cell<Option<f32>>,
    /// Inertia tensor for unit mass.
    inertia: Cell<Option<Mat3>>,

    ref_count: usize,
    residency: GeometryResidency,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning copies all CPU-side data. The clone starts with one owner and no
/// device resources.
impl Clone for Geometry {
    fn clone(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            vbos: self.vbos.clone(),
            indices: self.indices.clone(),
            indices_dirty: true,
            groups: self.groups.clone(),
            bounding_box: Cell::new(None),
            bounding_sphere: Cell::new(None),
            area: Cell::new(None),
            volume: Cell::new(None),
            inertia: Cell::new(None),
            ref_count: 1,
            residency: GeometryResidency::Uninitialized,
        }
    }
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            vbos: Vec::new(),
            indices: Vec::new(),
            indices_dirty: false,
            groups: Vec::new(),
            bounding_box: Cell::new(None),
            bounding_sphere: Cell::new(None),
            area: Cell::new(None),
            volume: Cell::new(None),
            inertia: Cell::new(None),
            ref_count: 1,
            residency: GeometryResidency::Uninitialized,
        }
    }

    /// Builds a position-only geometry. An empty `indices` list yields
    /// non-indexed geometry.
    #[must_use]
    pub fn from_positions(positions: &[Vec3], indices: Vec<u32>) -> Self {
        let mut geometry = Self::new();
        geometry.vbos.push(VertexBuffer::from_vec3(AttribKind::Position, positions));
        geometry.set_indices(indices);
        geometry
    }

    // ========================================================================
    // Vertex buffers
    // ========================================================================

    /// Adds a vertex buffer.
    ///
    /// Fails when one of its attributes is already provided by another
    /// buffer (same name, or same kind other than `Custom`), when a position,
    /// normal or tangent attribute has fewer than three components, or when
    /// its vertex count disagrees with the buffers already owned.
    pub fn add_vertex_buffer(&mut self, vbo: VertexBuffer) -> Result<()> {
        for attr in vbo.attributes() {
            if attr.kind.is_vector() && attr.components < 3 {
                return Err(PrismError::AttributeTooNarrow {
                    name: attr.name.clone(),
                    components: attr.components,
                });
            }
            let duplicate = self.vbos.iter().flat_map(VertexBuffer::attributes).any(|existing| {
                existing.name == attr.name
                    || (attr.kind != AttribKind::Custom && existing.kind == attr.kind)
            });
            if duplicate {
                return Err(PrismError::DuplicateAttribute {
                    name: attr.name.clone(),
                });
            }
        }

        if let Some(first) = self.vbos.first() {
            let (expected, actual) = (first.vertex_count(), vbo.vertex_count());
            if expected != 0 && actual != 0 && expected != actual {
                return Err(PrismError::VertexCountMismatch { expected, actual });
            }
        }

        self.vbos.push(vbo);
        self.invalidate();
        Ok(())
    }

    #[must_use]
    pub fn vbos(&self) -> &[VertexBuffer] {
        &self.vbos
    }

    /// Transfers every vertex buffer without touching the vertex array or
    /// index buffer. Used for morph targets bound alongside a base geometry.
    pub(crate) fn transfer_buffers(&mut self, device: &mut dyn GraphicsDevice) {
        for vbo in &mut self.vbos {
            vbo.transfer(device);
        }
    }

    /// The buffer holding the attribute of `kind`.
    #[must_use]
    pub fn vbo(&self, kind: AttribKind) -> Option<&VertexBuffer> {
        self.vbos.iter().find(|vbo| vbo.attribute(kind).is_some())
    }

    /// Mutable access to a buffer; derived properties are invalidated.
    pub fn vbo_mut(&mut self, kind: AttribKind) -> Option<&mut VertexBuffer> {
        self.invalidate();
        self.vbos.iter_mut().find(|vbo| vbo.attribute(kind).is_some())
    }

    #[must_use]
    pub fn vbo_by_name(&self, name: &str) -> Option<&VertexBuffer> {
        self.vbos.iter().find(|vbo| vbo.attribute_by_name(name).is_some())
    }

    /// Renames the shader attribute of `kind`. Returns `false` when absent.
    pub fn set_attribute_name(&mut self, kind: AttribKind, name: &str) -> bool {
        self.vbos.iter_mut().any(|vbo| vbo.set_attribute_name(kind, name))
    }

    #[must_use]
    pub fn attribute_name(&self, kind: AttribKind) -> Option<&str> {
        self.vbos
            .iter()
            .find_map(|vbo| vbo.attribute(kind))
            .map(|attr| attr.name.as_str())
    }

    /// Number of vertices (of the first buffer; all buffers agree).
    #[must_use]
    pub fn items(&self) -> usize {
        self.vbos.first().map_or(0, VertexBuffer::vertex_count)
    }

    // ========================================================================
    // Indices & groups
    // ========================================================================

    /// Replaces the index buffer. An empty list makes the geometry non-indexed.
    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
        self.indices_dirty = true;
        self.invalidate();
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of elements a full draw consumes: indices when indexed,
    /// vertices otherwise.
    #[must_use]
    pub fn element_count(&self) -> usize {
        if self.is_indexed() { self.indices.len() } else { self.items() }
    }

    /// Appends a group and returns its index. Ranges are checked when drawn.
    pub fn add_group(&mut self, start: usize, count: usize, material_index: usize) -> usize {
        self.groups.push(Group {
            start,
            count,
            material_index,
        });
        self.groups.len() - 1
    }

    pub fn add_groups(&mut self, groups: impl IntoIterator<Item = Group>) {
        self.groups.extend(groups);
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn group_at(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    fn view(&self, kind: AttribKind) -> Option<Vec3View<'_>> {
        self.vbos.iter().find_map(|vbo| {
            let attr = vbo.attribute(kind)?;
            if attr.components < 3 {
                return None;
            }
            Some(Vec3View {
                data: vbo.data(),
                step: vbo.floats_per_vertex(),
                offset: vbo.attribute_offset(kind)?,
            })
        })
    }

    fn vec3s(&self, kind: AttribKind) -> impl Iterator<Item = Vec3> + '_ {
        self.view(kind)
            .into_iter()
            .flat_map(|view| (0..view.len()).filter_map(move |i| view.get(i)))
    }

    /// Vertex positions in buffer order.
    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vec3s(AttribKind::Position)
    }

    /// Vertex normals in buffer order.
    pub fn normals(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vec3s(AttribKind::Normal)
    }

    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<Vec3> {
        self.view(AttribKind::Position)?.get(index)
    }

    /// Calls `f` for each vertex position until it returns `true`.
    pub fn read_vertices(&self, mut f: impl FnMut(Vec3) -> bool) {
        for v in self.vertices() {
            if f(v) {
                break;
            }
        }
    }

    /// Calls `f` for each vertex normal until it returns `true`.
    pub fn read_vertex_normals(&self, mut f: impl FnMut(Vec3) -> bool) {
        for n in self.normals() {
            if f(n) {
                break;
            }
        }
    }

    /// Mutates vertex positions in place until `f` returns `true`.
    pub fn operate_on_vertices(&mut self, f: impl FnMut(&mut Vec3) -> bool) {
        if let Some(vbo) = self.vbo_mut(AttribKind::Position) {
            vbo.operate_on_vec3(AttribKind::Position, f);
        }
    }

    pub fn operate_on_vertex_normals(&mut self, f: impl FnMut(&mut Vec3) -> bool) {
        if let Some(vbo) = self.vbo_mut(AttribKind::Normal) {
            vbo.operate_on_vec3(AttribKind::Normal, f);
        }
    }

    /// Triangles of the geometry, walking the index buffer in triples when
    /// indexed and the vertex buffer in triples otherwise. Faces that
    /// reference missing vertices are skipped.
    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        let view = self.view(AttribKind::Position);
        let indices = self.indices.as_slice();
        let count = view.map_or(0, |v| if indices.is_empty() { v.len() } else { indices.len() });

        (0..count / 3).filter_map(move |face| {
            let view = view?;
            let first = face * 3;
            let vertices = if indices.is_empty() {
                [first, first + 1, first + 2]
            } else {
                [
                    indices[first] as usize,
                    indices[first + 1] as usize,
                    indices[first + 2] as usize,
                ]
            };
            Some(Face {
                first,
                vertices,
                a: view.get(vertices[0])?,
                b: view.get(vertices[1])?,
                c: view.get(vertices[2])?,
            })
        })
    }

    /// Calls `f(a, b, c)` for each face until it returns `true`.
    pub fn read_faces(&self, mut f: impl FnMut(Vec3, Vec3, Vec3) -> bool) {
        for face in self.faces() {
            if f(face.a, face.b, face.c) {
                break;
            }
        }
    }

    /// Line segments `(i, i + 1)` for `i = 0, step, 2 * step, ...` over the
    /// index buffer when indexed, the vertex buffer otherwise.
    /// `step == 2` walks independent segments, `step == 1` a connected strip.
    pub fn segments(&self, step: usize) -> impl Iterator<Item = Segment> + '_ {
        let view = self.view(AttribKind::Position);
        let indices = self.indices.as_slice();
        let count = view.map_or(0, |v| if indices.is_empty() { v.len() } else { indices.len() });

        (0..count.saturating_sub(1)).step_by(step.max(1)).filter_map(move |first| {
            let view = view?;
            let (ia, ib) = if indices.is_empty() {
                (first, first + 1)
            } else {
                (indices[first] as usize, indices[first + 1] as usize)
            };
            Some(Segment {
                first,
                a: view.get(ia)?,
                b: view.get(ib)?,
            })
        })
    }

    // ========================================================================
    // Derived properties
    // ========================================================================

    fn invalidate(&self) {
        self.bounding_box.set(None);
        self.bounding_sphere.set(None);
        self.area.set(None);
        self.volume.set(None);
        self.inertia.set(None);
    }

    /// Axis-aligned bounding box of the vertex positions.
    ///
    /// The scan is seeded at the origin, so the box always contains
    /// `(0, 0, 0)` even when every vertex lies on one side of it.
    pub fn bounding_box(&self) -> BoundingBox {
        if let Some(bbox) = self.bounding_box.get() {
            return bbox;
        }
        let mut bbox = BoundingBox::default();
        for v in self.vertices() {
            bbox.expand_by_point(v);
        }
        self.bounding_box.set(Some(bbox));
        bbox
    }

    /// Bounding sphere centered on the bounding box center.
    pub fn bounding_sphere(&self) -> Result<BoundingSphere> {
        if let Some(sphere) = self.bounding_sphere.get() {
            return Ok(sphere);
        }
        let center = self.bounding_box().center();
        let mut max_dist_sq = 0.0_f32;
        for v in self.vertices() {
            let dist_sq = v.distance_squared(center);
            // NaN must survive the scan instead of being skipped by `>`.
            if dist_sq.is_nan() || dist_sq > max_dist_sq {
                max_dist_sq = dist_sq;
            }
            if max_dist_sq.is_nan() {
                break;
            }
        }
        let radius = max_dist_sq.sqrt();
        if radius.is_nan() {
            return Err(PrismError::DegenerateGeometry(
                "bounding sphere radius is NaN".to_string(),
            ));
        }
        let sphere = BoundingSphere::new(center, radius);
        self.bounding_sphere.set(Some(sphere));
        Ok(sphere)
    }

    /// Surface area of the triangle faces.
    pub fn area(&self) -> f32 {
        if let Some(area) = self.area.get() {
            return area;
        }
        let area = self
            .faces()
            .map(|f| (f.a - f.c).cross(f.b - f.c).length() / 2.0)
            .sum();
        self.area.set(Some(area));
        area
    }

    /// Signed volume enclosed by the faces (divergence theorem). Only
    /// meaningful for closed, consistently wound meshes.
    pub fn volume(&self) -> f32 {
        if let Some(volume) = self.volume.get() {
            return volume;
        }
        let volume = self
            .faces()
            .map(|f| f.c.dot((f.a - f.c).cross(f.b - f.c)) / 6.0)
            .sum();
        self.volume.set(Some(volume));
        volume
    }

    /// Inertia tensor approximated from the bounding box, assuming uniform
    /// density.
    pub fn rotational_inertia(&self, mass: f32) -> Mat3 {
        let unit = match self.inertia.get() {
            Some(unit) => unit,
            None => {
                let size = self.bounding_box().size();
                let sq = size * size;
                let unit = Mat3::from_diagonal(Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) / 12.0);
                self.inertia.set(Some(unit));
                unit
            }
        };
        unit * mass
    }

    /// Smallest and largest projection of the vertices onto `axis`.
    /// Returns `(0, 0)` for geometry without positions.
    #[must_use]
    pub fn project_onto_axis(&self, axis: Vec3) -> (f32, f32) {
        let (min, max) = self
            .vertices()
            .map(|v| v.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
        if min > max { (0.0, 0.0) } else { (min, max) }
    }

    // ========================================================================
    // Transformation
    // ========================================================================

    /// Transforms positions by `matrix` and normals by its normal matrix.
    /// Zero-length normals are left unnormalized.
    pub fn apply_matrix(&mut self, matrix: &Mat4) {
        let nm = normal_matrix(matrix);
        self.operate_on_vertices(|v| {
            *v = matrix.transform_point3(*v);
            false
        });
        self.operate_on_vertex_normals(|n| {
            let t = nm * *n;
            *n = t.normalize_or(t);
            false
        });
        self.invalidate();
    }

    /// Recomputes area-weighted vertex normals from the faces. Overwrites
    /// the normal attribute, or adds one when missing.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.items()];
        for face in self.faces() {
            let face_normal = (face.b - face.a).cross(face.c - face.a);
            for i in face.vertices {
                if let Some(n) = normals.get_mut(i) {
                    *n += face_normal;
                }
            }
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }

        match self.vbo_mut(AttribKind::Normal) {
            Some(vbo) => {
                let mut i = 0;
                vbo.operate_on_vec3(AttribKind::Normal, |n| {
                    *n = normals.get(i).copied().unwrap_or(*n);
                    i += 1;
                    false
                });
            }
            None => self.vbos.push(VertexBuffer::from_vec3(AttribKind::Normal, &normals)),
        }
    }

    // ========================================================================
    // Shader & device
    // ========================================================================

    /// `HAS_<ATTRIBUTE>` for every attribute kind present.
    #[must_use]
    pub fn shader_defines(&self) -> ShaderDefines {
        let mut defines = ShaderDefines::new();
        for attr in self.vbos.iter().flat_map(VertexBuffer::attributes) {
            if let Some(name) = attr.kind.define_name() {
                defines.set(name, "1");
            }
        }
        defines
    }

    #[must_use]
    pub fn residency(&self) -> GeometryResidency {
        self.residency
    }

    /// Binds the geometry for drawing. The first call creates the vertex
    /// array and index buffer; every call uploads whatever is dirty.
    pub fn render_setup(&mut self, device: &mut dyn GraphicsDevice) {
        let (vao, index_buffer) = match self.residency {
            GeometryResidency::Resident { vao, index_buffer } => (vao, index_buffer),
            GeometryResidency::Uninitialized => {
                let vao = device.create_vertex_array();
                let index_buffer = device.create_buffer();
                log::debug!("Geometry {}: created {vao:?} and index buffer {index_buffer:?}", self.uuid);
                self.residency = GeometryResidency::Resident { vao, index_buffer };
                self.indices_dirty = true;
                (vao, index_buffer)
            }
        };

        device.bind_vertex_array(vao);
        for vbo in &mut self.vbos {
            vbo.transfer(device);
        }

        if self.is_indexed() {
            device.bind_buffer(BufferTarget::Index, index_buffer);
            if self.indices_dirty {
                log::trace!("Geometry {}: uploading {} indices", self.uuid, self.indices.len());
                device.buffer_data(
                    BufferTarget::Index,
                    bytemuck::cast_slice(&self.indices),
                    BufferTarget::Index.usage(),
                );
                self.indices_dirty = false;
            }
        }
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    /// Registers one more owner.
    pub fn incref(&mut self) {
        self.ref_count += 1;
    }

    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// Drops one owner. When the last owner is gone the device resources are
    /// released and `true` is returned. Calls past that point do nothing.
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        if self.ref_count == 0 {
            log::warn!("Geometry {}: dispose called after final release", self.uuid);
            return false;
        }
        self.ref_count -= 1;
        if self.ref_count > 0 {
            return false;
        }

        if let GeometryResidency::Resident { vao, index_buffer } = self.residency {
            log::debug!("Geometry {}: releasing {vao:?} and index buffer {index_buffer:?}", self.uuid);
            device.delete_vertex_array(vao);
            device.delete_buffer(index_buffer);
        }
        for vbo in &mut self.vbos {
            vbo.dispose(device);
        }
        self.residency = GeometryResidency::Uninitialized;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        Geometry::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y], Vec::new())
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let mut geometry = triangle();
        let err = geometry
            .add_vertex_buffer(VertexBuffer::from_vec3(AttribKind::Position, &[Vec3::ZERO; 3]))
            .unwrap_err();
        assert_eq!(err, PrismError::DuplicateAttribute { name: "VertexPosition".into() });
    }

    #[test]
    fn duplicate_custom_name_is_rejected() {
        let mut geometry = triangle();
        let custom = || VertexBuffer::new().with_named_attribute(AttribKind::Custom, "Extra", 1).with_data(vec![0.0; 3]);
        geometry.add_vertex_buffer(custom()).unwrap();
        assert!(geometry.add_vertex_buffer(custom()).is_err());
    }

    #[test]
    fn vertex_count_must_agree() {
        let mut geometry = triangle();
        let err = geometry
            .add_vertex_buffer(VertexBuffer::from_vec3(AttribKind::Normal, &[Vec3::Z; 4]))
            .unwrap_err();
        assert_eq!(err, PrismError::VertexCountMismatch { expected: 3, actual: 4 });
    }

    #[test]
    fn caches_are_invalidated_by_mutation() {
        let mut geometry = triangle();
        assert!((geometry.area() - 0.5).abs() < 1e-6);
        geometry.operate_on_vertices(|v| {
            *v *= 2.0;
            false
        });
        assert!((geometry.area() - 2.0).abs() < 1e-6);
        assert_eq!(geometry.bounding_box().max, Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn segments_step() {
        let geometry = Geometry::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z], Vec::new());
        assert_eq!(geometry.segments(2).count(), 2);
        assert_eq!(geometry.segments(1).count(), 3);
    }

    #[test]
    fn computed_normals_face_the_winding() {
        let mut geometry = triangle();
        geometry.compute_vertex_normals();
        assert!(geometry.normals().all(|n| (n - Vec3::Z).length() < 1e-6));
        assert_eq!(geometry.normals().count(), 3);
    }

    #[test]
    fn nan_vertex_makes_sphere_degenerate() {
        let geometry = Geometry::from_positions(&[Vec3::ZERO, Vec3::NAN, Vec3::Y], Vec::new());
        assert!(matches!(geometry.bounding_sphere(), Err(PrismError::DegenerateGeometry(_))));
    }
}
