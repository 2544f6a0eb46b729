//! Drawable graphics
//!
//! A [`Graphic`] pairs a shared geometry with an ordered list of material
//! bindings, caches the per-frame model / model-view / model-view-projection
//! matrices, issues draw calls and answers raycasts. The kind-specific parts
//! live in the submodules:
//!
//! - `mesh`: triangle raycasting and mesh uniforms
//! - `lines`: segment raycasting for `Lines` / `LineStrip`
//! - `points`: point raycasting
//! - `sprite`: billboarding and camera-space raycasting
//! - `rigged`: bone matrix upload and skinning defines

mod lines;
mod mesh;
mod points;
mod rigged;
mod sprite;

pub use rigged::{BONES_UNIFORM, BONE_INFLUENCERS};
pub use sprite::billboard;

use std::fmt;
use std::rc::Rc;

use glam::Mat4;
use slotmap::SlotMap;
use uuid::Uuid;
use wgpu::PrimitiveTopology;

use crate::errors::{PrismError, Result};
use crate::math::{BoundingBox, BoundingSphere};
use crate::raycaster::{Intersection, Raycaster};
use crate::renderer::device::GraphicsDevice;
use crate::resources::geometry_kind::GeometryHandle;
use crate::resources::material::Material;
use crate::resources::shader_defines::ShaderDefines;
use crate::scene::camera::Camera;
use crate::scene::skeleton::Skeleton;
use crate::scene::transform::Transform;
use crate::scene::{Node, NodeHandle};

/// Shared material reference.
pub type MaterialRef = Rc<dyn Material>;

/// A material applied to a range of the geometry's draw stream.
///
/// `count == 0` applies the material to the whole geometry.
#[derive(Clone)]
pub struct GraphicMaterial {
    pub material: MaterialRef,
    pub start: usize,
    pub count: usize,
}

impl GraphicMaterial {
    /// Whether element `vpos` of the draw stream falls in this binding.
    #[must_use]
    pub fn contains(&self, vpos: usize) -> bool {
        self.count == 0
            || (self.start <= vpos && self.start.checked_add(self.count).is_none_or(|end| vpos < end))
    }

    /// Element range drawn by this binding out of `available` elements.
    fn draw_range(&self, available: usize) -> Result<(usize, usize)> {
        let count = if self.count == 0 { available } else { self.count };
        match self.start.checked_add(count) {
            Some(end) if end <= available => Ok((self.start, count)),
            end => Err(PrismError::DrawRangeOutOfBounds {
                start: self.start,
                end: end.unwrap_or(usize::MAX),
                available,
            }),
        }
    }
}

impl fmt::Debug for GraphicMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicMaterial")
            .field("start", &self.start)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// What a graphic draws and how it is hit by rays.
#[derive(Debug, Clone)]
pub enum GraphicKind {
    Mesh,
    /// Independent segments (vertex pairs).
    Lines,
    /// Connected segments.
    LineStrip,
    Points,
    /// Camera-facing quad.
    Sprite,
    /// Mesh skinned by a skeleton.
    RiggedMesh(Skeleton),
}

impl GraphicKind {
    #[must_use]
    pub fn topology(&self) -> PrimitiveTopology {
        match self {
            Self::Mesh | Self::Sprite | Self::RiggedMesh(_) => PrimitiveTopology::TriangleList,
            Self::Lines => PrimitiveTopology::LineList,
            Self::LineStrip => PrimitiveTopology::LineStrip,
            Self::Points => PrimitiveTopology::PointList,
        }
    }
}

/// Camera matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInfo {
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
}

impl Default for RenderInfo {
    fn default() -> Self {
        Self {
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        }
    }
}

impl RenderInfo {
    #[must_use]
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_matrix: *camera.view_matrix(),
            projection_matrix: *camera.projection_matrix(),
        }
    }
}

/// A drawable component attached to a scene node.
#[derive(Debug)]
pub struct Graphic {
    pub uuid: Uuid,
    pub name: String,

    geometry: GeometryHandle,
    materials: Vec<GraphicMaterial>,
    kind: GraphicKind,
    topology: PrimitiveTopology,

    /// Draw order key; lower values draw first.
    pub render_order: i32,
    pub renderable: bool,
    pub cullable: bool,

    model_matrix: Mat4,
    model_view_matrix: Mat4,
    mvp_matrix: Mat4,
}

/// Clones share the geometry (one more owner) and copy the material
/// bindings. Per-frame matrices start fresh.
impl Clone for Graphic {
    fn clone(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: self.name.clone(),
            geometry: self.geometry.share(),
            materials: self.materials.clone(),
            kind: self.kind.clone(),
            topology: self.topology,
            render_order: self.render_order,
            renderable: self.renderable,
            cullable: self.cullable,
            model_matrix: Mat4::IDENTITY,
            model_view_matrix: Mat4::IDENTITY,
            mvp_matrix: Mat4::IDENTITY,
        }
    }
}

impl Graphic {
    /// Creates a graphic of `kind`. When `material` is given it applies to
    /// the whole geometry.
    pub fn new(geometry: impl Into<GeometryHandle>, kind: GraphicKind, material: Option<MaterialRef>) -> Self {
        let mut graphic = Self {
            uuid: Uuid::new_v4(),
            name: String::new(),
            geometry: geometry.into(),
            materials: Vec::new(),
            topology: kind.topology(),
            kind,
            render_order: 0,
            renderable: true,
            cullable: true,
            model_matrix: Mat4::IDENTITY,
            model_view_matrix: Mat4::IDENTITY,
            mvp_matrix: Mat4::IDENTITY,
        };
        if let Some(material) = material {
            graphic.add_material(material, 0, 0);
        }
        graphic
    }

    pub fn mesh(geometry: impl Into<GeometryHandle>, material: Option<MaterialRef>) -> Self {
        Self::new(geometry, GraphicKind::Mesh, material)
    }

    pub fn lines(geometry: impl Into<GeometryHandle>, material: Option<MaterialRef>) -> Self {
        Self::new(geometry, GraphicKind::Lines, material)
    }

    pub fn line_strip(geometry: impl Into<GeometryHandle>, material: Option<MaterialRef>) -> Self {
        Self::new(geometry, GraphicKind::LineStrip, material)
    }

    pub fn points(geometry: impl Into<GeometryHandle>, material: Option<MaterialRef>) -> Self {
        Self::new(geometry, GraphicKind::Points, material)
    }

    /// A `width` x `height` quad centered on the node, always facing the camera.
    #[must_use]
    pub fn sprite(width: f32, height: f32, material: Option<MaterialRef>) -> Self {
        Self::new(sprite::quad_geometry(width, height), GraphicKind::Sprite, material)
    }

    /// Turns a mesh into a skinned mesh driven by `skeleton`, keeping its
    /// geometry and material bindings.
    #[must_use]
    pub fn rigged_mesh(mesh: Graphic, skeleton: Skeleton) -> Self {
        let mut rigged = mesh;
        rigged.kind = GraphicKind::RiggedMesh(skeleton);
        rigged.topology = rigged.kind.topology();
        rigged
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn geometry(&self) -> &GeometryHandle {
        &self.geometry
    }

    #[must_use]
    pub fn kind(&self) -> &GraphicKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut GraphicKind {
        &mut self.kind
    }

    #[must_use]
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<&Skeleton> {
        match &self.kind {
            GraphicKind::RiggedMesh(skeleton) => Some(skeleton),
            _ => None,
        }
    }

    #[must_use]
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    #[must_use]
    pub fn model_view_matrix(&self) -> &Mat4 {
        &self.model_view_matrix
    }

    #[must_use]
    pub fn mvp_matrix(&self) -> &Mat4 {
        &self.mvp_matrix
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Binds `material` to `[start, start + count)`; `count == 0` means the
    /// whole geometry.
    pub fn add_material(&mut self, material: MaterialRef, start: usize, count: usize) {
        self.materials.push(GraphicMaterial { material, start, count });
    }

    /// Binds `material` to the range of geometry group `group_index`.
    pub fn add_group_material(&mut self, material: MaterialRef, group_index: usize) -> Result<()> {
        let group = {
            let geometry = self.geometry.borrow();
            let base = geometry.base();
            base.group_at(group_index)
                .copied()
                .ok_or(PrismError::InvalidGroupIndex {
                    index: group_index,
                    count: base.group_count(),
                })?
        };
        self.add_material(material, group.start, group.count);
        Ok(())
    }

    /// First binding whose range contains `vpos` (first match wins).
    #[must_use]
    pub fn material_at(&self, vpos: usize) -> Option<&MaterialRef> {
        self.materials
            .iter()
            .find(|binding| binding.contains(vpos))
            .map(|binding| &binding.material)
    }

    #[must_use]
    pub fn materials(&self) -> &[GraphicMaterial] {
        &self.materials
    }

    pub fn clear_materials(&mut self) {
        self.materials.clear();
    }

    // ========================================================================
    // Per-frame pipeline
    // ========================================================================

    /// Caches model, model-view and model-view-projection matrices for this
    /// frame. Must run once per frame before [`Graphic::render`].
    pub fn calculate_matrices(
        &mut self,
        transform: &Transform,
        info: &RenderInfo,
        nodes: &SlotMap<NodeHandle, Node>,
    ) {
        self.model_matrix = transform.world_matrix_as_mat4();
        self.model_view_matrix = info.view_matrix * self.model_matrix;
        if matches!(self.kind, GraphicKind::Sprite) {
            self.model_view_matrix = billboard(&self.model_view_matrix, transform);
        }
        self.mvp_matrix = info.projection_matrix * self.model_view_matrix;

        if let GraphicKind::RiggedMesh(skeleton) = &mut self.kind {
            skeleton.bone_matrices(nodes, &self.model_matrix.inverse());
        }
    }

    /// Draws every material binding: material setup, geometry setup,
    /// matrix uniforms, then the draw call.
    ///
    /// Every binding range is checked before anything reaches the device, so
    /// an out-of-bounds binding leaves the device untouched.
    pub fn render(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let (available, indexed) = {
            let geometry = self.geometry.borrow();
            (geometry.base().element_count(), geometry.base().is_indexed())
        };
        let ranges = self
            .materials
            .iter()
            .map(|binding| binding.draw_range(available))
            .collect::<Result<Vec<_>>>()?;

        for (binding, (start, count)) in self.materials.iter().zip(ranges) {
            binding.material.render_setup(device);
            self.geometry.borrow_mut().render_setup(device);
            self.transfer_uniforms(device);

            if indexed {
                device.draw_elements(self.topology, count as u32, start as u32);
            } else {
                device.draw_arrays(self.topology, start as u32, count as u32);
            }
        }
        Ok(())
    }

    fn transfer_uniforms(&self, device: &mut dyn GraphicsDevice) {
        match &self.kind {
            GraphicKind::Mesh => mesh::transfer_uniforms(self, device),
            GraphicKind::RiggedMesh(skeleton) => {
                rigged::transfer_bones(skeleton, device);
                mesh::transfer_uniforms(self, device);
            }
            GraphicKind::Lines | GraphicKind::LineStrip => lines::transfer_uniforms(self, device),
            GraphicKind::Points => points::transfer_uniforms(self, device),
            GraphicKind::Sprite => sprite::transfer_uniforms(self, device),
        }
    }

    /// Geometry defines plus skinning defines for rigged meshes.
    #[must_use]
    pub fn shader_defines(&self) -> ShaderDefines {
        let mut defines = self.geometry.borrow().shader_defines();
        if let GraphicKind::RiggedMesh(skeleton) = &self.kind {
            defines.merge(&rigged::shader_defines(skeleton));
        }
        defines
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    /// Appends every intersection of `raycaster` with this graphic to `hits`,
    /// unsorted. `transform` is the owning node's transform.
    pub fn raycast(
        &self,
        transform: &Transform,
        raycaster: &Raycaster,
        hits: &mut Vec<Intersection>,
    ) -> Result<()> {
        match &self.kind {
            GraphicKind::Mesh | GraphicKind::RiggedMesh(_) => mesh::raycast(self, transform, raycaster, hits),
            GraphicKind::Lines => lines::raycast(self, transform, raycaster, 2, hits),
            GraphicKind::LineStrip => lines::raycast(self, transform, raycaster, 1, hits),
            GraphicKind::Points => points::raycast(self, transform, raycaster, hits),
            GraphicKind::Sprite => sprite::raycast(self, transform, raycaster, hits),
        }
    }

    #[must_use]
    pub fn world_bounding_box(&self, transform: &Transform) -> BoundingBox {
        self.geometry
            .borrow()
            .base()
            .bounding_box()
            .transform(transform.world_matrix())
    }

    pub fn world_bounding_sphere(&self, transform: &Transform) -> Result<BoundingSphere> {
        let sphere = self.geometry.borrow().base().bounding_sphere()?;
        Ok(sphere.transform(&transform.world_matrix_as_mat4()))
    }

    /// Releases this graphic's ownership of its geometry. Returns `true`
    /// when that released the device resources.
    pub fn dispose(&self, device: &mut dyn GraphicsDevice) -> bool {
        self.geometry.dispose(device)
    }
}

/// World-space sphere test followed by the model-space ray shared by the
/// mesh, line and point raycasts. `None` when the bounding sphere is missed.
fn model_space_ray(
    graphic: &Graphic,
    transform: &Transform,
    raycaster: &Raycaster,
) -> Result<Option<(Mat4, crate::math::Ray)>> {
    let world = transform.world_matrix_as_mat4();
    let sphere = graphic.geometry.borrow().base().bounding_sphere()?.transform(&world);
    if !raycaster.ray.intersects_sphere(&sphere) {
        return Ok(None);
    }
    Ok(Some((world, raycaster.ray.transformed(&world.inverse()))))
}
