//! Graphic tests
//!
//! Tests for:
//! - Material bindings: whole-geometry, explicit ranges, geometry groups
//! - Draw calls issued for indexed and non-indexed geometry
//! - Draw range validation
//! - Matrix caching and uniform upload per graphic kind
//! - Sprite billboarding
//! - Clone semantics and disposal
//! - Rigged meshes: bone matrices, bone upload, skinning defines

use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};
use slotmap::SlotMap;
use wgpu::PrimitiveTopology;

use prism::errors::PrismError;
use prism::graphic::{billboard, Graphic, GraphicKind, MaterialRef, RenderInfo, BONES_UNIFORM};
use prism::renderer::{DeviceCommand, DrawCall, RecordingDevice};
use prism::resources::primitives::create_box;
use prism::resources::{BasicMaterial, Geometry, Side};
use prism::scene::{Node, NodeHandle, Skeleton, Transform};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;

/// Routes `log` output through the test harness; set `RUST_LOG` to see it.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mat4_approx(a: &Mat4, b: &Mat4) -> bool {
    a.abs_diff_eq(*b, EPSILON)
}

fn material() -> MaterialRef {
    Rc::new(BasicMaterial::default())
}

fn updated(mut transform: Transform) -> Transform {
    transform.update_local_matrix();
    let local = *transform.local_matrix();
    transform.set_world_matrix(local);
    transform
}

fn no_nodes() -> SlotMap<NodeHandle, Node> {
    SlotMap::with_key()
}

fn line_geometry() -> Geometry {
    Geometry::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z], Vec::new())
}

// ============================================================================
// Materials & draw calls
// ============================================================================

#[test]
fn whole_geometry_material_draws_every_index() {
    let mut device = RecordingDevice::new();
    let graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(material()));

    graphic.render(&mut device).unwrap();
    assert_eq!(
        device.draw_calls(),
        vec![DrawCall {
            topology: PrimitiveTopology::TriangleList,
            indexed: true,
            start: 0,
            count: 36,
        }]
    );
}

#[test]
fn group_materials_draw_their_group_ranges() {
    let mut device = RecordingDevice::new();
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), None);
    for group in 0..6 {
        graphic.add_group_material(material(), group).unwrap();
    }

    assert_eq!(graphic.materials().len(), 6);
    let binding = &graphic.materials()[2];
    assert_eq!((binding.start, binding.count), (12, 6));

    graphic.render(&mut device).unwrap();
    let ranges: Vec<(u32, u32)> = device.draw_calls().iter().map(|d| (d.start, d.count)).collect();
    assert_eq!(ranges, vec![(0, 6), (6, 6), (12, 6), (18, 6), (24, 6), (30, 6)]);
}

#[test]
fn invalid_group_index_is_rejected() {
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), None);
    assert_eq!(
        graphic.add_group_material(material(), 6),
        Err(PrismError::InvalidGroupIndex { index: 6, count: 6 })
    );
    assert!(graphic.materials().is_empty());
}

#[test]
fn material_at_returns_the_first_matching_binding() {
    let front: MaterialRef = Rc::new(BasicMaterial::default());
    let back: MaterialRef = Rc::new(BasicMaterial::default().with_side(Side::Back));
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), None);
    graphic.add_material(Rc::clone(&front), 0, 6);
    graphic.add_material(Rc::clone(&back), 0, 0);

    assert!(Rc::ptr_eq(graphic.material_at(3).unwrap(), &front));
    assert!(Rc::ptr_eq(graphic.material_at(6).unwrap(), &back));
    assert_eq!(graphic.material_at(30).unwrap().side(), Side::Back);

    graphic.clear_materials();
    assert!(graphic.material_at(0).is_none());
}

#[test]
fn non_indexed_geometry_draws_arrays() {
    let mut device = RecordingDevice::new();
    let graphic = Graphic::lines(line_geometry(), Some(material()));

    graphic.render(&mut device).unwrap();
    assert_eq!(
        device.draw_calls(),
        vec![DrawCall {
            topology: PrimitiveTopology::LineList,
            indexed: false,
            start: 0,
            count: 4,
        }]
    );
}

#[test]
fn draw_ranges_past_the_buffer_are_rejected() {
    let mut device = RecordingDevice::new();
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), None);
    graphic.add_material(material(), 30, 12);

    assert_eq!(
        graphic.render(&mut device),
        Err(PrismError::DrawRangeOutOfBounds { start: 30, end: 42, available: 36 })
    );
    assert!(device.draw_calls().is_empty());
}

#[test]
fn a_bad_binding_leaves_the_device_untouched() {
    init_logging();
    let mut device = RecordingDevice::new();
    let triangle = Geometry::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
    let mut graphic = Graphic::mesh(triangle, Some(material()));
    graphic.add_material(material(), 3, 3);

    assert_eq!(
        graphic.render(&mut device),
        Err(PrismError::DrawRangeOutOfBounds { start: 3, end: 6, available: 3 })
    );
    assert!(device.draw_calls().is_empty());
    assert!(device.commands().is_empty());
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn overflowing_ranges_are_out_of_bounds() {
    let mut device = RecordingDevice::new();
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), None);
    graphic.add_material(material(), usize::MAX, 2);

    assert!(!graphic.materials()[0].contains(0));
    assert!(graphic.materials()[0].contains(usize::MAX));
    assert_eq!(
        graphic.render(&mut device),
        Err(PrismError::DrawRangeOutOfBounds { start: usize::MAX, end: usize::MAX, available: 36 })
    );
    assert!(device.commands().is_empty());
}

#[test]
fn topology_follows_the_graphic_kind() {
    assert_eq!(Graphic::line_strip(line_geometry(), None).topology(), PrimitiveTopology::LineStrip);
    assert_eq!(Graphic::points(line_geometry(), None).topology(), PrimitiveTopology::PointList);
    assert_eq!(Graphic::sprite(1.0, 1.0, None).topology(), PrimitiveTopology::TriangleList);
}

// ============================================================================
// Matrices & uniforms
// ============================================================================

#[test]
fn calculate_matrices_caches_model_view_projection() {
    let transform = updated(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
    let info = RenderInfo {
        view_matrix: Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
        projection_matrix: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
    };
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(material()));
    graphic.calculate_matrices(&transform, &info, &no_nodes());

    let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    assert!(mat4_approx(graphic.model_matrix(), &model));
    assert!(mat4_approx(graphic.model_view_matrix(), &(info.view_matrix * model)));
    assert!(mat4_approx(graphic.mvp_matrix(), &(info.projection_matrix * info.view_matrix * model)));
}

#[test]
fn mesh_uploads_its_matrix_uniforms() {
    let mut device = RecordingDevice::new();
    let transform = updated(Transform::from_position(Vec3::X));
    let mut graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(material()));
    graphic.calculate_matrices(&transform, &RenderInfo::default(), &no_nodes());
    graphic.render(&mut device).unwrap();

    for name in ["ModelMatrix", "ModelViewMatrix", "MVP"] {
        assert!(device.last_mat4(name).is_some(), "{name} missing");
    }
    assert!(device.commands().iter().any(|c| matches!(c, DeviceCommand::UniformMat3 { name, .. } if name == "NormalMatrix")));
}

#[test]
fn lines_upload_only_the_mvp() {
    let mut device = RecordingDevice::new();
    let graphic = Graphic::lines(line_geometry(), Some(material()));
    graphic.render(&mut device).unwrap();

    assert!(device.last_mat4("MVP").is_some());
    assert!(device.last_mat4("ModelMatrix").is_none());
}

#[test]
fn missing_uniforms_are_skipped() {
    init_logging();
    let mut device = RecordingDevice::new();
    device.hide("ModelMatrix");
    let graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(material()));

    graphic.render(&mut device).unwrap();
    assert!(device.last_mat4("ModelMatrix").is_none());
    assert_eq!(device.draw_calls().len(), 1);
}

#[test]
fn material_state_is_applied_before_drawing() {
    let mut device = RecordingDevice::new();
    let double: MaterialRef = Rc::new(BasicMaterial::default().with_side(Side::Double));
    let graphic = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(double));
    graphic.render(&mut device).unwrap();

    let cull = device.commands().iter().position(|c| matches!(c, DeviceCommand::SetCullMode(_)));
    let draw = device.commands().iter().position(|c| matches!(c, DeviceCommand::DrawElements { .. }));
    assert!(cull.unwrap() < draw.unwrap());
    assert!(device.commands().contains(&DeviceCommand::SetCullMode(prism::renderer::CullMode::None)));
}

// ============================================================================
// Sprite
// ============================================================================

#[test]
fn billboard_keeps_translation_scale_and_z_rotation() {
    let mut transform = Transform::new();
    transform.set_rotation_euler(0.0, 0.0, 0.5);
    let model_view = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::from_rotation_x(1.0) * Quat::from_rotation_y(0.7),
        Vec3::new(1.0, 2.0, -5.0),
    );

    let (scale, rotation, translation) = billboard(&model_view, &transform).to_scale_rotation_translation();
    assert!(scale.abs_diff_eq(Vec3::splat(2.0), EPSILON));
    assert!(translation.abs_diff_eq(Vec3::new(1.0, 2.0, -5.0), EPSILON));
    assert!(rotation.abs_diff_eq(Quat::from_rotation_z(0.5), EPSILON) || rotation.abs_diff_eq(-Quat::from_rotation_z(0.5), EPSILON));
}

#[test]
fn sprite_model_view_faces_the_camera() {
    let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, -5.0));
    transform.rotation = Quat::from_rotation_y(1.2);
    let transform = updated(transform);

    let mut sprite = Graphic::sprite(2.0, 1.0, Some(material()));
    sprite.calculate_matrices(&transform, &RenderInfo::default(), &no_nodes());

    // The quad normal (+Z) is unaffected by the node's Y rotation.
    let normal = sprite.model_view_matrix().transform_vector3(Vec3::Z);
    assert!(normal.abs_diff_eq(Vec3::Z, EPSILON));
}

// ============================================================================
// Clone & dispose
// ============================================================================

#[test]
fn clones_share_geometry_and_copy_bindings() {
    let mut device = RecordingDevice::new();
    let original = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(material()));
    original.render(&mut device).unwrap();

    let mut copy = original.clone();
    assert!(copy.geometry().ptr_eq(original.geometry()));
    assert_eq!(original.geometry().ref_count(), 2);
    assert_ne!(copy.uuid, original.uuid);

    copy.clear_materials();
    assert_eq!(original.materials().len(), 1);

    assert!(!copy.dispose(&mut device));
    assert_eq!(device.live_buffers(), 2);
    assert!(original.dispose(&mut device));
    assert_eq!(device.live_buffers(), 0);
    assert_eq!(device.live_vertex_arrays(), 0);
}

// ============================================================================
// Rigged mesh
// ============================================================================

#[test]
fn rigged_mesh_computes_and_uploads_bone_matrices() {
    init_logging();
    let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
    let mut bone_node = Node::new();
    bone_node.transform = updated(Transform::from_position(Vec3::new(0.0, 3.0, 0.0)));
    let bone = nodes.insert(bone_node);

    let mut skeleton = Skeleton::new("rig");
    skeleton.add_bone(bone, Some(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))));

    let mesh = Graphic::mesh(create_box(1.0, 1.0, 1.0), Some(material()));
    let mut rigged = Graphic::rigged_mesh(mesh, skeleton);
    assert!(matches!(rigged.kind(), GraphicKind::RiggedMesh(_)));

    let root = updated(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
    rigged.calculate_matrices(&root, &RenderInfo::default(), &nodes);

    // inverse(root) * bone_world * inverse_bind
    let expected = Mat4::from_translation(Vec3::new(-1.0, 2.0, 0.0));
    let matrices = rigged.skeleton().unwrap().matrices();
    assert!(mat4_approx(&matrices[0], &expected));

    let mut device = RecordingDevice::new();
    rigged.render(&mut device).unwrap();
    let uploaded = device.last_mat4(BONES_UNIFORM).unwrap();
    assert_eq!(uploaded.len(), 1);
    assert!(mat4_approx(&uploaded[0], &expected));

    let defines = rigged.shader_defines();
    assert_eq!(defines.get("TOTAL_BONES"), Some("1"));
    assert_eq!(defines.get("BONE_INFLUENCERS"), Some("4"));
}

#[test]
fn missing_bone_nodes_keep_their_previous_matrix() {
    init_logging();
    let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
    let bone = nodes.insert(Node::new());
    let mut skeleton = Skeleton::new("rig");
    skeleton.add_bone(bone, None);

    nodes.remove(bone);
    let matrices = skeleton.bone_matrices(&nodes, &Mat4::from_translation(Vec3::X));
    assert_eq!(matrices, &[Mat4::IDENTITY]);
}
