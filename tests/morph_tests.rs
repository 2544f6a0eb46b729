//! Morph target tests
//!
//! Tests for:
//! - Absolute targets converted to deltas
//! - Weight validation and CPU blending
//! - Active target selection past the slot limit
//! - Slot attribute naming and weight upload at bind time
//! - Defines and disposal

use glam::Vec3;

use prism::errors::PrismError;
use prism::renderer::{BufferTarget, DeviceCommand, RecordingDevice};
use prism::resources::{
    AttribKind, BufferResidency, Geometry, MorphGeometry, VertexBuffer, MORPH_WEIGHTS_UNIFORM,
    NUM_MORPH_TARGETS,
};

const EPSILON: f32 = 1e-5;

/// Routes `log` output through the test harness; set `RUST_LOG` to see it.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn base_positions() -> Vec<Vec3> {
    vec![Vec3::ZERO, Vec3::X, Vec3::Y]
}

fn base_geometry() -> Geometry {
    let mut base = Geometry::from_positions(&base_positions(), Vec::new());
    base.add_vertex_buffer(VertexBuffer::from_vec3(AttribKind::Normal, &[Vec3::Z; 3]))
        .unwrap();
    base
}

fn shifted_target(offset: Vec3) -> Geometry {
    let positions: Vec<Vec3> = base_positions().into_iter().map(|p| p + offset).collect();
    let mut target = Geometry::from_positions(&positions, Vec::new());
    target
        .add_vertex_buffer(VertexBuffer::from_vec3(AttribKind::Normal, &[Vec3::Z; 3]))
        .unwrap();
    target
}

fn morph_with_targets(count: usize) -> MorphGeometry {
    let mut morph = MorphGeometry::new(base_geometry());
    morph.add_morph_targets((0..count).map(|i| shifted_target(Vec3::splat(i as f32 + 1.0))));
    morph
}

/// Target index bound to each `MorphPosition{slot}` attribute, in slot order.
fn bound_position_targets(device: &RecordingDevice, morph: &MorphGeometry) -> Vec<usize> {
    let mut bound = None;
    let mut slots = Vec::new();
    for command in device.commands() {
        match command {
            DeviceCommand::BindBuffer(BufferTarget::Vertex, buffer) => bound = Some(*buffer),
            DeviceCommand::VertexAttribPointer { name, .. } if name.starts_with("MorphPosition") => {
                let slot: usize = name["MorphPosition".len()..].parse().unwrap();
                assert_eq!(slot, slots.len());
                let target = morph
                    .targets()
                    .iter()
                    .position(|t| {
                        t.vbo(AttribKind::Position).map(VertexBuffer::residency)
                            == bound.map(|buffer| BufferResidency::Resident { buffer })
                    })
                    .unwrap();
                slots.push(target);
            }
            _ => {}
        }
    }
    slots
}

#[test]
fn absolute_targets_are_stored_as_deltas() {
    let morph = morph_with_targets(1);
    let target = &morph.targets()[0];

    // base + delta reproduces the absolute target
    for (base, delta) in morph.base().vertices().zip(target.vertices()) {
        assert!(vec3_approx(delta, Vec3::ONE));
        assert!(vec3_approx(base + delta, base + Vec3::ONE));
    }
    // identical normals give zero normal deltas
    for delta in target.normals() {
        assert!(vec3_approx(delta, Vec3::ZERO));
    }
}

#[test]
fn set_weights_requires_one_weight_per_target() {
    let mut morph = morph_with_targets(3);
    assert_eq!(
        morph.set_weights(&[0.5, 0.5]),
        Err(PrismError::WeightCountMismatch { expected: 3, actual: 2 })
    );
    morph.set_weights(&[0.1, 0.2, 0.3]).unwrap();
    assert_eq!(morph.weights(), &[0.1, 0.2, 0.3]);
    assert_eq!(morph.weight(2), Some(0.3));
    assert_eq!(morph.weight(3), None);
}

#[test]
fn compute_morphed_blends_weighted_deltas() {
    let morph = morph_with_targets(2);
    // target 0 moves by (1,1,1), target 1 by (2,2,2)
    let morphed = morph.compute_morphed(&[0.5, 0.25]).unwrap();
    let expected_offset = Vec3::splat(0.5 + 0.5);
    for (base, moved) in morph.base().vertices().zip(morphed.vertices()) {
        assert!(vec3_approx(moved, base + expected_offset));
    }
    assert!(morph.compute_morphed(&[1.0]).is_err());
}

#[test]
fn all_targets_are_active_up_to_the_slot_limit() {
    let mut morph = morph_with_targets(3);
    morph.set_weights(&[0.0, 0.7, 0.2]).unwrap();
    let active = morph.active_morph_targets();
    assert_eq!(active.indices.as_slice(), &[0, 1, 2]);
    assert_eq!(active.weights.as_slice(), &[0.0, 0.7, 0.2]);
}

#[test]
fn heaviest_targets_win_past_the_slot_limit() {
    let mut morph = morph_with_targets(10);
    let weights = [0.05, 0.9, 0.1, 0.8, 0.0, 0.7, 0.3, 0.6, 0.5, 0.4];
    morph.set_weights(&weights).unwrap();

    let active = morph.active_morph_targets();
    assert_eq!(active.len(), NUM_MORPH_TARGETS);
    assert_eq!(active.indices.as_slice(), &[1, 3, 5, 7, 8, 9, 6, 2]);
    assert!(active.weights.windows(2).all(|w| w[0] >= w[1]));
    assert!(!active.indices.contains(&0));
    assert!(!active.indices.contains(&4));
}

#[test]
fn render_setup_binds_active_slots_and_uploads_weights() {
    init_logging();
    let mut device = RecordingDevice::new();
    let mut morph = morph_with_targets(2);
    morph.set_weights(&[0.25, 0.75]).unwrap();

    morph.render_setup(&mut device);

    let bound = device.bound_attributes();
    for name in ["VertexPosition", "VertexNormal", "MorphPosition0", "MorphNormal0", "MorphPosition1", "MorphNormal1"] {
        assert!(bound.contains(&name), "{name} not bound: {bound:?}");
    }
    assert_eq!(device.last_f32(MORPH_WEIGHTS_UNIFORM), Some([0.25, 0.75].as_slice()));
}

#[test]
fn render_setup_reselects_targets_every_frame() {
    init_logging();
    let mut device = RecordingDevice::new();
    let mut morph = morph_with_targets(10);

    morph.set_weights(&[0.05, 0.9, 0.1, 0.8, 0.0, 0.7, 0.3, 0.6, 0.5, 0.4]).unwrap();
    morph.render_setup(&mut device);
    assert_eq!(bound_position_targets(&device, &morph), vec![1, 3, 5, 7, 8, 9, 6, 2]);
    assert_eq!(
        device.last_f32(MORPH_WEIGHTS_UNIFORM),
        Some([0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.1].as_slice())
    );

    // Targets 1 and 3 drop out, 0 and 4 take the lead.
    device.clear_commands();
    morph.set_weights(&[0.95, 0.0, 0.1, 0.0, 0.85, 0.7, 0.3, 0.6, 0.5, 0.4]).unwrap();
    morph.render_setup(&mut device);
    assert_eq!(bound_position_targets(&device, &morph), vec![0, 4, 5, 7, 8, 9, 6, 2]);
    assert_eq!(
        device.last_f32(MORPH_WEIGHTS_UNIFORM),
        Some([0.95, 0.85, 0.7, 0.6, 0.5, 0.4, 0.3, 0.1].as_slice())
    );
}

#[test]
fn shader_defines_report_the_active_target_count() {
    let morph = morph_with_targets(10);
    let defines = morph.shader_defines();
    assert_eq!(defines.get("MORPHTARGETS"), Some("8"));
    assert!(defines.contains("HAS_POSITION"));
    assert!(!MorphGeometry::new(base_geometry()).shader_defines().contains("MORPHTARGETS"));
}

#[test]
fn dispose_releases_base_and_targets() {
    init_logging();
    let mut device = RecordingDevice::new();
    let mut morph = morph_with_targets(2);
    morph.render_setup(&mut device);
    assert!(device.live_buffers() > 0);

    morph.incref();
    assert!(!morph.dispose(&mut device));
    assert!(device.live_buffers() > 0);

    assert!(morph.dispose(&mut device));
    assert_eq!(device.live_buffers(), 0);
    assert_eq!(device.live_vertex_arrays(), 0);
    assert_eq!(device.invalid_deletes(), 0);
}
