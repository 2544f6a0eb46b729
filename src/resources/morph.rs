use glam::Vec3;
use smallvec::SmallVec;

use crate::errors::{PrismError, Result};
use crate::renderer::device::GraphicsDevice;
use crate::resources::buffer::AttribKind;
use crate::resources::geometry::Geometry;
use crate::resources::shader_defines::ShaderDefines;

/// Maximum number of morph targets bound in a single draw.
pub const NUM_MORPH_TARGETS: usize = 8;

/// Uniform receiving the weights of the active targets.
pub const MORPH_WEIGHTS_UNIFORM: &str = "morphTargetInfluences";

/// The targets selected for one draw, ordered by slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveTargets {
    /// Indices into [`MorphGeometry::targets`].
    pub indices: SmallVec<[usize; NUM_MORPH_TARGETS]>,
    pub weights: SmallVec<[f32; NUM_MORPH_TARGETS]>,
}

impl ActiveTargets {
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A base geometry plus morph targets stored as per-vertex deltas.
#[derive(Debug)]
pub struct MorphGeometry {
    base: Geometry,
    targets: Vec<Geometry>,
    weights: Vec<f32>,
}

fn slot_names(slot: usize) -> [(AttribKind, String); 3] {
    [
        (AttribKind::Position, format!("MorphPosition{slot}")),
        (AttribKind::Normal, format!("MorphNormal{slot}")),
        (AttribKind::Tangent, format!("MorphTangent{slot}")),
    ]
}

impl MorphGeometry {
    #[must_use]
    pub fn new(base: Geometry) -> Self {
        Self {
            base,
            targets: Vec::new(),
            weights: Vec::new(),
        }
    }

    #[must_use]
    pub fn base(&self) -> &Geometry {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut Geometry {
        &mut self.base
    }

    #[must_use]
    pub fn targets(&self) -> &[Geometry] {
        &self.targets
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[must_use]
    pub fn weight(&self, index: usize) -> Option<f32> {
        self.weights.get(index).copied()
    }

    /// Adds targets given as absolute vertex data.
    ///
    /// Each target is rewritten in place to hold `target - base` for its
    /// positions, and for its normals when the base has normals.
    pub fn add_morph_targets(&mut self, targets: impl IntoIterator<Item = Geometry>) {
        let base_positions: Vec<Vec3> = self.base.vertices().collect();
        let base_normals: Vec<Vec3> = self.base.normals().collect();

        let converted = targets.into_iter().map(|mut target| {
            let mut i = 0;
            target.operate_on_vertices(|v| {
                if let Some(b) = base_positions.get(i) {
                    *v -= *b;
                }
                i += 1;
                false
            });
            if !base_normals.is_empty() {
                let mut i = 0;
                target.operate_on_vertex_normals(|n| {
                    if let Some(b) = base_normals.get(i) {
                        *n -= *b;
                    }
                    i += 1;
                    false
                });
            }
            target
        });
        let converted: Vec<Geometry> = converted.collect();
        self.add_morph_target_deltas(converted);
    }

    /// Adds targets whose buffers already hold deltas.
    pub fn add_morph_target_deltas(&mut self, targets: impl IntoIterator<Item = Geometry>) {
        for target in targets {
            self.targets.push(target);
            self.weights.push(0.0);
        }

        // With few enough targets every slot is static.
        if self.targets.len() <= NUM_MORPH_TARGETS {
            for (slot, target) in self.targets.iter_mut().enumerate() {
                for (kind, name) in slot_names(slot) {
                    target.set_attribute_name(kind, &name);
                }
            }
        }
    }

    pub fn set_weights(&mut self, weights: &[f32]) -> Result<()> {
        if weights.len() != self.targets.len() {
            return Err(PrismError::WeightCountMismatch {
                expected: self.targets.len(),
                actual: weights.len(),
            });
        }
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    /// Selects the targets to bind for the current weights.
    ///
    /// Up to [`NUM_MORPH_TARGETS`] targets are all returned in order;
    /// beyond that, the heaviest ones win (stable on ties).
    #[must_use]
    pub fn active_morph_targets(&self) -> ActiveTargets {
        let mut order: SmallVec<[usize; 16]> = (0..self.targets.len()).collect();
        if order.len() > NUM_MORPH_TARGETS {
            order.sort_by(|&a, &b| self.weights[b].total_cmp(&self.weights[a]));
            order.truncate(NUM_MORPH_TARGETS);
        }
        ActiveTargets {
            weights: order.iter().map(|&i| self.weights[i]).collect(),
            indices: order.into_iter().collect(),
        }
    }

    /// Blends the targets into a new geometry on the CPU:
    /// `base + Σ weights[i] * delta[i]`, normals re-normalized.
    pub fn compute_morphed(&self, weights: &[f32]) -> Result<Geometry> {
        if weights.len() != self.targets.len() {
            return Err(PrismError::WeightCountMismatch {
                expected: self.targets.len(),
                actual: weights.len(),
            });
        }

        let mut positions: Vec<Vec3> = self.base.vertices().collect();
        let mut normals: Vec<Vec3> = self.base.normals().collect();
        for (target, &w) in self.targets.iter().zip(weights) {
            if w == 0.0 {
                continue;
            }
            for (p, d) in positions.iter_mut().zip(target.vertices()) {
                *p += d * w;
            }
            for (n, d) in normals.iter_mut().zip(target.normals()) {
                *n += d * w;
            }
        }

        let mut morphed = self.base.clone();
        let mut i = 0;
        morphed.operate_on_vertices(|v| {
            if let Some(p) = positions.get(i) {
                *v = *p;
            }
            i += 1;
            false
        });
        let mut i = 0;
        morphed.operate_on_vertex_normals(|n| {
            if let Some(m) = normals.get(i) {
                *n = m.normalize_or(*m);
            }
            i += 1;
            false
        });
        Ok(morphed)
    }

    /// Binds the base geometry, then the active targets in slots
    /// `0..NUM_MORPH_TARGETS`, and uploads their weights.
    pub fn render_setup(&mut self, device: &mut dyn GraphicsDevice) {
        self.base.render_setup(device);

        let active = self.active_morph_targets();
        for (slot, &index) in active.indices.iter().enumerate() {
            let target = &mut self.targets[index];
            for (kind, name) in slot_names(slot) {
                target.set_attribute_name(kind, &name);
            }
            target.transfer_buffers(device);
        }

        match device.uniform_location(MORPH_WEIGHTS_UNIFORM) {
            Some(location) => device.uniform_f32_array(location, &active.weights),
            None => log::warn!("MorphGeometry: program has no '{MORPH_WEIGHTS_UNIFORM}' uniform"),
        }
    }

    pub fn incref(&mut self) {
        self.base.incref();
    }

    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.base.ref_count()
    }

    /// Drops one owner; the last one releases the base and every target.
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        if !self.base.dispose(device) {
            return false;
        }
        for target in &mut self.targets {
            target.dispose(device);
        }
        true
    }

    #[must_use]
    pub fn shader_defines(&self) -> ShaderDefines {
        let mut defines = self.base.shader_defines();
        let active = self.active_morph_targets().len();
        if active > 0 {
            defines.set("MORPHTARGETS", &active.to_string());
        }
        defines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(offset: f32) -> Geometry {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y].map(|p| p + Vec3::splat(offset));
        Geometry::from_positions(&positions, Vec::new())
    }

    #[test]
    fn static_slots_are_named_on_insertion() {
        let mut morph = MorphGeometry::new(quad(0.0));
        morph.add_morph_targets([quad(1.0), quad(2.0)]);
        assert_eq!(morph.targets()[1].attribute_name(AttribKind::Position), Some("MorphPosition1"));
        assert_eq!(morph.weights(), [0.0, 0.0]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut morph = MorphGeometry::new(quad(0.0));
        morph.add_morph_target_deltas((0..10).map(|_| quad(0.0)));
        morph.set_weights(&[0.5; 10]).unwrap();
        let active = morph.active_morph_targets();
        assert_eq!(active.indices.as_slice(), [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn defines_report_active_count() {
        let mut morph = MorphGeometry::new(quad(0.0));
        assert!(!morph.shader_defines().contains("MORPHTARGETS"));
        morph.add_morph_target_deltas((0..12).map(|_| quad(0.0)));
        assert_eq!(morph.shader_defines().get("MORPHTARGETS"), Some("8"));
    }
}
