use std::fmt::Debug;

use glam::Vec4;
use uuid::Uuid;

use crate::renderer::device::{CullMode, GraphicsDevice};
use crate::resources::shader_defines::ShaderDefines;

/// Which triangle faces are drawn (and hit by raycasts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

impl Side {
    /// Cull state that draws exactly this side.
    #[must_use]
    pub fn cull_mode(self) -> CullMode {
        match self {
            Side::Front => CullMode::Back,
            Side::Back => CullMode::Front,
            Side::Double => CullMode::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    None,
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
}

/// Fixed-function state a material applies before drawing.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct MaterialSettings {
    pub transparent: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub side: Side,
    pub blending: Blending,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            transparent: false,
            depth_write: true,
            depth_test: true,
            side: Side::Front,
            blending: Blending::Normal,
        }
    }
}

impl MaterialSettings {
    pub fn apply(&self, device: &mut dyn GraphicsDevice) {
        device.set_cull_mode(self.side.cull_mode());
        device.set_depth_state(self.depth_test, self.depth_write);
        device.set_blending(if self.transparent { self.blending } else { Blending::None });
    }
}

/// A material as seen by the drawing core.
///
/// Program selection, textures and uniform layout belong to the
/// implementation; the core only needs device state setup and the culled
/// side for raycasting.
pub trait Material: Debug {
    fn settings(&self) -> &MaterialSettings;

    fn side(&self) -> Side {
        self.settings().side
    }

    fn shader_defines(&self) -> ShaderDefines {
        ShaderDefines::new()
    }

    /// Applies device state and transfers material uniforms.
    fn render_setup(&self, device: &mut dyn GraphicsDevice) {
        self.settings().apply(device);
    }
}

/// Flat-colored material.
#[derive(Debug, Clone)]
pub struct BasicMaterial {
    pub uuid: Uuid,
    pub color: Vec4,
    pub settings: MaterialSettings,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}

impl BasicMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            settings: MaterialSettings::default(),
        }
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.settings.side = side;
        self
    }

    #[must_use]
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.settings.transparent = transparent;
        self
    }
}

impl Material for BasicMaterial {
    fn settings(&self) -> &MaterialSettings {
        &self.settings
    }

    fn render_setup(&self, device: &mut dyn GraphicsDevice) {
        self.settings.apply(device);
        if let Some(location) = device.uniform_location("MatColor") {
            device.uniform_vec4(location, self.color);
        }
    }
}
