//! Rendering
//!
//! - [`device`]: the [`GraphicsDevice`] boundary every draw goes through
//! - [`recorder`]: a headless device that records the calls it receives
//! - [`settings`]: frame-loop configuration
//!
//! [`Renderer::render`] runs one frame: world matrices, visibility, culling,
//! ordering, then per-graphic matrix caching and drawing.

pub mod device;
pub mod recorder;
pub mod settings;

pub use device::{BufferId, BufferTarget, CullMode, GraphicsDevice, UniformLocation, VertexArrayId};
pub use recorder::{DeviceCommand, DrawCall, RecordingDevice};
pub use settings::RendererSettings;

use crate::errors::Result;
use crate::graphic::RenderInfo;
use crate::scene::camera::Camera;
use crate::scene::scene::Scene;
use crate::scene::{GraphicKey, NodeHandle};

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Graphics drawn.
    pub drawn: usize,
    /// Graphics rejected by frustum culling.
    pub culled: usize,
    /// Draw calls issued (one per material binding).
    pub draw_calls: usize,
}

#[derive(Debug, Default)]
pub struct Renderer {
    pub settings: RendererSettings,
    last_stats: RenderStats,
}

impl Renderer {
    #[must_use]
    pub fn new(settings: RendererSettings) -> Self {
        Self {
            settings,
            last_stats: RenderStats::default(),
        }
    }

    /// Counters of the most recent frame.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Draws `scene` as seen from `camera`.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        device: &mut dyn GraphicsDevice,
    ) -> Result<RenderStats> {
        let mut stats = RenderStats::default();
        scene.update_world_matrices();
        device.clear(self.settings.clear_color);

        let mut queue: Vec<(NodeHandle, GraphicKey, i32)> = Vec::new();
        for (handle, key) in scene.visible_graphics() {
            let graphic = &scene.graphics[key];
            if !graphic.renderable {
                continue;
            }
            if self.settings.frustum_culling && graphic.cullable {
                let sphere = graphic.world_bounding_sphere(&scene.nodes[handle].transform)?;
                if !camera.frustum().intersects_sphere(&sphere) {
                    stats.culled += 1;
                    continue;
                }
            }
            queue.push((handle, key, graphic.render_order));
        }

        if self.settings.sort_by_render_order {
            queue.sort_by_key(|&(_, _, order)| order);
        }

        let info = RenderInfo::from_camera(camera);
        for (handle, key, _) in queue {
            let graphic = &mut scene.graphics[key];
            graphic.calculate_matrices(&scene.nodes[handle].transform, &info, &scene.nodes);
            graphic.render(device)?;
            stats.drawn += 1;
            stats.draw_calls += graphic.materials().len();
        }

        log::trace!(
            "frame: {} drawn, {} culled, {} draw calls",
            stats.drawn,
            stats.culled,
            stats.draw_calls
        );
        self.last_stats = stats;
        Ok(stats)
    }
}
