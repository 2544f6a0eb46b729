//! Renderer Settings
//!
//! Frame-loop switches for [`Renderer`](crate::renderer::Renderer).
//!
//! ```rust,ignore
//! use prism::renderer::RendererSettings;
//!
//! // Draw everything in insertion order, no culling.
//! let settings = RendererSettings {
//!     frustum_culling: false,
//!     sort_by_render_order: false,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Skip cullable graphics whose world bounding sphere lies outside the
    /// camera frustum.
    pub frustum_culling: bool,

    /// Draw graphics in ascending `render_order`. Ties keep scene order.
    pub sort_by_render_order: bool,

    /// Color the targets are cleared to at the start of each frame.
    pub clear_color: [f32; 4],
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            sort_by_render_order: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
