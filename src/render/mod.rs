//! Pipeline stages and surfaces the camera drives each frame.

pub mod framebuffer;
pub mod rasterizer;
pub mod shader;

pub use framebuffer::{Canvas, DepthBuffer, DoubleBuffer, Present};
pub use rasterizer::{
    Fragment, Rasterizer, RenderMode, ScanlineRasterizer, Viewport, WireframeRasterizer,
    FLAT_EPSILON,
};
pub use shader::{FragmentShader, PassThrough, VertexShader};

use serde::{Deserialize, Serialize};

/// How filled triangles are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    /// Every pixel gets the camera's fill color.
    #[default]
    Flat,
    /// Vertex colors interpolated across the triangle.
    Gouraud,
}

impl std::fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShadingMode::Flat => write!(f, "Flat"),
            ShadingMode::Gouraud => write!(f, "Gouraud"),
        }
    }
}
