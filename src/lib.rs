//! A CPU-based software rasterization pipeline.
//!
//! Meshes go through transform, backface culling, clipping, perspective
//! divide, screen mapping, scanline or wireframe rasterization and depth
//! testing, all on the CPU. SDL2 (behind the `window` feature) is used only to
//! put finished frames on screen.
//!
//! # Quick Start
//!
//! ```ignore
//! use scanraster::prelude::*;
//!
//! let mut camera = Camera::new(800, 600);
//! camera.set_render_mode(RenderMode::Filled);
//!
//! let mut cube = Mesh::cube();
//! cube.set_model_to_world(Mat4::translation(0.0, 0.0, 5.0));
//!
//! camera.draw_frame([&cube])?;
//! camera.presented().save_png("cube.png")?;
//! ```

// Public API - exposed to library consumers
pub mod camera;
pub mod clipper;
pub mod colors;
pub mod config;
pub mod error;
pub mod math;
pub mod mesh;
pub mod projection;
pub mod render;
pub mod transform;
pub mod triangle;
pub mod vertex;
#[cfg(feature = "window")]
pub mod window;

// Re-export commonly needed types at crate root for convenience
pub use camera::{Camera, FrameStats};
pub use config::{ConfigError, RenderConfig};
pub use error::RenderError;
pub use mesh::{IndexError, LoadError, Mesh};
pub use projection::Projection;
pub use render::{RenderMode, ShadingMode};
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use scanraster::prelude::*;
/// ```
pub mod prelude {
    // Camera & configuration
    pub use crate::camera::{Camera, FrameStats};
    pub use crate::clipper::ClipMode;
    pub use crate::config::{CameraConfig, RenderConfig};
    pub use crate::error::RenderError;

    // Scene
    pub use crate::mesh::Mesh;
    pub use crate::transform::Transform;
    pub use crate::triangle::{Index, Triangle};
    pub use crate::vertex::Vertex;

    // Math
    pub use crate::math::{Mat4, Vec2, Vec3, Vec4};

    // Rendering
    pub use crate::render::{
        Canvas, Fragment, FragmentShader, Present, RenderMode, ShadingMode, Viewport,
    };

    // Window & Input
    #[cfg(feature = "window")]
    pub use crate::window::{FrameLimiter, Window, WindowEvent};
}

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::render::{
        Fragment, Rasterizer, ScanlineRasterizer, Viewport, WireframeRasterizer,
    };
    pub use crate::vertex::Vertex;
}
