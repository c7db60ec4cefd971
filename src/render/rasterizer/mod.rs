//! Triangle rasterization algorithms.
//!
//! A rasterizer turns three screen-space vertices into the fragments they
//! cover inside its [`Viewport`]. The camera holds exactly one boxed
//! rasterizer and replaces it when the render mode changes, so there is no
//! per-fragment mode branching.
//!
//! Rows, spans and lines are clamped to the viewport before they are walked,
//! so the work per triangle is bounded by the screen size no matter how far
//! the projected corners land off screen.
//!
//! Available algorithms:
//! - [`ScanlineRasterizer`]: Flat-top/flat-bottom triangle decomposition (filled)
//! - [`WireframeRasterizer`]: Bresenham lines along the three edges

mod scanline;
mod wireframe;

pub use scanline::{ScanlineRasterizer, FLAT_EPSILON};
pub use wireframe::WireframeRasterizer;


use serde::{Deserialize, Serialize};

use crate::colors;
use crate::math::Vec2;
use crate::vertex::Vertex;

/// One covered pixel with attributes interpolated from the triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    pub x: i32,
    pub y: i32,
    /// NDC depth, 0 at the near plane and 1 at the far plane.
    pub depth: f32,
    pub color: u32,
    pub uv: Vec2,
}

impl Fragment {
    pub fn new(x: i32, y: i32, depth: f32) -> Self {
        Self {
            x,
            y,
            depth,
            color: colors::WHITE,
            uv: Vec2::ZERO,
        }
    }
}

/// The pixel rectangle `0..width` by `0..height` fragments are emitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rightmost pixel column; negative for an empty viewport.
    pub fn max_x(&self) -> i32 {
        self.width.min(i32::MAX as u32) as i32 - 1
    }

    /// Bottom pixel row; negative for an empty viewport.
    pub fn max_y(&self) -> i32 {
        self.height.min(i32::MAX as u32) as i32 - 1
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..=self.max_x()).contains(&x) && (0..=self.max_y()).contains(&y)
    }
}

/// Trait for triangle rasterization algorithms.
pub trait Rasterizer {
    /// Appends the fragments covered by the screen-space triangle `a, b, c`.
    ///
    /// Vertex positions are in pixels (x right, y down) with the depth in z.
    /// The vertex order does not matter. Only fragments inside the
    /// rasterizer's viewport are produced.
    fn rasterize(&self, a: &Vertex, b: &Vertex, c: &Vertex, fragments: &mut Vec<Fragment>);
}

/// Which rasterizer variant the camera draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Triangle outlines only, no depth test.
    #[default]
    Wireframe,
    /// Scanline-filled triangles with depth testing.
    Filled,
}

impl RenderMode {
    /// Builds the rasterizer instance for this mode.
    pub fn rasterizer(self, viewport: Viewport) -> Box<dyn Rasterizer> {
        match self {
            RenderMode::Wireframe => Box::new(WireframeRasterizer::new(viewport)),
            RenderMode::Filled => Box::new(ScanlineRasterizer::new(viewport)),
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Wireframe => write!(f, "Wireframe"),
            RenderMode::Filled => write!(f, "Filled"),
        }
    }
}
