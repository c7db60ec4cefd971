use crate::colors::{self, lerp_packed};
use crate::math::{Vec2, Vec4};

/// A triangle corner as it travels through the pipeline.
///
/// Stages never mutate a vertex in place; each one returns a new value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    /// Packed ARGB
    pub color: u32,
    pub uv: Vec2,
    pub normal: Vec4,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec4::point(0.0, 0.0, 0.0),
            color: colors::WHITE,
            uv: Vec2::ZERO,
            normal: Vec4::ZERO,
        }
    }
}

impl Vertex {
    pub fn new(position: Vec4, color: u32, uv: Vec2, normal: Vec4) -> Self {
        Self {
            position,
            color,
            uv,
            normal,
        }
    }

    /// A vertex with only a position; other attributes take their defaults.
    pub fn at(position: Vec4) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Linearly interpolate all attributes between two vertices.
    /// Used when a polygon edge crosses a clipping plane.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            color: lerp_packed(self.color, other.color, t),
            uv: self.uv.lerp(other.uv, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}
