//! Clip-space clipping against the homogeneous view volume.
//!
//! Clipping occurs after projection (in homogeneous clip space), before the
//! perspective divide. The projection maps depth to `[0, 1]`, so the clip
//! volume is:
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//!  0 <= z <= w
//! ```
//!
//! The planes are fixed and never need rebuilding when the projection
//! parameters change. Keeping `z >= 0` also keeps `w >= near > 0`, so the
//! divide that follows is always well defined.

use serde::{Deserialize, Serialize};

use crate::vertex::Vertex;

/// The six planes of the clip volume.
///
/// Each plane is defined implicitly by a linear inequality on (x, y, z, w).
/// The signed distance is positive when inside the clip volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipPlane {
    /// z >= 0
    Near,
    /// z <= w
    Far,
    /// x >= -w
    Left,
    /// x <= w
    Right,
    /// y >= -w
    Bottom,
    /// y <= w
    Top,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Near,
        ClipPlane::Far,
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
    ];

    /// Returns the signed distance from a vertex to this plane.
    /// Positive = inside the clip volume, Negative = outside.
    #[inline]
    pub fn signed_distance(&self, v: &Vertex) -> f32 {
        let p = v.position;
        match self {
            Self::Near => p.z,
            Self::Far => p.w - p.z,
            Self::Left => p.w + p.x,
            Self::Right => p.w - p.x,
            Self::Bottom => p.w + p.y,
            Self::Top => p.w - p.y,
        }
    }
}

/// Which planes the clipper tests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipMode {
    /// Only the near plane. Geometry outside the sides or beyond the far
    /// plane is left to the surface bounds check.
    #[default]
    Near,
    /// All six planes.
    Frustum,
}

impl ClipMode {
    pub fn planes(self) -> &'static [ClipPlane] {
        match self {
            ClipMode::Near => &ClipPlane::ALL[..1],
            ClipMode::Frustum => &ClipPlane::ALL,
        }
    }
}

/// A convex polygon in clip space, the intermediate form while clipping.
///
/// After clipping against all planes it is fan-triangulated back into
/// triangles for rasterization.
#[derive(Debug, Clone)]
pub struct ClipSpacePolygon {
    pub vertices: Vec<Vertex>,
}

impl ClipSpacePolygon {
    pub fn from_triangle(triangle: [Vertex; 3]) -> Self {
        Self {
            vertices: triangle.to_vec(),
        }
    }

    /// Returns true if the polygon has been completely clipped away.
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Clip this polygon against a single plane (Sutherland-Hodgman).
    pub fn clip_against_plane(&self, plane: ClipPlane) -> Self {
        if self.is_empty() {
            return Self { vertices: vec![] };
        }

        let mut output = Vec::with_capacity(self.vertices.len() + 1);

        for (i, current) in self.vertices.iter().enumerate() {
            let next = &self.vertices[(i + 1) % self.vertices.len()];

            let d1 = plane.signed_distance(current);
            let d2 = plane.signed_distance(next);

            let current_inside = d1 >= 0.0;
            let next_inside = d2 >= 0.0;

            if current_inside {
                output.push(*current);
                if !next_inside {
                    output.push(current.lerp(next, d1 / (d1 - d2)));
                }
            } else if next_inside {
                output.push(current.lerp(next, d1 / (d1 - d2)));
            }
        }

        Self { vertices: output }
    }

    /// Fan triangulation; the polygon is convex after clipping.
    pub fn triangulate(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        (1..self.vertices.len().saturating_sub(1))
            .map(move |i| [self.vertices[0], self.vertices[i], self.vertices[i + 1]])
    }
}

/// Clips triangles against the planes selected by a [`ClipMode`].
#[derive(Debug, Clone, Copy)]
pub struct ClipSpaceClipper {
    mode: ClipMode,
}

impl ClipSpaceClipper {
    pub fn new(mode: ClipMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ClipMode {
        self.mode
    }

    /// Clips one triangle, appending the surviving pieces to `out`.
    ///
    /// Appends nothing when the triangle lies entirely outside, the triangle
    /// itself when it lies entirely inside, and a fan of one or more
    /// triangles otherwise.
    pub fn clip_triangle(&self, triangle: [Vertex; 3], out: &mut Vec<[Vertex; 3]>) {
        let planes = self.mode.planes();

        let mut crossing = false;
        for plane in planes {
            let inside = triangle
                .iter()
                .filter(|v| plane.signed_distance(v) >= 0.0)
                .count();
            match inside {
                0 => return,
                3 => {}
                _ => crossing = true,
            }
        }
        if !crossing {
            out.push(triangle);
            return;
        }

        let mut polygon = ClipSpacePolygon::from_triangle(triangle);
        for &plane in planes {
            if polygon.is_empty() {
                return;
            }
            polygon = polygon.clip_against_plane(plane);
        }
        out.extend(polygon.triangulate());
    }
}

impl Default for ClipSpaceClipper {
    fn default() -> Self {
        Self::new(ClipMode::default())
    }
}
