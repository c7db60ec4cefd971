//! Scanline-based triangle rasterization.
//!
//! Triangles are processed one horizontal line at a time using the classic
//! flat-top/flat-bottom decomposition:
//!
//! 1. **Sort corners** by Y (top to bottom in screen space)
//! 2. **Decompose** the triangle into a flat-bottom and/or a flat-top part
//! 3. **Walk scanlines** computing the left/right edge intersections
//!
//! # Triangle Decomposition
//!
//! ```text
//!        pa                   pa
//!        /\                   /\
//!       /  \                 /  \
//!      /    \       =>   pb /----\ pm   <- split at pb.y
//!   pb \     \              \     \
//!       \     \              \     \
//!        \_____\              \_____\
//!              pc                   pc
//!
//!   General triangle      Flat-bottom (top) + Flat-top (bottom)
//! ```
//!
//! `pm` lies on the long edge `pa-pc` at height `pb.y`; its depth, color and
//! uv are interpolated with the same parameter as its x.
//!
//! # Sampling
//!
//! Integer pixel coordinates are the sample points. A scanline `y` is
//! covered when it lies between the triangle's top and bottom, and on that
//! row every integer `x` between the two edge intersections is emitted,
//! both ends inclusive, in increasing-x order. Rows and spans are clamped
//! to the viewport before they are walked.
//!
//! # Attribute interpolation
//!
//! Attributes are interpolated along the edges using vertical progress, then
//! across the scanline using horizontal progress. This is the Gouraud
//! decomposition of barycentric interpolation into two 1D steps.

use super::{Fragment, Rasterizer, Viewport};
use crate::colors::{lerp_color, pack_color, unpack_color, Rgb};
use crate::math::Vec2;
use crate::vertex::Vertex;

/// Tolerance for treating two screen-space heights as equal.
///
/// Transform and perspective divide leave noise in the low bits, so flat
/// edges are detected with this tolerance instead of exact equality. Every
/// slope division is guarded by the same value.
pub const FLAT_EPSILON: f32 = 1e-4;

/// Scanline-based triangle rasterizer.
///
/// Corners may arrive in any order and with either winding; they are sorted
/// internally. Depth, color and uv are interpolated for every fragment.
#[derive(Debug, Clone, Copy)]
pub struct ScanlineRasterizer {
    viewport: Viewport,
}

/// A screen-space triangle corner with the attributes the walk interpolates.
#[derive(Debug, Clone, Copy)]
struct Corner {
    x: f32,
    y: f32,
    depth: f32,
    color: Rgb,
    uv: Vec2,
}

impl Corner {
    fn from_vertex(vertex: &Vertex) -> Self {
        Self {
            x: vertex.position.x,
            y: vertex.position.y,
            depth: vertex.position.z,
            color: unpack_color(vertex.color),
            uv: vertex.uv,
        }
    }

    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            depth: self.depth + (other.depth - self.depth) * t,
            color: lerp_color(self.color, other.color, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }

    #[inline]
    fn fragment(&self, x: i32, y: i32) -> Fragment {
        Fragment {
            x,
            y,
            depth: self.depth,
            color: pack_color(self.color.0, self.color.1, self.color.2, 1.0),
            uv: self.uv,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.depth.is_finite()
    }
}

impl ScanlineRasterizer {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Sorts three corners by Y (ascending). Three compare-swaps suffice.
    fn sort_corners(p0: &mut Corner, p1: &mut Corner, p2: &mut Corner) {
        if p1.y < p0.y {
            std::mem::swap(p0, p1);
        }
        if p2.y < p1.y {
            std::mem::swap(p1, p2);
        }
        if p1.y < p0.y {
            std::mem::swap(p0, p1);
        }
    }

    /// Emits one fragment per integer x in `[ceil(left.x), floor(right.x)]`
    /// that falls inside the viewport.
    #[inline]
    fn fill_span(&self, y: i32, left: &Corner, right: &Corner, fragments: &mut Vec<Fragment>) {
        let span = right.x - left.x;
        let x_start = (left.x.ceil() as i32).max(0);
        let x_end = (right.x.floor() as i32).min(self.viewport.max_x());

        for x in x_start..=x_end {
            let t = if span > FLAT_EPSILON {
                (x as f32 - left.x) / span
            } else {
                0.0
            };
            fragments.push(left.lerp(right, t).fragment(x, y));
        }
    }

    /// All three corners share a scanline: emit that single row.
    fn fill_flat_row(&self, corners: [Corner; 3], fragments: &mut Vec<Fragment>) {
        let mut left = corners[0];
        let mut right = corners[0];
        for corner in &corners[1..] {
            if corner.x < left.x {
                left = *corner;
            }
            if corner.x > right.x {
                right = *corner;
            }
        }
        let y = corners[0].y.round() as i32;
        if (0..=self.viewport.max_y()).contains(&y) {
            self.fill_span(y, &left, &right, fragments);
        }
    }

    /// Fills a flat-bottom triangle: `pa` on top, `pb` and `pc` on the bottom.
    ///
    /// ```text
    ///        pa
    ///        /\
    ///       /  \
    ///      /____\
    ///    pb      pc
    /// ```
    ///
    /// Scanlines are walked top to bottom. The edge with the smaller inverse
    /// slope is the left one for the whole triangle.
    fn fill_flat_bottom(&self, pa: Corner, pb: Corner, pc: Corner, fragments: &mut Vec<Fragment>) {
        let height_b = pb.y - pa.y;
        let height_c = pc.y - pa.y;
        if height_b <= FLAT_EPSILON || height_c <= FLAT_EPSILON {
            self.fill_flat_row([pa, pb, pc], fragments);
            return;
        }

        let inv_slope_b = (pb.x - pa.x) / height_b;
        let inv_slope_c = (pc.x - pa.x) / height_c;
        let (left, right) = if inv_slope_b <= inv_slope_c {
            (pb, pc)
        } else {
            (pc, pb)
        };
        let (left_height, right_height) = (left.y - pa.y, right.y - pa.y);

        let y_start = (pa.y.ceil() as i32).max(0);
        let y_end = (pb.y.max(pc.y).floor() as i32).min(self.viewport.max_y());

        for y in y_start..=y_end {
            let dy = y as f32 - pa.y;
            let l = pa.lerp(&left, (dy / left_height).clamp(0.0, 1.0));
            let r = pa.lerp(&right, (dy / right_height).clamp(0.0, 1.0));
            self.fill_span(y, &l, &r, fragments);
        }
    }

    /// Fills a flat-top triangle: `pa` and `pb` on top, `pc` at the bottom.
    ///
    /// ```text
    ///    pa______pb
    ///      \    /
    ///       \  /
    ///        \/
    ///        pc
    /// ```
    ///
    /// Scanlines are walked from `pc` upwards. Edge positions are measured
    /// back from `pc` (`x = pc.x - inv_slope * dy`), so the edge with the
    /// larger inverse slope is the left one.
    fn fill_flat_top(&self, pa: Corner, pb: Corner, pc: Corner, fragments: &mut Vec<Fragment>) {
        let height_a = pc.y - pa.y;
        let height_b = pc.y - pb.y;
        if height_a <= FLAT_EPSILON || height_b <= FLAT_EPSILON {
            self.fill_flat_row([pa, pb, pc], fragments);
            return;
        }

        let inv_slope_a = (pc.x - pa.x) / height_a;
        let inv_slope_b = (pc.x - pb.x) / height_b;
        let (left, right) = if inv_slope_a >= inv_slope_b {
            (pa, pb)
        } else {
            (pb, pa)
        };
        let (left_height, right_height) = (pc.y - left.y, pc.y - right.y);

        let y_start = (pc.y.floor() as i32).min(self.viewport.max_y());
        let y_end = (pa.y.min(pb.y).ceil() as i32).max(0);

        for y in (y_end..=y_start).rev() {
            let dy = pc.y - y as f32;
            let l = pc.lerp(&left, (dy / left_height).clamp(0.0, 1.0));
            let r = pc.lerp(&right, (dy / right_height).clamp(0.0, 1.0));
            self.fill_span(y, &l, &r, fragments);
        }
    }
}

impl Rasterizer for ScanlineRasterizer {
    fn rasterize(&self, a: &Vertex, b: &Vertex, c: &Vertex, fragments: &mut Vec<Fragment>) {
        let mut pa = Corner::from_vertex(a);
        let mut pb = Corner::from_vertex(b);
        let mut pc = Corner::from_vertex(c);
        if !(pa.is_finite() && pb.is_finite() && pc.is_finite()) {
            return;
        }

        Self::sort_corners(&mut pa, &mut pb, &mut pc);

        if pc.y - pa.y <= FLAT_EPSILON {
            self.fill_flat_row([pa, pb, pc], fragments);
        } else if pc.y - pb.y <= FLAT_EPSILON {
            self.fill_flat_bottom(pa, pb, pc, fragments);
        } else if pb.y - pa.y <= FLAT_EPSILON {
            self.fill_flat_top(pa, pb, pc, fragments);
        } else {
            // Point on the long edge at the middle corner's height.
            let t = (pb.y - pa.y) / (pc.y - pa.y);
            let mut pm = pa.lerp(&pc, t);
            pm.y = pb.y;

            self.fill_flat_bottom(pa, pb, pm, fragments);
            self.fill_flat_top(pb, pm, pc, fragments);
        }
    }
}
