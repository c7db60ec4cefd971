//! Edge-only rasterization with Bresenham lines.
//!
//! Each edge is first clipped to the viewport (Liang-Barsky, in `f64` so far
//! off-screen corners keep their precision), then walked with Bresenham's
//! integer algorithm between the rounded endpoint pixels. Depth, color and
//! uv are interpolated along the original edge. No interior fragments are
//! produced.

use super::{Fragment, Rasterizer, Viewport};
use crate::colors::lerp_packed;
use crate::vertex::Vertex;

/// Draws the three triangle edges as one-pixel lines.
#[derive(Debug, Clone, Copy)]
pub struct WireframeRasterizer {
    viewport: Viewport,
}

impl WireframeRasterizer {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Appends the pixels of the line from `from` to `to`, both endpoints
    /// included, restricted to the viewport.
    ///
    /// The error term tracks the distance between the ideal line and the
    /// current pixel; each step moves along the major axis and, once enough
    /// error has accumulated, along the minor axis too.
    fn line(&self, from: &Vertex, to: &Vertex, fragments: &mut Vec<Fragment>) {
        let (max_x, max_y) = (self.viewport.max_x(), self.viewport.max_y());
        if max_x < 0 || max_y < 0 {
            return;
        }

        let start = (from.position.x as f64, from.position.y as f64);
        let end = (to.position.x as f64, to.position.y as f64);
        if ![start.0, start.1, end.0, end.1].iter().all(|v| v.is_finite()) {
            return;
        }
        let Some((t_start, t_end)) = clip_segment(start, end, max_x as f64, max_y as f64) else {
            return;
        };

        let pixel_at = |t: f64| {
            let x = start.0 + (end.0 - start.0) * t;
            let y = start.1 + (end.1 - start.1) * t;
            ((x.round() as i32).clamp(0, max_x), (y.round() as i32).clamp(0, max_y))
        };
        let (x0, y0) = pixel_at(t_start);
        let (x1, y1) = pixel_at(t_end);

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let steps = dx.max(dy);

        let x_step = if x0 < x1 { 1 } else { -1 };
        let y_step = if y0 < y1 { 1 } else { -1 };

        let mut err = dx - dy;
        let mut x = x0;
        let mut y = y0;
        let mut step = 0;

        loop {
            let progress = if steps == 0 {
                0.0
            } else {
                step as f64 / steps as f64
            };
            let t = (t_start + (t_end - t_start) * progress) as f32;
            fragments.push(Fragment {
                x,
                y,
                depth: from.position.z + (to.position.z - from.position.z) * t,
                color: lerp_packed(from.color, to.color, t),
                uv: from.uv.lerp(to.uv, t),
            });

            if x == x1 && y == y1 {
                break;
            }
            step += 1;

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += x_step;
            }
            if e2 < dx {
                err += dx;
                y += y_step;
            }
        }
    }
}

/// Parameter range `[t_start, t_end]` of the segment `a -> b` that lies inside
/// `[0, max_x] x [0, max_y]`, or `None` when the segment misses it.
fn clip_segment(a: (f64, f64), b: (f64, f64), max_x: f64, max_y: f64) -> Option<(f64, f64)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t_start, mut t_end) = (0.0_f64, 1.0_f64);

    // Each boundary as `p * t <= q`.
    for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t_end {
                return None;
            }
            t_start = t_start.max(r);
        } else {
            if r < t_start {
                return None;
            }
            t_end = t_end.min(r);
        }
    }
    Some((t_start, t_end))
}

impl Rasterizer for WireframeRasterizer {
    fn rasterize(&self, a: &Vertex, b: &Vertex, c: &Vertex, fragments: &mut Vec<Fragment>) {
        self.line(a, b, fragments);
        self.line(b, c, fragments);
        self.line(c, a, fragments);
    }
}
