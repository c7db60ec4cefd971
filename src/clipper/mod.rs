//! Polygon clipping against the view volume.
//!
//! Triangles are clipped in homogeneous clip space (after projection, before
//! the perspective divide) with the Sutherland-Hodgman algorithm. The near
//! plane is always clipped; the remaining five planes are opt-in through
//! [`ClipMode::Frustum`].

pub mod clip_space;

pub use clip_space::{ClipMode, ClipPlane, ClipSpaceClipper, ClipSpacePolygon};
