//! Perspective projection parameters.
//!
//! The [`Projection`] struct is the single source of truth for the camera's
//! field of view, aspect ratio and near/far planes, and generates the
//! projection matrix from them.

use crate::math::Mat4;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians.
    fov_y: f32,
    /// Aspect ratio (width / height).
    aspect_ratio: f32,
    /// Near clipping plane distance.
    z_near: f32,
    /// Far clipping plane distance.
    z_far: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance (must be > 0)
    /// * `z_far` - Far clipping plane distance (must be > z_near)
    pub fn new(fov_y: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Creates a projection from degrees instead of radians.
    pub fn from_degrees(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self::new(fov_y_degrees.to_radians(), aspect_ratio, z_near, z_far)
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y.to_degrees()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.fov_y = degrees.to_radians();
    }

    pub fn set_z_near(&mut self, z_near: f32) {
        self.z_near = z_near;
    }

    pub fn set_z_far(&mut self, z_far: f32) {
        self.z_far = z_far;
    }

    /// Whether the parameters describe a usable frustum:
    /// `0 < fov < 180°`, `0 < near < far` and a positive, finite aspect ratio.
    pub fn is_valid(&self) -> bool {
        self.fov_y > 0.0
            && self.fov_y < std::f32::consts::PI
            && self.z_near > 0.0
            && self.z_near < self.z_far
            && self.aspect_ratio.is_finite()
            && self.aspect_ratio > 0.0
    }

    /// Generates the left-handed perspective projection matrix (depth in [0, 1]).
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect_ratio, self.z_near, self.z_far)
    }
}
