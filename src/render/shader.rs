//! Programmable stages around the fixed-function rasterizer.
//!
//! - [`VertexShader`]: transforms model-space vertices into clip space.
//! - [`FragmentShader`]: adjusts each fragment before it is written.

use super::rasterizer::Fragment;
use crate::math::Mat4;
use crate::vertex::Vertex;

/// Applies a combined transform to a vertex's position and normal.
///
/// The normal matrix is the inverse of the transposed transform, computed
/// once when the shader is built.
#[derive(Debug, Clone, Copy)]
pub struct VertexShader {
    matrix: Mat4,
    normal_matrix: Mat4,
}

impl VertexShader {
    pub fn new(matrix: Mat4) -> Self {
        let normal_matrix = matrix.transpose().inverse().unwrap_or_else(|| {
            log::warn!("singular transform, normals passed through untransformed");
            Mat4::IDENTITY
        });
        Self {
            matrix,
            normal_matrix,
        }
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Returns the transformed vertex; color and uv pass through.
    #[inline]
    pub fn shade(&self, vertex: &Vertex) -> Vertex {
        Vertex {
            position: vertex.position * self.matrix,
            color: vertex.color,
            uv: vertex.uv,
            normal: vertex.normal * self.normal_matrix,
        }
    }
}

/// Per-fragment hook run between rasterization and the framebuffer write.
pub trait FragmentShader {
    fn shade(&self, fragment: Fragment) -> Fragment;
}

/// The identity fragment shader.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl FragmentShader for PassThrough {
    #[inline]
    fn shade(&self, fragment: Fragment) -> Fragment {
        fragment
    }
}

impl<F> FragmentShader for F
where
    F: Fn(Fragment) -> Fragment,
{
    #[inline]
    fn shade(&self, fragment: Fragment) -> Fragment {
        self(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec2, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn position_uses_row_vector_product() {
        let shader = VertexShader::new(Mat4::translation(1.0, 2.0, 3.0));
        let v = Vertex::new(
            Vec4::point(1.0, 1.0, 1.0),
            0xFF123456,
            Vec2::new(0.25, 0.75),
            Vec4::direction(0.0, 1.0, 0.0),
        );
        let out = shader.shade(&v);
        assert_eq!(out.position, Vec4::point(2.0, 3.0, 4.0));
        assert_eq!(out.color, v.color);
        assert_eq!(out.uv, v.uv);
        // Translation does not affect normals.
        assert_eq!(out.normal, Vec4::direction(0.0, 1.0, 0.0));
    }

    #[test]
    fn normals_use_inverse_transpose() {
        // Non-uniform scale: the normal of the plane x = y must stay perpendicular.
        let m = Mat4::scaling(2.0, 1.0, 1.0);
        let shader = VertexShader::new(m);
        let normal = Vertex {
            normal: Vec4::direction(1.0, -1.0, 0.0),
            ..Vertex::default()
        };
        let n = shader.shade(&normal).normal;
        let tangent = Vec4::direction(1.0, 1.0, 0.0) * m;
        assert_relative_eq!(n.dot(tangent), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn singular_matrix_keeps_normal() {
        let shader = VertexShader::new(Mat4::ZERO);
        let v = Vertex {
            normal: Vec4::direction(0.0, 0.0, 1.0),
            ..Vertex::default()
        };
        assert_eq!(shader.shade(&v).normal, v.normal);
    }

    #[test]
    fn closures_are_fragment_shaders() {
        let brighten = |mut f: Fragment| {
            f.color = 0xFFFFFFFF;
            f
        };
        let out = brighten.shade(Fragment::new(1, 2, 0.5));
        assert_eq!(out.color, 0xFFFFFFFF);
        assert_eq!(PassThrough.shade(out), out);
    }
}
