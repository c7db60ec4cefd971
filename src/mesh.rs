//! Triangle meshes: attribute streams, triangle list and model-to-world matrix.
//!
//! The pipeline only ever borrows a mesh. Vertices are assembled per triangle
//! corner by [`Mesh::vertex`], which is where out-of-range indices surface.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::colors;
use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::transform::Transform;
use crate::triangle::{Index, Triangle};
use crate::vertex::Vertex;

/// The attribute stream an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    Normal,
    Color,
    Uv,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Position => write!(f, "position"),
            Attribute::Normal => write!(f, "normal"),
            Attribute::Color => write!(f, "color"),
            Attribute::Uv => write!(f, "uv"),
        }
    }
}

/// A triangle corner referenced a slot its stream does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{attribute} index {index} out of bounds (stream length {len})")]
pub struct IndexError {
    pub attribute: Attribute,
    pub index: usize,
    pub len: usize,
}

/// Errors from loading mesh files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("OBJ file '{0}' contains no meshes")]
    Empty(String),
    #[error("mesh '{mesh}' is malformed: {source}")]
    Malformed {
        mesh: String,
        #[source]
        source: IndexError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    positions: Vec<Vec3>,
    /// Parallel to `positions`; empty means no normals.
    normals: Vec<Vec3>,
    colors: Vec<u32>,
    uvs: Vec<Vec2>,
    triangles: Vec<Triangle>,
    model_to_world: Mat4,
}

impl Mesh {
    /// Builds a mesh with a white palette of one color per position.
    ///
    /// An empty `uvs` stream is filled with one `(0, 0)` per position, so
    /// corners that share one index across streams stay in range.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        uvs: Vec<Vec2>,
        triangles: Vec<Triangle>,
    ) -> Self {
        let uvs = if uvs.is_empty() {
            vec![Vec2::ZERO; positions.len()]
        } else {
            uvs
        };
        Self {
            name: name.into(),
            colors: vec![colors::WHITE; positions.len()],
            positions,
            normals: Vec::new(),
            uvs,
            triangles,
            model_to_world: Mat4::IDENTITY,
        }
    }

    pub fn with_colors(mut self, colors: Vec<u32>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_model_to_world(mut self, matrix: Mat4) -> Self {
        self.model_to_world = matrix;
        self
    }

    /// Unit cube centered at the origin, one palette color per face.
    ///
    /// Faces wind clockwise when seen from outside in the left-handed,
    /// y-up world, so every outward face survives backface culling.
    pub fn cube() -> Self {
        let positions = CUBE_VERTICES.to_vec();
        let uvs = vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ];
        let triangles = CUBE_FACES
            .iter()
            .enumerate()
            .flat_map(|(face, &[a, b, c, d])| {
                [
                    Triangle::new(
                        Index::new(a, face, 0),
                        Index::new(b, face, 1),
                        Index::new(c, face, 2),
                    ),
                    Triangle::new(
                        Index::new(a, face, 0),
                        Index::new(c, face, 2),
                        Index::new(d, face, 3),
                    ),
                ]
            })
            .collect();

        Self::new("cube", positions, uvs, triangles).with_colors(CUBE_FACE_COLORS.to_vec())
    }

    /// Load every object in an OBJ file and merge them into a single mesh.
    pub fn from_obj(file_path: &str) -> Result<Self, LoadError> {
        let meshes = Self::load_all_from_obj(file_path)?;
        let mut merged = Mesh::new(file_path, Vec::new(), Vec::new(), Vec::new());

        for mesh in meshes {
            let offset = merged.positions.len();
            let uv_offset = merged.uvs.len();
            let shift =
                |i: Index| Index::new(i.vertex + offset, i.color + offset, i.uv + uv_offset);

            merged.triangles.extend(
                mesh.triangles
                    .iter()
                    .map(|t| Triangle::new(shift(t.a), shift(t.b), shift(t.c))),
            );
            merged.positions.extend(mesh.positions);
            merged.normals.extend(mesh.normals);
            merged.colors.extend(mesh.colors);
            merged.uvs.extend(mesh.uvs);
        }

        // Normals only present on some objects cannot be indexed consistently.
        if merged.normals.len() != merged.positions.len() {
            merged.normals.clear();
        }

        Ok(merged)
    }

    /// Load each object/group of an OBJ file as its own mesh.
    pub fn load_all_from_obj(file_path: &str) -> Result<Vec<Self>, LoadError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(Path::new(file_path), &options)?;

        if models.is_empty() {
            return Err(LoadError::Empty(file_path.to_string()));
        }

        let meshes = models
            .into_iter()
            .map(|model| {
                let mesh = Self::from_tobj(model.name, &model.mesh);
                mesh.validate().map_err(|source| LoadError::Malformed {
                    mesh: mesh.name.clone(),
                    source,
                })?;
                Ok(mesh)
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        log::info!("loaded {} mesh(es) from {}", meshes.len(), file_path);
        Ok(meshes)
    }

    fn from_tobj(name: String, source: &tobj::Mesh) -> Self {
        let positions = source
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        let normals = source
            .normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect();
        let vertex_count = source.positions.len() / 3;
        let uvs = if source.texcoords.is_empty() {
            vec![Vec2::ZERO; vertex_count]
        } else {
            source
                .texcoords
                .chunks_exact(2)
                .map(|t| Vec2::new(t[0], t[1]))
                .collect()
        };
        let colors = if source.vertex_color.is_empty() {
            vec![colors::WHITE; vertex_count]
        } else {
            source
                .vertex_color
                .chunks_exact(3)
                .map(|c| colors::pack_color(c[0], c[1], c[2], 1.0))
                .collect()
        };
        let triangles = source
            .indices
            .chunks_exact(3)
            .map(|t| Triangle::from_shared(t[0] as usize, t[1] as usize, t[2] as usize))
            .collect();

        Self {
            name,
            positions,
            normals,
            colors,
            uvs,
            triangles,
            model_to_world: Mat4::IDENTITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn model_to_world(&self) -> &Mat4 {
        &self.model_to_world
    }

    pub fn set_model_to_world(&mut self, matrix: Mat4) {
        self.model_to_world = matrix;
    }

    pub fn set_transform(&mut self, transform: &Transform) {
        self.model_to_world = transform.to_matrix();
    }

    /// Assembles the vertex for one triangle corner.
    ///
    /// Every position, color and uv index must be in range. Normals are
    /// optional: an empty normal stream yields a zero normal.
    pub fn vertex(&self, corner: Index) -> Result<Vertex, IndexError> {
        let position = fetch(&self.positions, corner.vertex, Attribute::Position)?;
        let color = fetch(&self.colors, corner.color, Attribute::Color)?;
        let uv = fetch(&self.uvs, corner.uv, Attribute::Uv)?;
        let normal = if self.normals.is_empty() {
            Vec3::ZERO
        } else {
            fetch(&self.normals, corner.vertex, Attribute::Normal)?
        };

        Ok(Vertex::new(
            Vec4::from_vec3(position, 1.0),
            color,
            uv,
            Vec4::from_vec3(normal, 0.0),
        ))
    }

    /// The three model-space vertices of a triangle.
    pub fn triangle_vertices(&self, triangle: &Triangle) -> Result<[Vertex; 3], IndexError> {
        Ok([
            self.vertex(triangle.a)?,
            self.vertex(triangle.b)?,
            self.vertex(triangle.c)?,
        ])
    }

    /// Checks every triangle corner against the attribute streams.
    pub fn validate(&self) -> Result<(), IndexError> {
        self.triangles
            .iter()
            .try_for_each(|t| self.triangle_vertices(t).map(|_| ()))
    }
}

fn fetch<T: Copy>(stream: &[T], index: usize, attribute: Attribute) -> Result<T, IndexError> {
    stream.get(index).copied().ok_or(IndexError {
        attribute,
        index,
        len: stream.len(),
    })
}

pub const CUBE_VERTICES: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
];

// Quads as (bottom-left, top-left, top-right, bottom-right) seen from outside.
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // front
    [3, 2, 4, 5], // right
    [5, 4, 6, 7], // back
    [7, 6, 1, 0], // left
    [1, 6, 4, 2], // top
    [5, 7, 0, 3], // bottom
];

const CUBE_FACE_COLORS: [u32; 6] = [
    0xFFE53935, 0xFF43A047, 0xFF1E88E5, 0xFFFDD835, 0xFF8E24AA, 0xFF00ACC1,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            "quad",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)],
            vec![Triangle::new(
                Index::new(0, 0, 0),
                Index::new(1, 0, 1),
                Index::new(2, 0, 1),
            )],
        )
    }

    #[test]
    fn vertex_streams_can_diverge() {
        let mesh = quad();
        let v = mesh.vertex(Index::new(2, 0, 1)).unwrap();
        assert_eq!(v.position, Vec4::point(1.0, 1.0, 0.0));
        assert_eq!(v.uv, Vec2::new(1.0, 1.0));
        assert_eq!(v.color, colors::WHITE);
        assert_eq!(v.normal, Vec4::ZERO);
    }

    #[test]
    fn position_index_out_of_range_is_an_error() {
        let err = quad().vertex(Index::new(3, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            IndexError {
                attribute: Attribute::Position,
                index: 3,
                len: 3
            }
        );
    }

    #[test]
    fn uv_index_out_of_range_is_an_error() {
        let err = quad().vertex(Index::new(0, 0, 2)).unwrap_err();
        assert_eq!(err.attribute, Attribute::Uv);
    }

    #[test]
    fn color_index_is_checked_against_palette() {
        let err = quad().vertex(Index::new(0, 9, 0)).unwrap_err();
        assert_eq!(
            err,
            IndexError {
                attribute: Attribute::Color,
                index: 9,
                len: 3
            }
        );

        let mesh = quad().with_colors(vec![0xFF112233]);
        assert_eq!(mesh.vertex(Index::new(0, 0, 0)).unwrap().color, 0xFF112233);
        assert_eq!(mesh.vertex(Index::new(0, 1, 0)).unwrap_err().attribute, Attribute::Color);
    }

    #[test]
    fn missing_uvs_default_to_one_per_position() {
        let positions = vec![Vec3::ZERO, Vec3::RIGHT, Vec3::UP];
        let mesh = Mesh::new("plain", positions, vec![], vec![Triangle::from_shared(0, 1, 2)]);
        assert_eq!(mesh.uvs(), &[Vec2::ZERO; 3]);
        assert!(mesh.validate().is_ok());

        // The default stream is still bounded by the position count.
        let err = mesh.vertex(Index::new(1, 0, 5)).unwrap_err();
        assert_eq!(
            err,
            IndexError {
                attribute: Attribute::Uv,
                index: 5,
                len: 3
            }
        );
    }

    #[test]
    fn cube_is_well_formed() {
        let cube = Mesh::cube();
        assert_eq!(cube.triangles().len(), 12);
        assert!(cube.validate().is_ok());
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = Mesh::cube();
        for triangle in cube.triangles() {
            let [a, b, c] = cube.triangle_vertices(triangle).unwrap();
            let (a, b, c) = (a.position.to_vec3(), b.position.to_vec3(), c.position.to_vec3());
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "inward face {:?}", triangle);
        }
    }
}
