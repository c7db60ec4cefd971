//! The camera: owns the view and the frame, and drives the pipeline.
//!
//! # Coordinate System
//!
//! Uses a **left-handed** coordinate system:
//! - X: positive right
//! - Y: positive up
//! - Z: positive forward (into screen)
//!
//! Matrices use the row-vector convention, so the full transform of a mesh
//! is `model_to_world * world_to_camera * projection`.
//!
//! # Frame
//!
//! [`Camera::draw_frame`] clears the foreground surface and the depth buffer,
//! rebuilds the cached matrices if a setter changed them, runs every triangle
//! of every mesh through the pipeline, notifies the frame listener, and swaps.
//! [`Camera::render_frame`] additionally hands the swapped frame to a
//! [`Present`] surface.
//!
//! Per triangle: backface cull (in world space) → vertex shader → clip →
//! perspective divide → screen map → rasterize → fragment shader → depth
//! test and write.

use crate::clipper::{ClipMode, ClipSpaceClipper};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::math::{Mat4, Vec3, Vec4};
use crate::mesh::Mesh;
use crate::projection::Projection;
use crate::render::{
    Canvas, DepthBuffer, DoubleBuffer, Fragment, FragmentShader, PassThrough, Present,
    Rasterizer, RenderMode, ShadingMode, VertexShader, Viewport,
};
use crate::vertex::Vertex;

/// Counters for the most recent frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Triangles submitted across all meshes.
    pub triangles: usize,
    /// Triangles rejected as back-facing.
    pub culled: usize,
    /// Triangles entirely outside the clip volume.
    pub clipped: usize,
    /// Triangles handed to the rasterizer, counted after clipping.
    pub rasterized: usize,
    pub fragments: usize,
    /// Fragments that passed the depth test and landed on the surface.
    pub pixels_written: usize,
    pub matrices_rebuilt: bool,
}

type FrameListener = Box<dyn FnMut(&Canvas)>;

pub struct Camera {
    width: u32,
    height: u32,

    position: Vec3,
    direction: Vec3,
    up: Vec3,
    projection: Projection,

    // Valid only while `dirty` is false.
    dirty: bool,
    world_to_camera: Mat4,
    projection_matrix: Mat4,
    matrix_rebuilds: u64,

    render_mode: RenderMode,
    shading: ShadingMode,
    rasterizer: Box<dyn Rasterizer>,
    fragment_shader: Box<dyn FragmentShader>,
    clipper: ClipSpaceClipper,

    background: u32,
    fill: u32,
    outline: u32,

    buffers: DoubleBuffer,
    depth: DepthBuffer,

    // Scratch space reused across triangles.
    fragments: Vec<Fragment>,
    clipped: Vec<[Vertex; 3]>,

    frame_listener: Option<FrameListener>,
    stats: FrameStats,
}

impl Camera {
    /// Creates a camera at the origin looking along +Z with a 90° field of
    /// view, near 0.1 and far 100. The aspect ratio follows the resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_config(&RenderConfig {
            width,
            height,
            ..RenderConfig::default()
        })
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        let (width, height) = (config.width, config.height);
        let camera = &config.camera;
        let aspect_ratio = width as f32 / height.max(1) as f32;

        Self {
            width,
            height,
            position: camera.position,
            direction: camera.direction,
            up: camera.up,
            projection: Projection::from_degrees(
                camera.fov,
                aspect_ratio,
                camera.near,
                camera.far,
            ),
            dirty: true,
            world_to_camera: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            matrix_rebuilds: 0,
            render_mode: config.render_mode,
            shading: config.shading,
            rasterizer: config.render_mode.rasterizer(Viewport::new(width, height)),
            fragment_shader: Box::new(PassThrough),
            clipper: ClipSpaceClipper::new(config.clip_mode),
            background: config.background,
            fill: config.fill,
            outline: config.outline,
            buffers: DoubleBuffer::new(width, height, config.background),
            depth: DepthBuffer::new(width, height),
            fragments: Vec::new(),
            clipped: Vec::new(),
            frame_listener: None,
            stats: FrameStats::default(),
        }
    }

    // =========================================================================
    // View
    // =========================================================================

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.projection.fov_y_degrees()
    }

    pub fn near(&self) -> f32 {
        self.projection.z_near()
    }

    pub fn far(&self) -> f32 {
        self.projection.z_far()
    }

    /// Width over height, fixed by the resolution.
    pub fn aspect(&self) -> f32 {
        self.projection.aspect_ratio()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
        self.dirty = true;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.dirty = true;
    }

    /// Sets the vertical field of view in degrees.
    ///
    /// The projection parameters are only checked when the matrices are
    /// rebuilt, so they may pass through invalid combinations in between.
    /// A frame drawn with `fov` outside `(0, 180)` or without
    /// `0 < near < far` logs a warning and renders a degenerate projection.
    pub fn set_fov(&mut self, degrees: f32) {
        self.projection.set_fov_degrees(degrees);
        self.dirty = true;
    }

    /// Must end up in `0 < near < far` by the next frame; see [`Camera::set_fov`].
    pub fn set_near(&mut self, near: f32) {
        self.projection.set_z_near(near);
        self.dirty = true;
    }

    pub fn set_far(&mut self, far: f32) {
        self.projection.set_z_far(far);
        self.dirty = true;
    }

    /// Sets every view parameter at once; `fov` is in degrees.
    pub fn configure(
        &mut self,
        position: Vec3,
        direction: Vec3,
        up: Vec3,
        fov: f32,
        near: f32,
        far: f32,
    ) {
        self.position = position;
        self.direction = direction;
        self.up = up;
        self.projection.set_fov_degrees(fov);
        self.projection.set_z_near(near);
        self.projection.set_z_far(far);
        self.dirty = true;
    }

    /// Points the camera from its current position toward `target`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.direction = target - self.position;
        self.up = up;
        self.dirty = true;
    }

    /// Whether the cached matrices are stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The world-to-camera matrix as of the last rebuild.
    pub fn view_matrix(&self) -> &Mat4 {
        &self.world_to_camera
    }

    /// The projection matrix as of the last rebuild.
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// How many times the matrices have been rebuilt since construction.
    pub fn matrix_rebuilds(&self) -> u64 {
        self.matrix_rebuilds
    }

    fn rebuild_matrices(&mut self) {
        let forward = self.direction.normalize();
        let right = self.up.cross(forward).normalize();
        let up = forward.cross(right);

        if !self.projection.is_valid() {
            log::warn!(
                "Degenerate projection: fov {:.1}, near {}, far {}, aspect {}",
                self.fov(),
                self.near(),
                self.far(),
                self.aspect()
            );
        }

        self.world_to_camera = Mat4::change_of_basis(self.position, right, up, forward);
        self.projection_matrix = self.projection.matrix();
        self.dirty = false;
        self.matrix_rebuilds += 1;

        log::debug!(
            "Rebuilt camera matrices: position {:?}, direction {:?}, fov {:.1}",
            self.position,
            self.direction,
            self.fov()
        );
    }

    // =========================================================================
    // Pipeline configuration
    // =========================================================================

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Switches between wireframe and filled drawing. The rasterizer is only
    /// replaced when the mode actually changes.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode != self.render_mode {
            log::debug!("Render mode {} -> {}", self.render_mode, mode);
            self.render_mode = mode;
            self.rasterizer = mode.rasterizer(self.viewport());
        }
    }

    pub fn shading(&self) -> ShadingMode {
        self.shading
    }

    pub fn set_shading(&mut self, shading: ShadingMode) {
        self.shading = shading;
    }

    pub fn clip_mode(&self) -> ClipMode {
        self.clipper.mode()
    }

    pub fn set_clip_mode(&mut self, mode: ClipMode) {
        self.clipper = ClipSpaceClipper::new(mode);
    }

    /// Sets the clear, fill and outline colors (packed ARGB).
    pub fn set_colors(&mut self, background: u32, fill: u32, outline: u32) {
        self.background = background;
        self.fill = fill;
        self.outline = outline;
    }

    /// Installs a per-fragment hook run just before each pixel write.
    pub fn set_fragment_shader<S: FragmentShader + 'static>(&mut self, shader: S) {
        self.fragment_shader = Box::new(shader);
    }

    /// Registers a callback that sees each completed frame before the swap.
    pub fn set_frame_listener<F: FnMut(&Canvas) + 'static>(&mut self, listener: F) {
        self.frame_listener = Some(Box::new(listener));
    }

    pub fn clear_frame_listener(&mut self) {
        self.frame_listener = None;
    }

    // =========================================================================
    // Frame
    // =========================================================================

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel rectangle fragments are rasterized into.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// The most recently completed frame.
    pub fn presented(&self) -> &Canvas {
        self.buffers.background()
    }

    pub fn last_frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Draws a frame and hands it to `surface`.
    pub fn render_frame<'m, I, M, S>(
        &mut self,
        meshes: I,
        surface: &mut S,
    ) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = M>,
        M: Into<Option<&'m Mesh>>,
        S: Present + ?Sized,
    {
        self.draw_frame(meshes)?;
        surface
            .present(self.buffers.background())
            .map_err(RenderError::Present)
    }

    /// Draws a frame and swaps it to the background without presenting it.
    ///
    /// Meshes are drawn in iteration order; `None` entries are skipped. A
    /// malformed mesh aborts the frame: no listener call and no swap.
    pub fn draw_frame<'m, I, M>(&mut self, meshes: I) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = M>,
        M: Into<Option<&'m Mesh>>,
    {
        let mut stats = FrameStats::default();

        self.buffers.foreground_mut().clear(self.background);
        self.depth.clear();

        if self.dirty {
            self.rebuild_matrices();
            stats.matrices_rebuilt = true;
        }
        let view_projection = self.world_to_camera * self.projection_matrix;

        for (index, mesh) in meshes.into_iter().enumerate() {
            let mesh: Option<&'m Mesh> = mesh.into();
            let Some(mesh) = mesh else {
                log::trace!("Mesh {} absent, skipped", index);
                continue;
            };
            let mut clipped = std::mem::take(&mut self.clipped);
            let result = self.draw_mesh(index, mesh, &view_projection, &mut clipped, &mut stats);
            self.clipped = clipped;
            result?;
        }

        if let Some(listener) = self.frame_listener.as_mut() {
            listener(self.buffers.foreground());
        }
        self.buffers.swap();

        log::debug!(
            "Frame: {} triangles, {} culled, {} clipped, {} rasterized, {} fragments, {} pixels",
            stats.triangles,
            stats.culled,
            stats.clipped,
            stats.rasterized,
            stats.fragments,
            stats.pixels_written
        );
        self.stats = stats;
        Ok(())
    }

    fn draw_mesh(
        &mut self,
        mesh_index: usize,
        mesh: &Mesh,
        view_projection: &Mat4,
        clipped: &mut Vec<[Vertex; 3]>,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let model = *mesh.model_to_world();
        let shader = VertexShader::new(model * *view_projection);

        for (triangle_index, triangle) in mesh.triangles().iter().enumerate() {
            stats.triangles += 1;

            let corners = mesh
                .triangle_vertices(triangle)
                .map_err(|source| RenderError::MalformedMesh {
                    mesh: mesh_index,
                    triangle: triangle_index,
                    source,
                })?;

            if self.is_backface(&corners, &model) {
                log::trace!("Mesh {} triangle {} culled", mesh_index, triangle_index);
                stats.culled += 1;
                continue;
            }

            clipped.clear();
            self.clipper
                .clip_triangle(corners.map(|v| shader.shade(&v)), clipped);
            if clipped.is_empty() {
                log::trace!("Mesh {} triangle {} clipped away", mesh_index, triangle_index);
                stats.clipped += 1;
                continue;
            }

            for piece in clipped.iter() {
                self.draw_clipped(piece, stats);
            }
        }
        Ok(())
    }

    /// A triangle faces away when its world-space normal points along the
    /// view direction. Degenerate triangles have a zero normal and are culled too.
    fn is_backface(&self, corners: &[Vertex; 3], model: &Mat4) -> bool {
        let [a, b, c] = corners.map(|v| (v.position * *model).to_vec3());
        let normal = (b - a).cross(c - a);
        normal.dot(self.direction) >= 0.0
    }

    /// Maps a clip-space vertex to pixels: x right, y down, NDC depth in z.
    fn to_screen(&self, vertex: &Vertex) -> Vertex {
        let ndc = vertex.position.perspective_divide();
        let half_width = self.width as f32 * 0.5;
        let half_height = self.height as f32 * 0.5;
        Vertex {
            position: Vec4::new(
                half_width * ndc.x + half_width,
                half_height - half_height * ndc.y,
                ndc.z,
                1.0,
            ),
            ..*vertex
        }
    }

    fn draw_clipped(&mut self, piece: &[Vertex; 3], stats: &mut FrameStats) {
        if piece.iter().any(|v| v.position.w <= f32::EPSILON) {
            return;
        }
        let [a, b, c] = piece.map(|v| self.to_screen(&v));

        let mut fragments = std::mem::take(&mut self.fragments);
        fragments.clear();
        self.rasterizer.rasterize(&a, &b, &c, &mut fragments);
        stats.rasterized += 1;
        stats.fragments += fragments.len();

        match self.render_mode {
            RenderMode::Wireframe => {
                for fragment in &fragments {
                    let shaded = self.fragment_shader.shade(Fragment {
                        color: self.outline,
                        ..*fragment
                    });
                    if self.buffers.foreground_mut().set_pixel(shaded.x, shaded.y, shaded.color) {
                        stats.pixels_written += 1;
                    }
                }
            }
            RenderMode::Filled => {
                for fragment in &fragments {
                    self.depth.write_nearest(fragment.x, fragment.y, fragment.depth);
                }
                for fragment in &fragments {
                    let color = match self.shading {
                        ShadingMode::Flat => self.fill,
                        ShadingMode::Gouraud => fragment.color,
                    };
                    let shaded = self.fragment_shader.shade(Fragment { color, ..*fragment });
                    if self.depth.test(shaded.x, shaded.y, shaded.depth)
                        && self.buffers.foreground_mut().set_pixel(shaded.x, shaded.y, shaded.color)
                    {
                        stats.pixels_written += 1;
                    }
                }
            }
        }

        self.fragments = fragments;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("position", &self.position)
            .field("direction", &self.direction)
            .field("up", &self.up)
            .field("projection", &self.projection)
            .field("dirty", &self.dirty)
            .field("render_mode", &self.render_mode)
            .field("shading", &self.shading)
            .field("clip_mode", &self.clipper.mode())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors;
    use crate::mesh::Attribute;
    use crate::triangle::{Index, Triangle};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SIZE: u32 = 400;

    /// Projects to screen (100, 100), (200, 100), (100, 150) at 400x400, fov 90.
    fn facing_triangle(scale: f32) -> [Vec3; 3] {
        [
            Vec3::new(-2.5, 2.5, 5.0) * scale,
            Vec3::new(0.0, 2.5, 5.0) * scale,
            Vec3::new(-2.5, 1.25, 5.0) * scale,
        ]
    }

    fn triangle_mesh(points: [Vec3; 3], color: u32) -> Mesh {
        Mesh::new("triangle", points.to_vec(), vec![], vec![Triangle::from_shared(0, 1, 2)])
            .with_colors(vec![color; 3])
    }

    fn filled_camera() -> Camera {
        let mut camera = Camera::new(SIZE, SIZE);
        camera.set_render_mode(RenderMode::Filled);
        camera
    }

    fn count(canvas: &Canvas, color: u32) -> usize {
        canvas.pixels().iter().filter(|&&p| p == color).count()
    }

    #[test]
    fn defaults() {
        let camera = Camera::new(SIZE, SIZE);
        assert_eq!(camera.position(), Vec3::ZERO);
        assert_eq!(camera.direction(), Vec3::FORWARD);
        assert_eq!(camera.up(), Vec3::UP);
        assert_relative_eq!(camera.fov(), 90.0, epsilon = 1e-4);
        assert_relative_eq!(camera.near(), 0.1);
        assert_relative_eq!(camera.far(), 100.0);
        assert_eq!(camera.aspect(), 1.0);
        assert_eq!(camera.render_mode(), RenderMode::Wireframe);
        assert_eq!(camera.clip_mode(), ClipMode::Near);
        assert!(camera.is_dirty());
    }

    #[test]
    fn filled_triangle_covers_its_projection() {
        let mut camera = filled_camera();
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        camera.draw_frame([&mesh]).unwrap();

        let frame = camera.presented();
        for (x, y) in [(120, 110), (110, 140), (102, 102), (190, 103), (150, 120)] {
            assert_eq!(frame.get_pixel(x, y), Some(colors::FILL), "({}, {})", x, y);
        }
        for (x, y) in [(150, 140), (98, 120), (150, 98), (50, 50), (300, 300)] {
            assert_eq!(frame.get_pixel(x, y), Some(colors::BACKGROUND), "({}, {})", x, y);
        }

        // Right triangle with legs 100 and 50; boundary samples may go either way.
        let filled = count(frame, colors::FILL);
        assert!((2350..=2700).contains(&filled), "{} pixels filled", filled);
        assert!(camera.last_frame_stats().pixels_written >= filled);
        assert_eq!(filled + count(frame, colors::BACKGROUND), (SIZE * SIZE) as usize);
    }

    #[test]
    fn wireframe_draws_edges_only() {
        let mut camera = Camera::new(SIZE, SIZE);
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        camera.draw_frame([&mesh]).unwrap();

        let frame = camera.presented();
        for (x, y) in [(100, 100), (150, 100), (200, 100), (100, 125), (100, 150), (150, 125)] {
            assert_eq!(frame.get_pixel(x, y), Some(colors::OUTLINE), "({}, {})", x, y);
        }
        for (x, y) in [(120, 110), (110, 140), (130, 105)] {
            assert_eq!(frame.get_pixel(x, y), Some(colors::BACKGROUND), "({}, {})", x, y);
        }
        assert_eq!(
            count(frame, colors::OUTLINE) + count(frame, colors::BACKGROUND),
            (SIZE * SIZE) as usize
        );
    }

    #[test]
    fn backfacing_triangle_draws_nothing() {
        let [a, b, c] = facing_triangle(1.0);
        let mut camera = filled_camera();
        let mesh = triangle_mesh([a, c, b], colors::WHITE);
        camera.draw_frame([&mesh]).unwrap();

        assert_eq!(count(camera.presented(), colors::BACKGROUND), (SIZE * SIZE) as usize);
        let stats = camera.last_frame_stats();
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.fragments, 0);
    }

    #[test]
    fn nearer_triangle_wins_in_either_order() {
        const RED: u32 = 0xFFFF0000;
        const BLUE: u32 = 0xFF0000FF;
        // Projects to (60, 60), (320, 60), (60, 190), enclosing the near triangle.
        let far = triangle_mesh(
            [
                Vec3::new(-7.0, 7.0, 10.0),
                Vec3::new(6.0, 7.0, 10.0),
                Vec3::new(-7.0, 0.5, 10.0),
            ],
            RED,
        );
        let near = triangle_mesh(facing_triangle(1.0), BLUE);

        for order in [[&far, &near], [&near, &far]] {
            let mut camera = filled_camera();
            camera.set_shading(ShadingMode::Gouraud);
            camera.draw_frame(order).unwrap();

            let frame = camera.presented();
            for (x, y) in [(120, 110), (110, 140), (150, 120)] {
                assert_eq!(frame.get_pixel(x, y), Some(BLUE), "({}, {})", x, y);
            }
            for (x, y) in [(250, 80), (70, 70), (80, 170)] {
                assert_eq!(frame.get_pixel(x, y), Some(RED), "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn matrices_rebuild_lazily() {
        let mut camera = filled_camera();
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        assert_eq!(camera.matrix_rebuilds(), 0);

        camera.draw_frame([&mesh]).unwrap();
        assert_eq!(camera.matrix_rebuilds(), 1);
        assert!(camera.last_frame_stats().matrices_rebuilt);
        let view = *camera.view_matrix();
        let projection = *camera.projection_matrix();

        camera.draw_frame([&mesh]).unwrap();
        assert_eq!(camera.matrix_rebuilds(), 1);
        assert!(!camera.last_frame_stats().matrices_rebuilt);
        assert_eq!(*camera.view_matrix(), view);
        assert_eq!(*camera.projection_matrix(), projection);

        camera.set_position(Vec3::new(0.0, 0.0, -1.0));
        camera.set_fov(60.0);
        assert!(camera.is_dirty());
        assert_eq!(camera.matrix_rebuilds(), 1);

        camera.draw_frame([&mesh]).unwrap();
        assert_eq!(camera.matrix_rebuilds(), 2);
        assert!(!camera.is_dirty());
        assert_ne!(*camera.view_matrix(), view);
        assert_ne!(*camera.projection_matrix(), projection);
    }

    #[test]
    fn every_view_setter_triggers_one_rebuild() {
        let setters: [(&str, fn(&mut Camera)); 8] = [
            ("set_position", |c: &mut Camera| c.set_position(Vec3::new(0.0, 1.0, -2.0))),
            ("set_direction", |c: &mut Camera| c.set_direction(Vec3::new(0.2, 0.0, 1.0))),
            ("set_up", |c: &mut Camera| c.set_up(Vec3::new(0.1, 1.0, 0.0))),
            ("set_fov", |c: &mut Camera| c.set_fov(75.0)),
            ("set_near", |c: &mut Camera| c.set_near(0.5)),
            ("set_far", |c: &mut Camera| c.set_far(50.0)),
            ("configure", |c: &mut Camera| {
                c.configure(Vec3::ZERO, Vec3::FORWARD, Vec3::UP, 90.0, 0.1, 100.0)
            }),
            ("look_at", |c: &mut Camera| c.look_at(Vec3::new(1.0, 0.0, 5.0), Vec3::UP)),
        ];

        let mut camera = Camera::new(SIZE, SIZE);
        let empty = || std::iter::empty::<&Mesh>();
        camera.draw_frame(empty()).unwrap();

        for (name, setter) in setters {
            let before = camera.matrix_rebuilds();
            setter(&mut camera);
            assert!(camera.is_dirty(), "{} did not mark the camera dirty", name);
            assert_eq!(camera.matrix_rebuilds(), before, "{} rebuilt eagerly", name);

            camera.draw_frame(empty()).unwrap();
            assert_eq!(camera.matrix_rebuilds(), before + 1, "{}", name);
            assert!(camera.last_frame_stats().matrices_rebuilt, "{}", name);

            camera.draw_frame(empty()).unwrap();
            assert_eq!(camera.matrix_rebuilds(), before + 1, "{} rebuilt twice", name);
            assert!(!camera.is_dirty());
        }
    }

    #[test]
    fn view_matrix_moves_world_into_camera_space() {
        let mut camera = Camera::new(SIZE, SIZE);
        camera.set_position(Vec3::new(0.0, 0.0, -5.0));
        camera.look_at(Vec3::new(5.0, 0.0, -5.0), Vec3::UP);
        camera.draw_frame(std::iter::empty::<&Mesh>()).unwrap();

        assert_eq!(camera.direction(), Vec3::new(5.0, 0.0, 0.0));
        // The target lies straight ahead, 5 units down the camera's +Z.
        let target = Vec4::point(5.0, 0.0, -5.0) * *camera.view_matrix();
        assert_relative_eq!(target.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(target.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(target.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn frame_listener_sees_frame_before_swap() {
        let mut camera = filled_camera();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        camera.set_frame_listener(move |canvas: &Canvas| {
            sink.borrow_mut().push(canvas.get_pixel(120, 110));
        });

        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        camera.draw_frame([&mesh]).unwrap();
        camera.draw_frame(std::iter::empty::<&Mesh>()).unwrap();
        assert_eq!(*seen.borrow(), vec![Some(colors::FILL), Some(colors::BACKGROUND)]);

        camera.clear_frame_listener();
        camera.draw_frame([&mesh]).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn fragment_shader_recolors_pixels() {
        const GREEN: u32 = 0xFF00FF00;
        let mut camera = filled_camera();
        camera.set_fragment_shader(|fragment: Fragment| Fragment {
            color: GREEN,
            ..fragment
        });
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        camera.draw_frame([&mesh]).unwrap();

        assert_eq!(camera.presented().get_pixel(120, 110), Some(GREEN));
        assert_eq!(count(camera.presented(), colors::FILL), 0);
    }

    #[test]
    fn absent_meshes_are_skipped() {
        let mut camera = filled_camera();
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        camera.draw_frame([None, Some(&mesh), None]).unwrap();

        assert_eq!(camera.presented().get_pixel(120, 110), Some(colors::FILL));
        assert_eq!(camera.last_frame_stats().triangles, 1);
    }

    #[test]
    fn malformed_mesh_aborts_frame() {
        let mut camera = filled_camera();
        let good = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        camera.draw_frame([&good]).unwrap();
        let previous = camera.presented().clone();

        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        camera.set_frame_listener(move |_: &Canvas| *counter.borrow_mut() += 1);

        let bad = Mesh::new(
            "bad",
            facing_triangle(1.0).to_vec(),
            vec![],
            vec![Triangle::new(Index::shared(0), Index::shared(1), Index::shared(7))],
        );
        let mut surface = Canvas::new(SIZE, SIZE, 0);
        let result = camera.render_frame([&good, &bad], &mut surface);

        match result {
            Err(RenderError::MalformedMesh { mesh, triangle, source }) => {
                assert_eq!((mesh, triangle), (1, 0));
                assert_eq!(source.attribute, Attribute::Position);
                assert_eq!(source.index, 7);
            }
            other => panic!("expected a malformed mesh error, got {:?}", other),
        }
        assert_eq!(*camera.presented(), previous);
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(count(&surface, 0), (SIZE * SIZE) as usize);
    }

    #[test]
    fn render_frame_presents_background() {
        let mut camera = filled_camera();
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);
        let mut surface = Canvas::new(SIZE, SIZE, 0);
        camera.render_frame([&mesh], &mut surface).unwrap();
        assert_eq!(surface, *camera.presented());

        let mut wrong_size = Canvas::new(10, 10, 0);
        assert!(matches!(
            camera.render_frame([&mesh], &mut wrong_size),
            Err(RenderError::Present(_))
        ));
    }

    #[test]
    fn triangle_through_near_plane_is_clipped() {
        let mut camera = filled_camera();
        camera.set_clip_mode(ClipMode::Frustum);
        // Two corners in front of the camera, one behind it.
        let mesh = triangle_mesh(
            [
                Vec3::new(-1.0, -0.5, 2.0),
                Vec3::new(1.0, -0.5, 2.0),
                Vec3::new(0.0, -1.5, -2.0),
            ],
            colors::WHITE,
        );
        camera.draw_frame([&mesh]).unwrap();

        let stats = camera.last_frame_stats();
        assert_eq!(stats.culled, 0);
        assert!(stats.rasterized >= 2);
        let frame = camera.presented();
        assert_eq!(frame.get_pixel(200, 300), Some(colors::FILL));
        assert_eq!(frame.get_pixel(200, 390), Some(colors::FILL));
        assert_eq!(frame.get_pixel(200, 200), Some(colors::BACKGROUND));
    }

    #[test]
    fn triangle_behind_camera_is_clipped_away() {
        // Culling looks only at the view direction, so this still faces the camera.
        let behind = facing_triangle(1.0).map(|p| Vec3::new(p.x, p.y, -p.z));
        let mesh = triangle_mesh(behind, colors::WHITE);
        let mut camera = filled_camera();
        camera.draw_frame([&mesh]).unwrap();

        let stats = camera.last_frame_stats();
        assert_eq!(stats.culled, 0);
        assert_eq!(stats.clipped, 1);
        assert_eq!(stats.fragments, 0);
    }

    #[test]
    fn near_plane_geometry_work_is_bounded_by_screen() {
        let screen = (SIZE * SIZE) as usize;
        // Just past the near plane: projects to about 8000 pixels on a side.
        let close = triangle_mesh(
            [
                Vec3::new(-4.0, 4.0, 0.2),
                Vec3::new(4.0, 4.0, 0.2),
                Vec3::new(-4.0, -4.0, 0.2),
            ],
            colors::WHITE,
        );

        let mut camera = filled_camera();
        camera.draw_frame([&close]).unwrap();
        let stats = *camera.last_frame_stats();
        assert!(stats.fragments > 0 && stats.fragments <= screen, "{:?}", stats);
        assert_eq!(stats.pixels_written, stats.fragments);
        assert_eq!(camera.presented().get_pixel(10, 10), Some(colors::FILL));
        assert_eq!(camera.presented().get_pixel(390, 390), Some(colors::BACKGROUND));

        camera.set_render_mode(RenderMode::Wireframe);
        camera.draw_frame([&close]).unwrap();
        let stats = *camera.last_frame_stats();
        assert!(stats.fragments > 0 && stats.fragments <= 6 * SIZE as usize, "{:?}", stats);

        // Crossing the near plane: clipped corners land at w = near.
        let crossing = triangle_mesh(
            [
                Vec3::new(-1.0, -0.5, 2.0),
                Vec3::new(1.0, -0.5, 2.0),
                Vec3::new(0.0, -1.5, -2.0),
            ],
            colors::WHITE,
        );
        let mut camera = filled_camera();
        assert_eq!(camera.clip_mode(), ClipMode::Near);
        camera.draw_frame([&crossing]).unwrap();
        let stats = *camera.last_frame_stats();
        assert!(stats.rasterized >= 1);
        assert!(stats.fragments <= 2 * screen, "{:?}", stats);
        assert_eq!(camera.presented().get_pixel(200, 390), Some(colors::FILL));
    }

    #[test]
    fn uv_index_past_default_stream_aborts_frame() {
        let corners = [0, 1, 2].map(|i| Index::new(i, i, 5));
        let mesh = Mesh::new(
            "uvless",
            facing_triangle(1.0).to_vec(),
            vec![],
            vec![Triangle::new(corners[0], corners[1], corners[2])],
        );

        let mut camera = filled_camera();
        match camera.draw_frame([&mesh]) {
            Err(RenderError::MalformedMesh { source, .. }) => {
                assert_eq!(source.attribute, Attribute::Uv);
                assert_eq!(source.index, 5);
            }
            other => panic!("expected a malformed mesh error, got {:?}", other),
        }
    }

    #[test]
    fn model_matrix_places_mesh() {
        let mut camera = filled_camera();
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE)
            .with_model_to_world(Mat4::translation(0.0, 0.0, 5.0));
        camera.draw_frame([&mesh]).unwrap();

        // Twice as far away: the triangle shrinks toward the center.
        let frame = camera.presented();
        assert_eq!(frame.get_pixel(160, 155), Some(colors::FILL));
        assert_eq!(frame.get_pixel(120, 110), Some(colors::BACKGROUND));
    }

    #[test]
    fn render_mode_switch_changes_output() {
        let mut camera = Camera::new(SIZE, SIZE);
        let mesh = triangle_mesh(facing_triangle(1.0), colors::WHITE);

        camera.set_render_mode(RenderMode::Filled);
        camera.draw_frame([&mesh]).unwrap();
        assert_eq!(camera.presented().get_pixel(120, 110), Some(colors::FILL));

        camera.set_render_mode(RenderMode::Wireframe);
        camera.draw_frame([&mesh]).unwrap();
        assert_eq!(camera.presented().get_pixel(120, 110), Some(colors::BACKGROUND));
    }
}
