use crate::display::framebuffer::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::math3d::{Vec3, Xform};

use super::raster::{draw_line, fill_triangle, BLACK, PATTERNS, WHITE};
use super::shape::Shape;

/// Which passes `Scene::draw_shape` runs for each visible face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStyle {
    pub filled: bool,
    pub wireframe: bool,
}

impl RenderStyle {
    pub const FILLED: Self = Self {
        filled: true,
        wireframe: false,
    };
    pub const WIREFRAME: Self = Self {
        filled: false,
        wireframe: true,
    };
    pub const FILLED_WIREFRAME: Self = Self {
        filled: true,
        wireframe: true,
    };
}

/// Per-call face counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub drawn: usize,
    pub culled_behind: usize,
    pub culled_offscreen: usize,
    pub culled_backface: usize,
}

impl DrawStats {
    pub fn total(&self) -> usize {
        self.drawn + self.culled_behind + self.culled_offscreen + self.culled_backface
    }
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.drawn += rhs.drawn;
        self.culled_behind += rhs.culled_behind;
        self.culled_offscreen += rhs.culled_offscreen;
        self.culled_backface += rhs.culled_backface;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FaceInstance {
    normal: Vec3,
    /// Sum of the three camera-space z values
    depth: f32,
}

/// Map a face normal to one of the 33 fill patterns (0 = black, 32 = white).
///
/// `color_bias` in (0, 1) lifts the range to `[bias, 1]`, in (-1, 0) scales
/// it to `[0, 1 + bias]`; at or beyond +-1 the face is solid white/black.
pub fn shade_level(normal: Vec3, light: Vec3, color_bias: f32, inverted: bool) -> usize {
    let c = color_bias;
    let v = if c <= -1.0 {
        0.0
    } else if c >= 1.0 {
        1.0
    } else {
        let d = normal.dot(&light);
        let v = if inverted { (1.0 + d) / 2.0 } else { (1.0 - d) / 2.0 };
        if c > 0.0 {
            c + (1.0 - c) * v
        } else if c < 0.0 {
            v * (1.0 + c)
        } else {
            v
        }
    };
    ((32.99 * v) as i32).clamp(BLACK as i32, WHITE as i32) as usize
}

/// Camera, light and scratch space for drawing shapes.
///
/// The scratch buffers only ever grow, to the largest shape drawn so far.
pub struct Scene {
    camera: Xform,
    light: Vec3,
    center_x: f32,
    center_y: f32,
    /// Pixels per unit at z = 1
    scale: f32,
    viewport_width: f32,
    viewport_height: f32,
    points: Vec<Vec3>,
    faces: Vec<FaceInstance>,
    order: Vec<usize>,
}

impl Scene {
    /// Scene for a `width` x `height` viewport, camera at the origin looking
    /// down +z, light straight from above
    pub fn new(width: usize, height: usize) -> Self {
        let mut scene = Self {
            camera: Xform::IDENTITY,
            light: Vec3::ZERO,
            center_x: 0.5,
            center_y: 0.5,
            scale: height as f32,
            viewport_width: width as f32,
            viewport_height: height as f32,
            points: Vec::new(),
            faces: Vec::new(),
            order: Vec::new(),
        };
        scene.set_camera(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            1.0,
            Vec3::new(0.0, 1.0, 0.0),
        );
        scene.set_global_light(Vec3::new(0.0, -1.0, 0.0));
        scene
    }

    /// Aim the camera from `origin` at `look_at`.
    ///
    /// Translation first, then yaw about y to zero the view direction's x,
    /// pitch to its elevation, and finally roll so `up` (its x/y part) maps
    /// to screen vertical. A `up` with no x/y component skips the roll.
    pub fn set_camera(&mut self, origin: Vec3, look_at: Vec3, scale: f32, up: Vec3) {
        let mut camera = Xform::translate(-origin.x, -origin.y, -origin.z);
        let dir = (look_at - origin).normalize();

        self.scale = self.viewport_height * scale;

        let mut h = 0.0;
        if dir.x != 0.0 || dir.z != 0.0 {
            h = (dir.x * dir.x + dir.z * dir.z).sqrt();
            let yaw = Xform::from_rows(
                [dir.z / h, 0.0, -dir.x / h],
                [0.0, 1.0, 0.0],
                [dir.x / h, 0.0, dir.z / h],
            );
            camera = yaw * camera;
        }

        let pitch = Xform::from_rows([1.0, 0.0, 0.0], [0.0, h, -dir.y], [0.0, dir.y, h]);
        camera = pitch * camera;

        if up.x != 0.0 || up.y != 0.0 {
            let l = (up.x * up.x + up.y * up.y).sqrt();
            let roll = Xform::from_rows(
                [up.y / l, up.x / l, 0.0],
                [-up.x / l, up.y / l, 0.0],
                [0.0, 0.0, 1.0],
            );
            camera = roll * camera;
        }

        self.camera = camera;
    }

    pub fn set_global_light(&mut self, direction: Vec3) {
        self.light = direction;
    }

    /// Screen position of the vanishing point: (0, 0) top left, (1, 1)
    /// bottom right
    pub fn set_center(&mut self, x: f32, y: f32) {
        self.center_x = x;
        self.center_y = y;
    }

    pub fn camera(&self) -> &Xform {
        &self.camera
    }

    pub fn light(&self) -> Vec3 {
        self.light
    }

    /// Current scratch sizes: (points, faces)
    pub fn scratch_capacity(&self) -> (usize, usize) {
        (self.points.len(), self.faces.len())
    }

    fn reserve(&mut self, points: usize, faces: usize) {
        if self.points.len() < points {
            self.points.resize(points, Vec3::ZERO);
        }
        if self.faces.len() < faces {
            self.faces.resize(faces, FaceInstance::default());
            self.order.resize(faces, 0);
        }
    }

    /// Camera-space z of a shape's bounding-box center after `world`
    pub fn shape_depth(&self, shape: &Shape<'_>, world: &Xform) -> f32 {
        self.camera.apply(world.apply(shape.center())).z
    }

    /// Project a camera-space point (z > 0) to screen coordinates
    #[inline]
    fn project(&self, p: Vec3) -> Vec3 {
        let aspect = self.viewport_width / self.viewport_height;
        Vec3::new(
            self.scale * (p.x / p.z + aspect * self.center_x),
            self.scale * (p.y / p.z + self.center_y),
            p.z,
        )
    }

    /// Transform, sort back to front and draw every face of `shape`.
    ///
    /// Faces touching a point at or behind the camera plane, lying entirely
    /// off one side of the screen, or facing away are skipped and counted.
    pub fn draw_shape(
        &mut self,
        fb: &mut FrameBuffer,
        shape: &Shape<'_>,
        world: &Xform,
        style: RenderStyle,
        color_bias: f32,
    ) -> DrawStats {
        let n_points = shape.points().len();
        let n_faces = shape.faces().len();
        self.reserve(n_points, n_faces);

        let xform = self.camera * *world;
        let inverted = xform.determinant() < 0.0;

        for (dst, &p) in self.points.iter_mut().zip(shape.points()) {
            *dst = xform.apply(p);
        }

        for (i, [a, b, c]) in shape.faces().iter().copied().enumerate() {
            let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
            self.faces[i] = FaceInstance {
                normal: Vec3::tri_normal(&pa, &pb, &pc),
                depth: pa.z + pb.z + pc.z,
            };
            self.order[i] = i;
        }

        for i in 0..n_points {
            let p = self.points[i];
            if p.z > 0.0 {
                self.points[i] = self.project(p);
            }
        }

        let faces = &self.faces;
        self.order[..n_faces].sort_unstable_by(|&a, &b| faces[b].depth.total_cmp(&faces[a].depth));

        let width = fb.width() as f32;
        let height = fb.height() as f32;
        let mut stats = DrawStats::default();

        for &fi in &self.order[..n_faces] {
            let [a, b, c] = shape.faces()[fi];
            let (p1, p2, p3) = (&self.points[a], &self.points[b], &self.points[c]);

            if p1.z <= 0.0 || p2.z <= 0.0 || p3.z <= 0.0 {
                stats.culled_behind += 1;
                continue;
            }

            let xs = [p1.x, p2.x, p3.x];
            let ys = [p1.y, p2.y, p3.y];
            if xs.iter().all(|&x| x < 0.0)
                || xs.iter().all(|&x| x >= width)
                || ys.iter().all(|&y| y < 0.0)
                || ys.iter().all(|&y| y >= height)
            {
                stats.culled_offscreen += 1;
                continue;
            }

            let d = (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x);
            if (d >= 0.0) != inverted {
                stats.culled_backface += 1;
                continue;
            }

            if style.filled {
                let level = shade_level(self.faces[fi].normal, self.light, color_bias, inverted);
                fill_triangle(fb, p1, p2, p3, &PATTERNS[level]);
            }
            if style.wireframe {
                let ink = &PATTERNS[BLACK];
                draw_line(fb, p1, p2, 1, ink);
                draw_line(fb, p2, p3, 1, ink);
                draw_line(fb, p3, p1, 1, ink);
            }
            stats.drawn += 1;
        }

        log::trace!("draw_shape: {:?}", stats);
        stats
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mini3d::shape::Mesh;

    const EPS: f32 = 1e-4;

    /// Front-facing right triangle at z = 4, normal (0, 0, -1).
    /// Projects to (260, 60), (140, 60), (140, 180).
    fn facing_triangle() -> ([Vec3; 3], [[usize; 3]; 1]) {
        (
            [
                Vec3::new(1.0, -1.0, 4.0),
                Vec3::new(-1.0, -1.0, 4.0),
                Vec3::new(-1.0, 1.0, 4.0),
            ],
            [[0, 1, 2]],
        )
    }

    #[test]
    fn test_default_camera_is_identity() {
        let scene = Scene::default();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(scene.camera().apply(p).approx_eq(&p, EPS));
    }

    #[test]
    fn test_camera_looks_at_target() {
        let mut scene = Scene::default();
        let origin = Vec3::new(8.0, 3.0, 0.0);
        scene.set_camera(origin, Vec3::ZERO, 1.0, Vec3::new(0.0, -1.0, 0.0));
        let target = scene.camera().apply(Vec3::ZERO);
        assert!(target.x.abs() < EPS && target.y.abs() < EPS, "{:?}", target);
        assert!((target.z - origin.length()).abs() < EPS);
        assert!(scene.camera().apply(origin).approx_eq(&Vec3::ZERO, EPS));
    }

    #[test]
    fn test_camera_up_parallel_to_view_skips_roll() {
        let mut scene = Scene::default();
        scene.set_camera(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 5.0),
            1.0,
            Vec3::new(0.0, 0.0, 1.0),
        );
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(scene.camera().apply(p).approx_eq(&p, EPS));
    }

    #[test]
    fn test_shade_level_extremes() {
        let n = Vec3::new(0.0, 0.0, -1.0);
        assert_eq!(shade_level(n, Vec3::new(0.0, 0.0, 1.0), 0.0, false), WHITE);
        assert_eq!(shade_level(n, Vec3::new(0.0, 0.0, -1.0), 0.0, false), BLACK);
        assert_eq!(shade_level(n, Vec3::new(1.0, 0.0, 0.0), 0.0, false), 16);
        assert_eq!(shade_level(n, Vec3::new(0.0, 0.0, -1.0), 0.5, false), 16);
        assert_eq!(shade_level(n, Vec3::new(0.0, 0.0, 1.0), -0.5, false), 16);
        assert_eq!(shade_level(n, Vec3::ZERO, 1.5, false), WHITE);
        assert_eq!(shade_level(n, Vec3::ZERO, -1.0, false), BLACK);
        assert_eq!(shade_level(n, Vec3::new(0.0, 0.0, -1.0), 0.0, true), WHITE);
    }

    #[test]
    fn test_face_opposite_light_is_white() {
        let (points, faces) = facing_triangle();
        let shape = Shape::new(&points, &faces).expect("valid shape");
        let mut scene = Scene::default();
        scene.set_global_light(Vec3::new(0.0, 0.0, 1.0));
        let mut fb = FrameBuffer::new();
        fb.clear(false);
        let stats = scene.draw_shape(&mut fb, &shape, &Xform::IDENTITY, RenderStyle::FILLED, 0.0);
        assert_eq!(stats.drawn, 1);
        assert_eq!(fb.pixel(170, 100), Some(true));
        assert_eq!(fb.pixel(300, 200), Some(false));
    }

    #[test]
    fn test_face_along_light_is_black() {
        let (points, faces) = facing_triangle();
        let shape = Shape::new(&points, &faces).expect("valid shape");
        let mut scene = Scene::default();
        scene.set_global_light(Vec3::new(0.0, 0.0, -1.0));
        let mut fb = FrameBuffer::new();
        scene.draw_shape(&mut fb, &shape, &Xform::IDENTITY, RenderStyle::FILLED, 0.0);
        assert_eq!(fb.pixel(170, 100), Some(false));
        assert_eq!(fb.pixel(300, 200), Some(true));
    }

    #[test]
    fn test_vertex_on_camera_plane_draws_nothing() {
        let points = [
            Vec3::new(1.0, -1.0, 4.0),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 4.0),
        ];
        let faces = [[0, 1, 2]];
        let shape = Shape::new(&points, &faces).expect("valid shape");
        let mut scene = Scene::default();
        let mut fb = FrameBuffer::new();
        let stats = scene.draw_shape(
            &mut fb,
            &shape,
            &Xform::IDENTITY,
            RenderStyle::FILLED_WIREFRAME,
            -1.0,
        );
        assert_eq!(stats.culled_behind, 1);
        assert_eq!(stats.drawn, 0);
        assert_eq!(fb.count_black(), 0);
    }

    #[test]
    fn test_cube_draws_only_front_faces() {
        let cube = Mesh::cube(2.0);
        let mut scene = Scene::default();
        let mut fb = FrameBuffer::new();
        let stats = scene.draw_shape(
            &mut fb,
            &cube.shape(),
            &Xform::translate(0.0, 0.0, 5.0),
            RenderStyle::FILLED,
            -1.0,
        );
        // Only the -z face points at a camera on the axis
        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.culled_backface, 10);
        assert_eq!(stats.total(), 12);
        // The near face projects to the square [140, 260] x [60, 180]
        assert_eq!(fb.pixel(200, 120), Some(false));
        assert_eq!(fb.pixel(130, 120), Some(true));
        assert_eq!(fb.pixel(200, 50), Some(true));
    }

    #[test]
    fn test_mirrored_world_flips_culling() {
        let cube = Mesh::cube(2.0);
        let mut scene = Scene::default();
        let mut fb = FrameBuffer::new();
        let mirror = Xform::from_rows([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0])
            .with_translation(Vec3::new(0.0, 0.0, 5.0));
        let stats = scene.draw_shape(&mut fb, &cube.shape(), &mirror, RenderStyle::FILLED, -1.0);
        assert_eq!(stats.drawn, 2);
        assert_eq!(fb.pixel(200, 120), Some(false));
    }

    #[test]
    fn test_offscreen_faces_are_rejected() {
        let cube = Mesh::cube(2.0);
        let mut scene = Scene::default();
        let mut fb = FrameBuffer::new();
        let stats = scene.draw_shape(
            &mut fb,
            &cube.shape(),
            &Xform::translate(40.0, 0.0, 5.0),
            RenderStyle::FILLED_WIREFRAME,
            0.0,
        );
        assert_eq!(stats.drawn, 0);
        assert_eq!(stats.culled_offscreen, 12);
        assert_eq!(fb.count_black(), 0);
    }

    #[test]
    fn test_wireframe_only_outlines() {
        let (points, faces) = facing_triangle();
        let shape = Shape::new(&points, &faces).expect("valid shape");
        let mut scene = Scene::default();
        let mut fb = FrameBuffer::new();
        scene.draw_shape(&mut fb, &shape, &Xform::IDENTITY, RenderStyle::WIREFRAME, 0.0);
        assert_eq!(fb.pixel(170, 100), Some(true));
        assert_eq!(fb.pixel(140, 120), Some(false));
        assert_eq!(fb.pixel(200, 60), Some(false));
    }

    #[test]
    fn test_scratch_grows_monotonically() {
        let mut scene = Scene::default();
        let mut fb = FrameBuffer::new();
        let world = Xform::translate(0.0, 0.0, 6.0);

        let ico = Mesh::icosahedron(1.0);
        scene.draw_shape(&mut fb, &ico.shape(), &world, RenderStyle::FILLED, 0.0);
        assert_eq!(scene.scratch_capacity(), (12, 20));

        let cube = Mesh::cube(1.0);
        scene.draw_shape(&mut fb, &cube.shape(), &world, RenderStyle::FILLED, 0.0);
        assert_eq!(scene.scratch_capacity(), (12, 20));

        let plane = Mesh::plane_ship();
        scene.draw_shape(&mut fb, &plane.shape(), &world, RenderStyle::FILLED, 0.0);
        assert_eq!(scene.scratch_capacity(), (28, 52));
    }

    #[test]
    fn test_shape_depth_uses_center() {
        let cube = Mesh::cube(2.0);
        let scene = Scene::default();
        let depth = scene.shape_depth(&cube.shape(), &Xform::translate(0.0, 1.0, 7.0));
        assert!((depth - 7.0).abs() < EPS);
    }

    #[test]
    fn test_vanishing_point_moves_image() {
        let (points, faces) = facing_triangle();
        let shape = Shape::new(&points, &faces).expect("valid shape");
        let mut scene = Scene::default();
        scene.set_center(0.25, 0.5);
        let mut fb = FrameBuffer::new();
        scene.draw_shape(&mut fb, &shape, &Xform::IDENTITY, RenderStyle::FILLED, -1.0);
        // Shifted left by 0.25 * 1.6667 * 240 = 100 pixels
        assert_eq!(fb.pixel(70, 100), Some(false));
        assert_eq!(fb.pixel(170, 100), Some(true));
    }
}
