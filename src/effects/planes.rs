use super::Effect;
use crate::dither::Screen;
use crate::math3d::{Vec3, Xform};
use crate::mini3d::{DrawStats, Mesh, RenderStyle, Scene};
use crate::timeline::{Buttons, FrameContext};
use crate::util::Rng;

const MAX_PLANES: usize = 500;
const DEFAULT_PLANES: usize = 100;
const ORBIT_RADIUS: f32 = 8.0;
const ORBIT_HEIGHT: f32 = 3.0;

/// A swarm of flat-shaded planes around an orbiting camera.
/// Left/right (held) change the number of planes.
pub struct Planes {
    scene: Scene,
    mesh: Mesh,
    count: usize,
    xforms: Vec<Xform>,
    /// (camera-space depth, plane index)
    order: Vec<(f32, usize)>,
}

impl Planes {
    pub fn new() -> Self {
        let mut scene = Scene::default();
        scene.set_global_light(Vec3::new(0.3, 1.0, 0.3));
        Self {
            scene,
            mesh: Mesh::plane_ship(),
            count: DEFAULT_PLANES,
            xforms: Vec::with_capacity(MAX_PLANES),
            order: Vec::with_capacity(MAX_PLANES),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// World transforms for the first `count` planes. The layout is the same
    /// every frame: plane 0 sits unrotated at the origin, the rest are
    /// scattered by a fixed-seed generator.
    fn place(&mut self) {
        fn centered(rng: &mut Rng, mask: u32) -> f32 {
            (rng.next_u32() & mask) as f32 - mask as f32 / 2.0
        }

        let mut rng = Rng::new(1);
        self.xforms.clear();
        for i in 0..self.count {
            let x = centered(&mut rng, 63);
            let y = centered(&mut rng, 15);
            let z = centered(&mut rng, 63);
            let degrees = rng.next_u32() % 360;
            let axis = Vec3::new(centered(&mut rng, 63), 60.0, centered(&mut rng, 63));
            let xform = if i == 0 {
                Xform::IDENTITY
            } else {
                Xform::axis_angle((degrees as f32).to_radians(), axis)
                    .with_translation(Vec3::new(x, y, z))
            };
            self.xforms.push(xform);
        }
    }
}

impl Default for Planes {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Planes {
    fn name(&self) -> &str {
        "Planes"
    }

    fn update(&mut self, frame: &FrameContext, screen: &mut Screen) -> i32 {
        if frame.buttons_down.contains(Buttons::LEFT) {
            self.count = (self.count - 1).max(1);
        }
        if frame.buttons_down.contains(Buttons::RIGHT) {
            self.count = (self.count + 1).min(MAX_PLANES);
        }

        let (sin, cos) = frame.crank.sin_cos();
        self.scene.set_camera(
            Vec3::new(cos * ORBIT_RADIUS, ORBIT_HEIGHT, sin * ORBIT_RADIUS),
            Vec3::ZERO,
            1.0,
            Vec3::new(0.0, -1.0, 0.0),
        );

        self.place();

        let shape = self.mesh.shape();
        self.order.clear();
        for (i, xform) in self.xforms.iter().enumerate() {
            self.order.push((self.scene.shape_depth(&shape, xform), i));
        }
        // Farthest first
        self.order.sort_by(|a, b| b.0.total_cmp(&a.0));

        screen.frame.clear(true);
        let mut stats = DrawStats::default();
        for &(_, i) in &self.order {
            stats += self.scene.draw_shape(
                &mut screen.frame,
                &shape,
                &self.xforms[i],
                RenderStyle::FILLED_WIREFRAME,
                0.0,
            );
        }
        log::trace!("planes: {} {:?}", self.count, stats);

        self.count as i32
    }

    fn reset(&mut self) {
        self.count = DEFAULT_PLANES;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing;

    fn hold(buttons: Buttons) -> FrameContext {
        FrameContext {
            buttons_down: buttons,
            ..FrameContext::default()
        }
    }

    #[test]
    fn test_count_follows_held_buttons() {
        let mut planes = Planes::new();
        let mut screen = testing::screen();
        assert_eq!(planes.update(&hold(Buttons::RIGHT), &mut screen), 101);
        assert_eq!(planes.update(&hold(Buttons::LEFT), &mut screen), 100);
        // Both held: net zero
        assert_eq!(planes.update(&hold(Buttons::LEFT | Buttons::RIGHT), &mut screen), 100);
    }

    #[test]
    fn test_count_is_clamped() {
        let mut planes = Planes::new();
        let mut screen = testing::screen();
        planes.count = 1;
        assert_eq!(planes.update(&hold(Buttons::LEFT), &mut screen), 1);
        planes.count = MAX_PLANES;
        assert_eq!(planes.update(&hold(Buttons::RIGHT), &mut screen), MAX_PLANES as i32);
        planes.reset();
        assert_eq!(planes.count(), DEFAULT_PLANES);
    }

    #[test]
    fn test_layout_is_stable() {
        let mut planes = Planes::new();
        planes.place();
        let first = planes.xforms.clone();
        planes.place();
        assert_eq!(first, planes.xforms);
        assert_eq!(first.len(), DEFAULT_PLANES);
        assert_eq!(first[0], Xform::IDENTITY);
        for xform in &first[1..] {
            assert!(xform.t.x.abs() <= 31.5 && xform.t.y.abs() <= 7.5 && xform.t.z.abs() <= 31.5);
            // Pure rotations
            assert!((xform.determinant() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_draws_on_white() {
        let mut planes = Planes::new();
        let mut screen = testing::screen();
        screen.frame.clear(false);
        planes.update(&FrameContext::default(), &mut screen);
        let black = screen.frame.count_black();
        // Background is cleared to white, the swarm covers part of it
        assert!(black > 0);
        assert!(black < 400 * 240);
    }
}
