use super::Effect;
use crate::dither::Screen;
use crate::timeline::FrameContext;
use crate::util::Rng;

const NUM_STARS: usize = 300;
const FAR_Z: f32 = 600.0;
const NEAR_Z: f32 = 100.0;
/// Depth units per beat
const SPEED: f32 = 100.0;
const MAX_TRAIL_LEN: f32 = 20.0;

struct Star {
    x: f32,
    y: f32,
    z: f32,
}

/// Classic 3D starfield, plotted straight into the framebuffer. Distant stars
/// are dithered out against the threshold field so they fade in as they
/// approach.
pub struct Starfield {
    stars: Vec<Star>,
    rng: Rng,
}

impl Starfield {
    pub fn new() -> Self {
        let mut rng = Rng::new(12345);
        let stars = (0..NUM_STARS).map(|_| Self::random_star(&mut rng)).collect();
        Self { stars, rng }
    }

    fn random_star(rng: &mut Rng) -> Star {
        Star {
            x: (rng.next_f32() - 0.5) * 1000.0,
            y: (rng.next_f32() - 0.5) * 1000.0,
            z: rng.range_f32(NEAR_Z, FAR_Z),
        }
    }
}

impl Default for Starfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Starfield {
    fn name(&self) -> &str {
        "Starfield"
    }

    fn update(&mut self, frame: &FrameContext, screen: &mut Screen) -> i32 {
        let dt = (frame.time - frame.prev_time).max(0.0);
        for star in &mut self.stars {
            star.z -= SPEED * dt;
            // Reset stars that pass the camera
            if star.z <= 1.0 {
                *star = Self::random_star(&mut self.rng);
                star.z = FAR_Z;
            }
        }

        let width = screen.width();
        let height = screen.height();
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;
        let fov = 256.0 * height as f32 / 480.0;
        let max_trail = MAX_TRAIL_LEN * height as f32 / 480.0;
        // The section fade dims every star the same way it lightens dithered effects
        let fade = 255 + frame.fade_bias;

        screen.frame.clear(false);
        let mut visible = 0;
        for star in &self.stars {
            let sx = (star.x / star.z) * fov + center_x;
            let sy = (star.y / star.z) * fov + center_y;
            if sx < 0.0 || sy < 0.0 || sx >= width as f32 || sy >= height as f32 {
                continue;
            }
            let (px, py) = (sx as usize, sy as usize);

            let closeness = (1.0 - star.z / FAR_Z).clamp(0.0, 1.0);
            let brightness = (closeness * fade as f32) as i32;
            if brightness <= screen.noise().row(py)[px] as i32 {
                continue;
            }
            visible += 1;

            // Trail points back toward the center
            let trail_len = (closeness * max_trail).ceil() as i32;
            let (dx, dy) = ((sx - center_x) / star.z, (sy - center_y) / star.z);
            for i in 1..=trail_len {
                let fade = 1.0 - i as f32 / (trail_len as f32 + 1.0);
                let tx = sx - dx * i as f32;
                let ty = sy - dy * i as f32;
                if fade * brightness as f32 > screen.noise().row(py)[px] as f32 {
                    screen.frame.set_pixel(tx as i32, ty as i32, true);
                }
            }

            if star.z < NEAR_Z {
                // Small cross for near stars
                let (x, y) = (px as i32, py as i32);
                screen.frame.draw_span(y, x - 1, x + 2, 0xFF);
                screen.frame.set_pixel(x, y - 1, true);
                screen.frame.set_pixel(x, y + 1, true);
            } else {
                screen.frame.set_pixel(px as i32, py as i32, true);
            }
        }

        visible
    }

    fn reset(&mut self) {
        self.rng = Rng::new(12345);
        for star in &mut self.stars {
            *star = Self::random_star(&mut self.rng);
        }
    }
}
