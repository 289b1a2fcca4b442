use super::Effect;
use crate::dither::Screen;
use crate::timeline::FrameContext;
use crate::util::Rng;

const TABLE_SIZE: usize = 512;
const TABLE_MASK: usize = TABLE_SIZE - 1;
const TABLE_SCALE: f32 = 1024.0;

/// Classic sum-of-sines plasma, dithered at full resolution. The whole frame
/// flashes lighter or darker on every beat.
pub struct Plasma {
    sin_table: Vec<i32>,
    pos1: usize,
    pos2: usize,
    pos3: usize,
    pos4: usize,
    bias: i32,
    rng: Rng,
}

impl Plasma {
    pub fn new() -> Self {
        // Integer sine table, one full period
        let sin_table = (0..TABLE_SIZE)
            .map(|i| ((i as f32 * std::f32::consts::TAU / TABLE_SIZE as f32).sin() * TABLE_SCALE) as i32)
            .collect();

        Self {
            sin_table,
            pos1: 0,
            pos2: 0,
            pos3: 0,
            pos4: 0,
            bias: 0,
            rng: Rng::new(1),
        }
    }

    /// Current beat flash bias
    pub fn bias(&self) -> i32 {
        self.bias
    }
}

impl Default for Plasma {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Plasma {
    fn name(&self) -> &str {
        "Plasma"
    }

    fn update(&mut self, frame: &FrameContext, screen: &mut Screen) -> i32 {
        let width = screen.width();
        let mut tpos3 = self.pos3;
        let mut tpos4 = self.pos4;

        for y in 0..screen.height() {
            let mut tpos1 = self.pos1 + 5;
            let mut tpos2 = self.pos2 + 3;
            tpos3 &= TABLE_MASK;
            tpos4 &= TABLE_MASK;

            let row = screen.intensity.row_mut(y);
            for pixel in row.iter_mut().take(width) {
                tpos1 &= TABLE_MASK;
                tpos2 &= TABLE_MASK;
                let sum = self.sin_table[tpos1]
                    + self.sin_table[tpos2]
                    + self.sin_table[tpos3]
                    + self.sin_table[tpos4];
                // Wraps on purpose: the bands come from the overflow
                *pixel = (sum >> 3) as u8;
                tpos1 += 5;
                tpos2 += 3;
            }

            tpos4 += 3;
            tpos3 += 1;
        }

        self.pos1 = (self.pos1 + 7) & TABLE_MASK;
        self.pos3 = (self.pos3 + 3) & TABLE_MASK;

        if frame.beat {
            self.bias = (self.rng.next_u32() & 255) as i32 - 128;
        }

        let bias = self.bias + frame.fade_bias;
        screen.present(bias);
        bias
    }

    fn reset(&mut self) {
        self.pos1 = 0;
        self.pos3 = 0;
        self.bias = 0;
    }
}
