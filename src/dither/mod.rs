//! Intensity-to-1-bit dither pipeline
//!
//! Effects write 8-bit intensities into an `IntensityBuffer`; the driver here
//! compares each pixel against a static per-pixel threshold from the
//! `NoiseField` and packs the result into the framebuffer, 8 pixels per byte.
//! A global bias shifts the whole frame darker (positive) or lighter
//! (negative) without touching the thresholds.

pub mod intensity;
pub mod noise_field;
pub mod temporal;

pub use intensity::IntensityBuffer;
pub use noise_field::{NoiseField, NoiseFieldError};
pub use temporal::{OrderedPattern, ALL_PATTERNS};

use crate::display::framebuffer::FrameBuffer;
use crate::math3d::lerp;

/// Quantize one pixel: 0 (black) when `intensity <= threshold + bias`,
/// otherwise 1 (white)
#[inline]
pub fn quantize(intensity: u8, threshold: u8, bias: i32) -> u8 {
    if intensity as i32 <= threshold as i32 + bias {
        0
    } else {
        1
    }
}

/// Quantize a row of intensities and pack it MSB-first into `out`.
///
/// `out` needs `ceil(values.len() / 8)` bytes. Unused low bits of a trailing
/// partial byte are left white.
pub fn pack_row(values: &[u8], noise: &[u8], bias: i32, out: &mut [u8]) {
    debug_assert!(noise.len() >= values.len());
    for ((byte, vals), thresholds) in out
        .iter_mut()
        .zip(values.chunks(8))
        .zip(noise.chunks(8))
    {
        let mut bits = 0xFFu8;
        for (i, (&v, &n)) in vals.iter().zip(thresholds).enumerate() {
            if quantize(v, n, bias) == 0 {
                bits &= !(0x80 >> i);
            }
        }
        *byte = bits;
    }
}

/// Dither one row of intensities into framebuffer row `y`
#[inline]
pub fn draw_dithered_scanline(
    fb: &mut FrameBuffer,
    noise: &NoiseField,
    y: usize,
    values: &[u8],
    bias: i32,
) {
    let bytes = values.len().div_ceil(8);
    pack_row(values, noise.row(y), bias, &mut fb.row_mut(y)[..bytes]);
}

/// Dither a full-resolution intensity buffer into the framebuffer
pub fn draw_dithered_screen(
    fb: &mut FrameBuffer,
    buffer: &IntensityBuffer,
    noise: &NoiseField,
    bias: i32,
) {
    debug_assert_eq!(fb.width(), buffer.width());
    for y in 0..fb.height().min(buffer.height()) {
        draw_dithered_scanline(fb, noise, y, buffer.row(y), bias);
    }
}

/// How half-resolution samples are expanded to full resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpscaleFilter {
    /// Replicate each sample into its 2x2 block
    #[default]
    Nearest,
    /// Interpolate the missing column and row of each block
    Smooth,
}

/// Expand the `w/2 x h/2` samples packed at the start of `buffer` to full
/// resolution, handing each output row to `emit(y, row)` in order.
///
/// `Smooth` widens the rows in place (bottom to top, right to left so no
/// sample is overwritten before it is read), so the buffer contents are
/// consumed by the call.
pub fn upscale_2x2(
    buffer: &mut IntensityBuffer,
    filter: UpscaleFilter,
    mut emit: impl FnMut(usize, &[u8]),
) {
    let width = buffer.width();
    let height = buffer.height();
    let (half_w, half_h) = (width / 2, height / 2);
    let mut line = vec![0u8; width];

    match filter {
        UpscaleFilter::Nearest => {
            for y in 0..half_h {
                for (pair, &v) in line.chunks_exact_mut(2).zip(buffer.half_row(y)) {
                    pair[0] = v;
                    pair[1] = v;
                }
                emit(y * 2, &line);
                emit(y * 2 + 1, &line);
            }
        },
        UpscaleFilter::Smooth => {
            let values = buffer.as_mut_slice();
            for y in (0..half_h).rev() {
                let src = y * half_w;
                let dst = y * width;
                for x in (0..half_w).rev() {
                    let prev = values[src + x.saturating_sub(1)] as u16;
                    let curr = values[src + x];
                    values[dst + x * 2] = ((prev + curr as u16) >> 1) as u8;
                    values[dst + x * 2 + 1] = curr;
                }
            }

            for y in 0..half_h {
                let row = &values[y * width..(y + 1) * width];
                emit(y * 2, row);
                if y * 2 + 2 >= height {
                    // No row below to blend with
                    emit(y * 2 + 1, row);
                } else {
                    let below = &values[(y + 1) * width..(y + 2) * width];
                    for ((out, &a), &b) in line.iter_mut().zip(row).zip(below) {
                        *out = ((a as u16 + b as u16) >> 1) as u8;
                    }
                    emit(y * 2 + 1, &line);
                }
            }
        },
    }
}

/// Dither a half-resolution buffer, expanded 2x2, into the framebuffer
pub fn draw_dithered_screen_2x2(
    fb: &mut FrameBuffer,
    buffer: &mut IntensityBuffer,
    noise: &NoiseField,
    filter: UpscaleFilter,
    bias: i32,
) {
    upscale_2x2(buffer, filter, |y, row| {
        draw_dithered_scanline(fb, noise, y, row, bias);
    });
}

/// Section fade curve: from -250 up to 0 over the first `fade` beats after
/// `start`, then 0 down to -250 over the last `fade` beats before `end`.
/// Never positive.
pub fn fade_bias(time: f32, start: f32, end: f32, fade: f32) -> i32 {
    let mut bias = 0.0;
    if time < start + fade {
        bias = lerp(-250.0, 0.0, (time - start) / fade);
    }
    if time > end - fade {
        bias = lerp(0.0, -250.0, (time - (end - fade)) / fade);
    }
    (bias as i32).min(0)
}

// ============================================================================
// Screen
// ============================================================================

/// Everything an effect draws into: the packed framebuffer, the full-size
/// intensity buffer, a half-resolution accumulation buffer for temporal
/// effects, and the threshold field.
pub struct Screen {
    pub frame: FrameBuffer,
    pub intensity: IntensityBuffer,
    /// `w/2 x h/2`, persists across frames
    pub half: IntensityBuffer,
    noise: NoiseField,
}

impl Screen {
    /// Native-size screen; the noise field must match it
    pub fn new(noise: NoiseField) -> Result<Self, NoiseFieldError> {
        Self::with_frame(FrameBuffer::new(), noise)
    }

    pub fn with_frame(frame: FrameBuffer, noise: NoiseField) -> Result<Self, NoiseFieldError> {
        noise.ensure_size(frame.width(), frame.height())?;
        let (w, h) = (frame.width(), frame.height());
        Ok(Self {
            frame,
            intensity: IntensityBuffer::new(w, h),
            half: IntensityBuffer::new(w / 2, h / 2),
            noise,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Dither the full-resolution intensity buffer
    pub fn present(&mut self, bias: i32) {
        draw_dithered_screen(&mut self.frame, &self.intensity, &self.noise, bias);
    }

    /// Dither the half-resolution samples at the start of the intensity buffer
    pub fn present_2x2(&mut self, filter: UpscaleFilter, bias: i32) {
        draw_dithered_screen_2x2(
            &mut self.frame,
            &mut self.intensity,
            &self.noise,
            filter,
            bias,
        );
    }

    /// Expand the persistent half-resolution accumulation buffer
    pub fn present_half_accumulated(&mut self, filter: UpscaleFilter, bias: i32) {
        self.intensity.load_half(&self.half);
        self.present_2x2(filter, bias);
    }
}
