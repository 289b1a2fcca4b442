//! Per-pixel dither thresholds
//!
//! A `NoiseField` holds one 8-bit threshold per screen pixel. It is built once
//! at startup, either from a grayscale image (the usual blue-noise texture) or
//! from one of the procedural generators below, and is read-only afterwards.

use std::path::Path;

use thiserror::Error;

use crate::math3d::fract;
use crate::util::Rng;

#[derive(Error, Debug)]
pub enum NoiseFieldError {
    #[error("failed to load noise image: {0}")]
    Image(#[from] image::ImageError),
    #[error("noise field is {actual_width}x{actual_height}, screen is {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error("raw noise data has {actual} bytes, expected {expected}")]
    RawLength { expected: usize, actual: usize },
}

/// Static threshold grid, same dimensions as the screen
#[derive(Debug, Clone)]
pub struct NoiseField {
    width: usize,
    height: usize,
    values: Vec<u8>,
}

impl NoiseField {
    /// Wrap raw row-major thresholds
    pub fn from_raw(width: usize, height: usize, values: Vec<u8>) -> Result<Self, NoiseFieldError> {
        if values.len() != width * height {
            return Err(NoiseFieldError::RawLength {
                expected: width * height,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Load a grayscale threshold image (TGA, PNG or BMP).
    ///
    /// The image must match the requested dimensions exactly.
    pub fn from_image(
        path: impl AsRef<Path>,
        width: usize,
        height: usize,
    ) -> Result<Self, NoiseFieldError> {
        let path = path.as_ref();
        let luma = image::open(path)?.to_luma8();
        let (actual_width, actual_height) = (luma.width() as usize, luma.height() as usize);
        if actual_width != width || actual_height != height {
            return Err(NoiseFieldError::DimensionMismatch {
                width,
                height,
                actual_width,
                actual_height,
            });
        }
        log::info!(
            "loaded noise field {} ({}x{})",
            path.display(),
            actual_width,
            actual_height
        );
        Self::from_raw(width, height, luma.into_raw())
    }

    /// Classic 16x16 Bayer matrix, tiled. Each tile holds every value 0..=255 once.
    pub fn bayer(width: usize, height: usize) -> Self {
        Self::generate(width, height, |x, y| bayer16(x, y))
    }

    /// Interleaved gradient noise: low-discrepancy without visible tiling
    pub fn interleaved_gradient(width: usize, height: usize) -> Self {
        Self::generate(width, height, |x, y| {
            let v = fract(52.982_918_9 * fract(0.067_110_56 * x as f32 + 0.005_837_15 * y as f32));
            (v * 256.0).min(255.0) as u8
        })
    }

    /// Uniform white noise from a seed
    pub fn white(width: usize, height: usize, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        Self::generate(width, height, |_, _| rng.next_u8())
    }

    fn generate(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Thresholds for screen row `y`
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.values[y * self.width..(y + 1) * self.width]
    }

    /// Fail unless the field covers exactly `width` x `height`
    pub fn ensure_size(&self, width: usize, height: usize) -> Result<(), NoiseFieldError> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(NoiseFieldError::DimensionMismatch {
                width,
                height,
                actual_width: self.width,
                actual_height: self.height,
            })
        }
    }

    /// Mean threshold; ~127.5 for a well-behaved field
    pub fn mean(&self) -> f32 {
        self.values.iter().map(|&v| v as f32).sum::<f32>() / self.values.len().max(1) as f32
    }
}

/// Bayer threshold for a 16x16 tile: bit-interleave (x ^ y, x), reversed
fn bayer16(x: usize, y: usize) -> u8 {
    let (x, y) = (x & 15, y & 15);
    let a = x ^ y;
    let mut v = 0usize;
    for bit in 0..4 {
        v = (v << 1) | ((a >> bit) & 1);
        v = (v << 1) | ((x >> bit) & 1);
    }
    v as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bayer_tile_is_permutation() {
        let field = NoiseField::bayer(16, 16);
        let mut seen = [false; 256];
        for y in 0..16 {
            for &v in field.row(y) {
                assert!(!seen[v as usize], "duplicate threshold {}", v);
                seen[v as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_bayer_tiles_repeat() {
        let field = NoiseField::bayer(48, 32);
        assert_eq!(field.row(3)[5], field.row(19)[37]);
    }

    #[test]
    fn test_interleaved_gradient_is_unbiased() {
        let field = NoiseField::interleaved_gradient(400, 240);
        let mean = field.mean();
        assert!((mean - 127.5).abs() < 6.0, "mean {}", mean);

        // No large-scale bias: every 40x40 tile averages near the middle
        for ty in 0..6 {
            for tx in 0..10 {
                let mut sum = 0u32;
                for y in ty * 40..ty * 40 + 40 {
                    sum += field.row(y)[tx * 40..tx * 40 + 40]
                        .iter()
                        .map(|&v| v as u32)
                        .sum::<u32>();
                }
                let tile_mean = sum as f32 / 1600.0;
                assert!((tile_mean - 127.5).abs() < 20.0, "tile mean {}", tile_mean);
            }
        }
    }

    #[test]
    fn test_white_noise_seeded() {
        let a = NoiseField::white(32, 8, 7);
        let b = NoiseField::white(32, 8, 7);
        assert_eq!(a.row(5), b.row(5));
    }

    #[test]
    fn test_raw_length_checked() {
        assert!(matches!(
            NoiseField::from_raw(4, 4, vec![0; 15]),
            Err(NoiseFieldError::RawLength {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn test_ensure_size_fails_fast() {
        let field = NoiseField::bayer(200, 120);
        assert!(field.ensure_size(200, 120).is_ok());
        let err = field.ensure_size(400, 240).unwrap_err();
        assert!(matches!(err, NoiseFieldError::DimensionMismatch { .. }));
        assert_eq!(err.to_string(), "noise field is 200x120, screen is 400x240");
    }

    #[test]
    fn test_missing_image_is_error() {
        let result = NoiseField::from_image("/nonexistent/BlueNoise.tga", 400, 240);
        assert!(matches!(result, Err(NoiseFieldError::Image(_))));
    }
}
