// ============================================================================
// Screen geometry
// ============================================================================

/// Native panel width in pixels
pub const SCREEN_WIDTH: usize = 400;
/// Native panel height in pixels
pub const SCREEN_HEIGHT: usize = 240;
/// Bytes per framebuffer row (50 bytes of pixels + 2 bytes of padding)
pub const ROW_STRIDE: usize = 52;

// ============================================================================
// Utility Functions
// ============================================================================

/// Merge `color` into `byte` only where `mask` has bits set
#[inline]
fn merge_masked(byte: &mut u8, mask: u8, color: u8) {
    if mask == 0xFF {
        *byte = color;
    } else {
        *byte = (*byte & !mask) | (color & mask);
    }
}

/// Bit for column `x` inside its byte (bit 7 = leftmost pixel)
#[inline]
const fn bit_for(x: usize) -> u8 {
    0x80 >> (x & 7)
}

/// Write one packed pixel as ABGR (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel(dest: &mut [u8], (r, g, b): (u8, u8, u8)) {
    dest[0] = 255; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

// ============================================================================
// FrameBuffer
// ============================================================================

/// Packed 1-bit-per-pixel bitmap, row-major.
///
/// Bit 7 of each byte is the leftmost pixel. A set bit is white, a clear bit
/// is black. Rows may be padded: `stride` is at least `ceil(width / 8)`.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
    width: usize,
    height: usize,
    stride: usize,
}

impl FrameBuffer {
    /// Create a framebuffer matching the native panel (400x240, stride 52)
    pub fn new() -> Self {
        Self::with_size(SCREEN_WIDTH, SCREEN_HEIGHT, ROW_STRIDE)
    }

    /// Create a framebuffer with custom geometry, cleared to white
    pub fn with_size(width: usize, height: usize, stride: usize) -> Self {
        assert!(
            stride * 8 >= width,
            "row stride {} too small for width {}",
            stride,
            width
        );
        Self {
            bytes: vec![0xFF; stride * height],
            width,
            height,
            stride,
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

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    /// Fill every byte (padding included) with solid white or black
    pub fn clear(&mut self, white: bool) {
        self.bytes.fill(if white { 0xFF } else { 0x00 });
    }

    /// Full row including padding bytes
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.bytes[y * self.stride..(y + 1) * self.stride]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.bytes[y * self.stride..(y + 1) * self.stride]
    }

    /// Read a pixel: Some(true) for white, None if out of bounds
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<bool> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some(self.bytes[y * self.stride + (x >> 3)] & bit_for(x) != 0)
    }

    /// Set a single pixel (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, white: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let byte = &mut self.bytes[y * self.stride + (x >> 3)];
        if white {
            *byte |= bit_for(x);
        } else {
            *byte &= !bit_for(x);
        }
    }

    /// Write `color` (one 8-pixel pattern byte) into pixels `[x1, x2)` of row `y`.
    ///
    /// The span is clipped to the row; partial bytes at either end are merged
    /// through a mask so neighbouring pixels keep their value. The pattern is
    /// aligned to byte boundaries, so it repeats every 8 screen columns.
    pub fn draw_span(&mut self, y: i32, x1: i32, x2: i32, color: u8) {
        if y < 0 || y as usize >= self.height {
            return;
        }
        let width = self.width as i32;
        if x2 <= 0 || x1 >= width {
            return;
        }
        let x1 = x1.max(0) as usize;
        let x2 = x2.min(width) as usize;
        if x1 >= x2 {
            return;
        }

        let row = self.row_mut(y as usize);
        let first = x1 >> 3;
        let last = (x2 - 1) >> 3;
        let start_mask = 0xFFu8 >> (x1 & 7);
        let end_mask = 0xFFu8 << (7 - ((x2 - 1) & 7));

        if first == last {
            merge_masked(&mut row[first], start_mask & end_mask, color);
            return;
        }
        merge_masked(&mut row[first], start_mask, color);
        row[first + 1..last].fill(color);
        merge_masked(&mut row[last], end_mask, color);
    }

    /// Number of black pixels in the visible area (padding ignored)
    pub fn count_black(&self) -> usize {
        let full_bytes = self.width / 8;
        let tail_bits = self.width % 8;
        (0..self.height)
            .map(|y| {
                let row = self.row(y);
                let mut count: usize = row[..full_bytes]
                    .iter()
                    .map(|b| b.count_zeros() as usize)
                    .sum();
                if tail_bits > 0 {
                    let mask = 0xFFu8 << (8 - tail_bits);
                    count += (!row[full_bytes] & mask).count_ones() as usize;
                }
                count
            })
            .sum()
    }

    /// Raw packed bytes, `stride * height` long
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Expand into an RGBA8888 texture buffer (`width * height * 4` bytes)
    /// using the given ink and paper colors
    pub fn write_rgba(&self, dest: &mut [u8], black: (u8, u8, u8), white: (u8, u8, u8)) {
        debug_assert_eq!(dest.len(), self.width * self.height * 4);
        for (y, out_row) in dest.chunks_exact_mut(self.width * 4).enumerate() {
            let row = self.row(y);
            for (x, out) in out_row.chunks_exact_mut(4).enumerate() {
                let lit = row[x >> 3] & bit_for(x) != 0;
                write_pixel(out, if lit { white } else { black });
            }
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_white_with_padding() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.as_bytes().len(), ROW_STRIDE * SCREEN_HEIGHT);
        assert_eq!(fb.count_black(), 0);
    }

    #[test]
    fn test_set_pixel_msb_is_leftmost() {
        let mut fb = FrameBuffer::with_size(16, 2, 2);
        fb.set_pixel(0, 0, false);
        fb.set_pixel(9, 1, false);
        assert_eq!(fb.row(0)[0], 0x7F);
        assert_eq!(fb.row(1)[1], 0xBF);
        assert_eq!(fb.pixel(0, 0), Some(false));
        assert_eq!(fb.pixel(1, 0), Some(true));
        assert_eq!(fb.pixel(16, 0), None);
    }

    #[test]
    fn test_span_inside_one_byte_keeps_neighbours() {
        let mut fb = FrameBuffer::with_size(16, 1, 2);
        fb.draw_span(0, 2, 5, 0x00);
        assert_eq!(fb.row(0)[0], 0b1100_0111);
        assert_eq!(fb.row(0)[1], 0xFF);
    }

    #[test]
    fn test_span_across_bytes_masks_both_ends() {
        let mut fb = FrameBuffer::with_size(32, 1, 4);
        fb.clear(false);
        fb.draw_span(0, 6, 26, 0xFF);
        assert_eq!(fb.row(0), &[0b0000_0011, 0xFF, 0xFF, 0b1100_0000]);
    }

    #[test]
    fn test_span_applies_pattern_byte() {
        let mut fb = FrameBuffer::with_size(24, 1, 3);
        fb.clear(false);
        fb.draw_span(0, 4, 20, 0xAA);
        assert_eq!(fb.row(0), &[0x0A, 0xAA, 0xA0]);
    }

    #[test]
    fn test_span_clipping_and_empty_ranges() {
        let mut fb = FrameBuffer::with_size(16, 2, 2);
        fb.draw_span(0, -10, 3, 0x00);
        assert_eq!(fb.row(0)[0], 0x1F);
        fb.draw_span(1, 12, 100, 0x00);
        assert_eq!(fb.row(1), &[0xFF, 0xF0]);

        let before = fb.as_bytes().to_vec();
        fb.draw_span(0, 5, 5, 0x00);
        fb.draw_span(0, 7, 3, 0x00);
        fb.draw_span(-1, 0, 16, 0x00);
        fb.draw_span(2, 0, 16, 0x00);
        assert_eq!(fb.as_bytes(), &before[..]);
    }

    #[test]
    fn test_span_never_touches_padding() {
        let mut fb = FrameBuffer::new();
        fb.draw_span(0, 0, 10_000, 0x00);
        let row = fb.row(0);
        assert!(row[..SCREEN_WIDTH / 8].iter().all(|&b| b == 0));
        assert!(row[SCREEN_WIDTH / 8..].iter().all(|&b| b == 0xFF));
        assert_eq!(fb.count_black(), SCREEN_WIDTH);
    }

    #[test]
    fn test_write_rgba_expands_bits() {
        let mut fb = FrameBuffer::with_size(8, 1, 1);
        fb.set_pixel(1, 0, false);
        let mut rgba = vec![0u8; 8 * 4];
        fb.write_rgba(&mut rgba, (0, 0, 0), (255, 255, 255));
        assert_eq!(&rgba[0..4], &[255, 255, 255, 255]);
        assert_eq!(&rgba[4..8], &[255, 0, 0, 0]);
    }
}
