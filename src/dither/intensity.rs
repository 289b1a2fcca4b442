/// Screen-sized grid of 8-bit intensities (0 = black, 255 = white).
///
/// Effects fill it every frame; the dither driver reads it back. For the
/// half-resolution path the `w/2 x h/2` samples are packed densely at the
/// start of the same storage.
#[derive(Debug, Clone)]
pub struct IntensityBuffer {
    width: usize,
    height: usize,
    values: Vec<u8>,
}

impl IntensityBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0; width * height],
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

    pub fn fill(&mut self, value: u8) {
        self.values.fill(value);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.values[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.values[y * self.width + x] = value;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.values[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.values[y * self.width..(y + 1) * self.width]
    }

    /// Row `y` of the half-resolution grid packed at the start of the buffer
    #[inline]
    pub fn half_row_mut(&mut self, y: usize) -> &mut [u8] {
        let half_w = self.width / 2;
        &mut self.values[y * half_w..(y + 1) * half_w]
    }

    #[inline]
    pub fn half_row(&self, y: usize) -> &[u8] {
        let half_w = self.width / 2;
        &self.values[y * half_w..(y + 1) * half_w]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.values
    }

    /// Copy the densely packed contents of a `w/2 x h/2` buffer into the
    /// half-resolution area of this one
    pub fn load_half(&mut self, half: &IntensityBuffer) {
        let n = half.values.len().min(self.values.len());
        self.values[..n].copy_from_slice(&half.values[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_contiguous() {
        let mut buf = IntensityBuffer::new(4, 3);
        buf.row_mut(1).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buf.get(2, 1), 3);
        assert_eq!(&buf.as_slice()[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_half_rows_pack_at_start() {
        let mut buf = IntensityBuffer::new(8, 4);
        buf.half_row_mut(0).fill(10);
        buf.half_row_mut(1).fill(20);
        // Two half rows (4 samples each) occupy the first full row
        assert_eq!(buf.row(0), &[10, 10, 10, 10, 20, 20, 20, 20]);
        assert_eq!(buf.half_row(1), &[20; 4]);
    }

    #[test]
    fn test_load_half_copies_prefix() {
        let mut half = IntensityBuffer::new(4, 2);
        half.fill(77);
        let mut full = IntensityBuffer::new(8, 4);
        full.load_half(&half);
        assert!(full.as_slice()[..8].iter().all(|&v| v == 77));
        assert!(full.as_slice()[8..].iter().all(|&v| v == 0));
    }
}
