//! Ordered temporal sampling patterns
//!
//! Expensive per-pixel effects evaluate only a fraction of each block every
//! frame. A pattern lists, per frame and per sub-row of the block, the 1-based
//! column to evaluate (0 = skip that sub-row this frame). Over one full cycle
//! every column of every sub-row is visited exactly once.

/// One temporal sampling table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedPattern {
    pub name: &'static str,
    pub block_width: usize,
    pub block_height: usize,
    /// `frames[f][sub_row]` = 1-based column offset, or 0
    pub frames: &'static [&'static [u8]],
}

impl OrderedPattern {
    /// Cycle length in frames
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Column offset (1-based, 0 = none) for a sub-row on a given frame.
    /// Both arguments wrap.
    #[inline]
    pub fn offset(&self, frame: usize, sub_row: usize) -> u8 {
        self.frames[frame % self.frames.len()][sub_row % self.block_height]
    }

    /// 0-based screen columns of row `row` to evaluate on `frame`:
    /// `offset-1, offset-1+block_width, ...` below `width`
    pub fn columns(&self, frame: usize, row: usize, width: usize) -> impl Iterator<Item = usize> {
        let offset = self.offset(frame, row) as usize;
        let start = if offset == 0 { width } else { offset - 1 };
        (start..width).step_by(self.block_width)
    }

    /// Fraction of the screen refreshed per frame
    pub fn coverage_per_frame(&self) -> f32 {
        1.0 / self.frame_count() as f32
    }
}

pub const PATTERN_2X2: OrderedPattern = OrderedPattern {
    name: "2x2",
    block_width: 2,
    block_height: 2,
    frames: &[&[1, 0], &[0, 2], &[2, 0], &[0, 1]],
};

pub const PATTERN_3X2: OrderedPattern = OrderedPattern {
    name: "3x2",
    block_width: 3,
    block_height: 2,
    frames: &[&[1, 0], &[0, 2], &[3, 0], &[0, 1], &[2, 0], &[0, 3]],
};

pub const PATTERN_4X2: OrderedPattern = OrderedPattern {
    name: "4x2",
    block_width: 4,
    block_height: 2,
    frames: &[
        &[1, 0],
        &[0, 3],
        &[3, 0],
        &[0, 1],
        &[2, 0],
        &[0, 4],
        &[4, 0],
        &[0, 2],
    ],
};

pub const PATTERN_3X3: OrderedPattern = OrderedPattern {
    name: "3x3",
    block_width: 3,
    block_height: 3,
    frames: &[
        &[1, 0, 0],
        &[0, 0, 2],
        &[3, 0, 0],
        &[0, 1, 0],
        &[0, 0, 3],
        &[2, 0, 0],
        &[0, 0, 1],
        &[0, 3, 0],
        &[0, 2, 0],
    ],
};

pub const PATTERN_4X3: OrderedPattern = OrderedPattern {
    name: "4x3",
    block_width: 4,
    block_height: 3,
    frames: &[
        &[1, 0, 0],
        &[0, 0, 3],
        &[0, 0, 1],
        &[4, 0, 0],
        &[0, 2, 0],
        &[0, 0, 4],
        &[3, 0, 0],
        &[0, 1, 0],
        &[0, 3, 0],
        &[2, 0, 0],
        &[0, 0, 2],
        &[0, 4, 0],
    ],
};

/// 4x4 block refreshed over 8 frames, two sub-rows per frame
pub const PATTERN_4X4_FAST: OrderedPattern = OrderedPattern {
    name: "4x4/8",
    block_width: 4,
    block_height: 4,
    frames: &[
        &[1, 0, 4, 0],
        &[0, 3, 0, 2],
        &[3, 0, 1, 0],
        &[0, 2, 0, 4],
        &[4, 0, 2, 0],
        &[2, 0, 0, 3],
        &[0, 4, 0, 1],
        &[0, 1, 3, 0],
    ],
};

pub const PATTERN_4X4: OrderedPattern = OrderedPattern {
    name: "4x4",
    block_width: 4,
    block_height: 4,
    frames: &[
        &[1, 0, 0, 0],
        &[0, 0, 3, 0],
        &[0, 0, 1, 0],
        &[3, 0, 0, 0],
        &[0, 2, 0, 0],
        &[0, 0, 0, 4],
        &[0, 0, 0, 2],
        &[0, 4, 0, 0],
        &[0, 1, 0, 0],
        &[0, 0, 0, 3],
        &[0, 0, 0, 1],
        &[0, 3, 0, 0],
        &[2, 0, 0, 0],
        &[0, 0, 4, 0],
        &[0, 0, 2, 0],
        &[4, 0, 0, 0],
    ],
};

/// Every table, cheapest refresh first
pub const ALL_PATTERNS: [OrderedPattern; 7] = [
    PATTERN_2X2,
    PATTERN_3X2,
    PATTERN_4X2,
    PATTERN_3X3,
    PATTERN_4X4_FAST,
    PATTERN_4X3,
    PATTERN_4X4,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_sub_row_covers_each_column_once() {
        for pattern in ALL_PATTERNS {
            for frame in pattern.frames {
                assert_eq!(frame.len(), pattern.block_height, "{}", pattern.name);
            }
            for sub_row in 0..pattern.block_height {
                let mut offsets: Vec<u8> = (0..pattern.frame_count())
                    .map(|f| pattern.offset(f, sub_row))
                    .filter(|&o| o != 0)
                    .collect();
                offsets.sort_unstable();
                let expected: Vec<u8> = (1..=pattern.block_width as u8).collect();
                assert_eq!(offsets, expected, "{} sub-row {}", pattern.name, sub_row);
            }
        }
    }

    #[test]
    fn test_columns_cover_screen_once_per_cycle() {
        let width = 400;
        for pattern in ALL_PATTERNS {
            for row in 0..pattern.block_height * 2 {
                let mut hits = vec![0u32; width];
                for frame in 0..pattern.frame_count() {
                    for x in pattern.columns(frame, row, width) {
                        hits[x] += 1;
                    }
                }
                assert!(hits.iter().all(|&h| h == 1), "{} row {}", pattern.name, row);
            }
        }
    }

    #[test]
    fn test_skip_yields_no_columns() {
        // Frame 0 of the 4x2 table evaluates sub-row 0 only
        assert_eq!(PATTERN_4X2.columns(0, 1, 400).count(), 0);
        let cols: Vec<usize> = PATTERN_4X2.columns(0, 0, 16).collect();
        assert_eq!(cols, vec![0, 4, 8, 12]);
    }

    #[test]
    fn test_offset_wraps_frame_and_row() {
        assert_eq!(PATTERN_4X4.offset(16, 0), PATTERN_4X4.offset(0, 0));
        assert_eq!(PATTERN_4X4.offset(1, 6), 3);
    }

    #[test]
    fn test_coverage_per_frame() {
        assert!((PATTERN_2X2.coverage_per_frame() - 0.25).abs() < 1e-6);
        assert!((PATTERN_4X4.coverage_per_frame() - 1.0 / 16.0).abs() < 1e-6);
        assert!((PATTERN_4X4_FAST.coverage_per_frame() - 0.125).abs() < 1e-6);
    }
}
