//! Scan conversion straight into the packed 1-bit framebuffer
//!
//! Edges are walked in 16.16 fixed point. All edge arithmetic wraps so that
//! projected coordinates far outside the screen can never trap; rows outside
//! the framebuffer are skipped and spans are clipped by `draw_span`.

use crate::display::framebuffer::FrameBuffer;
use crate::math3d::Vec3;

/// 8x8 repeating fill pattern, one byte per row (set bit = white)
pub type Pattern = [u8; 8];

/// Ordered-dither fill patterns from solid black (0) to solid white (32)
pub const PATTERNS: [Pattern; 33] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x80, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00],
    [0x88, 0x00, 0x00, 0x00, 0x88, 0x00, 0x00, 0x00],
    [0x88, 0x00, 0x20, 0x00, 0x88, 0x00, 0x02, 0x00],
    [0x88, 0x00, 0x22, 0x00, 0x88, 0x00, 0x22, 0x00],
    [0xa8, 0x00, 0x22, 0x00, 0x8a, 0x00, 0x22, 0x00],
    [0xaa, 0x00, 0x22, 0x00, 0xaa, 0x00, 0x22, 0x00],
    [0xaa, 0x00, 0xa2, 0x00, 0xaa, 0x00, 0x2a, 0x00],
    [0xaa, 0x00, 0xaa, 0x00, 0xaa, 0x00, 0xaa, 0x00],
    [0xaa, 0x40, 0xaa, 0x00, 0xaa, 0x04, 0xaa, 0x00],
    [0xaa, 0x44, 0xaa, 0x00, 0xaa, 0x44, 0xaa, 0x00],
    [0xaa, 0x44, 0xaa, 0x10, 0xaa, 0x44, 0xaa, 0x01],
    [0xaa, 0x44, 0xaa, 0x11, 0xaa, 0x44, 0xaa, 0x11],
    [0xaa, 0x54, 0xaa, 0x11, 0xaa, 0x45, 0xaa, 0x11],
    [0xaa, 0x55, 0xaa, 0x11, 0xaa, 0x55, 0xaa, 0x11],
    [0xaa, 0x55, 0xaa, 0x51, 0xaa, 0x55, 0xaa, 0x15],
    [0xaa, 0x55, 0xaa, 0x55, 0xaa, 0x55, 0xaa, 0x55],
    [0xba, 0x55, 0xaa, 0x55, 0xab, 0x55, 0xaa, 0x55],
    [0xbb, 0x55, 0xaa, 0x55, 0xbb, 0x55, 0xaa, 0x55],
    [0xbb, 0x55, 0xea, 0x55, 0xbb, 0x55, 0xae, 0x55],
    [0xbb, 0x55, 0xee, 0x55, 0xbb, 0x55, 0xee, 0x55],
    [0xfb, 0x55, 0xee, 0x55, 0xbf, 0x55, 0xee, 0x55],
    [0xff, 0x55, 0xee, 0x55, 0xff, 0x55, 0xee, 0x55],
    [0xff, 0x55, 0xfe, 0x55, 0xff, 0x55, 0xef, 0x55],
    [0xff, 0x55, 0xff, 0x55, 0xff, 0x55, 0xff, 0x55],
    [0xff, 0x55, 0xff, 0xd5, 0xff, 0x55, 0xff, 0x5d],
    [0xff, 0x55, 0xff, 0xdd, 0xff, 0x55, 0xff, 0xdd],
    [0xff, 0x75, 0xff, 0xdd, 0xff, 0x57, 0xff, 0xdd],
    [0xff, 0x77, 0xff, 0xdd, 0xff, 0x77, 0xff, 0xdd],
    [0xff, 0x77, 0xff, 0xfd, 0xff, 0x77, 0xff, 0xdf],
    [0xff, 0x77, 0xff, 0xff, 0xff, 0x77, 0xff, 0xff],
    [0xff, 0xf7, 0xff, 0xff, 0xff, 0x7f, 0xff, 0xff],
    [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
];

/// Index of the solid black pattern
pub const BLACK: usize = 0;
/// Index of the solid white pattern
pub const WHITE: usize = 32;

const FIXED_ONE: f32 = 65536.0;

#[inline]
fn to_fixed(v: f32) -> i32 {
    (v * FIXED_ONE) as i32
}

/// 16.16 x-step per row; steps under one row use the full dx
#[inline]
fn slope(x1: f32, y1: f32, x2: f32, y2: f32) -> i32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    if dy < 1.0 {
        to_fixed(dx)
    } else {
        to_fixed(dx / dy)
    }
}

#[inline]
fn pattern_row(pattern: &Pattern, y: i32) -> u8 {
    pattern[(y & 7) as usize]
}

/// Fill rows `[y, end_y)` between two walking edges, leaving the edges at
/// `end_y` for the next range
#[allow(clippy::too_many_arguments)]
fn fill_range(
    fb: &mut FrameBuffer,
    mut y: i32,
    end_y: i32,
    x1: &mut i32,
    dx1: i32,
    x2: &mut i32,
    dx2: i32,
    pattern: &Pattern,
) {
    if end_y < 0 {
        let dy = end_y.wrapping_sub(y);
        *x1 = x1.wrapping_add(dy.wrapping_mul(dx1));
        *x2 = x2.wrapping_add(dy.wrapping_mul(dx2));
        return;
    }

    let (mut a, mut b) = (*x1, *x2);
    if y < 0 {
        a = a.wrapping_add(y.wrapping_neg().wrapping_mul(dx1));
        b = b.wrapping_add(y.wrapping_neg().wrapping_mul(dx2));
        y = 0;
    }

    while y < end_y {
        fb.draw_span(y, a >> 16, (b >> 16).wrapping_add(1), pattern_row(pattern, y));
        a = a.wrapping_add(dx1);
        b = b.wrapping_add(dx2);
        y += 1;
    }

    *x1 = a;
    *x2 = b;
}

/// Order three points by screen y
#[inline]
fn sort_by_y<'a>(p1: &'a Vec3, p2: &'a Vec3, p3: &'a Vec3) -> (&'a Vec3, &'a Vec3, &'a Vec3) {
    let (mut a, mut b, mut c) = (p1, p2, p3);
    if b.y < a.y {
        std::mem::swap(&mut a, &mut b);
    }
    if c.y < b.y {
        std::mem::swap(&mut b, &mut c);
    }
    if b.y < a.y {
        std::mem::swap(&mut a, &mut b);
    }
    (a, b, c)
}

/// Scan-convert a screen-space triangle (x, y used; z ignored) with a fill
/// pattern. Returns the range of rows touched.
pub fn fill_triangle(
    fb: &mut FrameBuffer,
    p1: &Vec3,
    p2: &Vec3,
    p3: &Vec3,
    pattern: &Pattern,
) -> (i32, i32) {
    let height = fb.height() as f32;
    let (p1, p2, p3) = sort_by_y(p1, p2, p3);

    let end_y = height.min(p3.y) as i32;
    if p1.y > height || end_y < 0 {
        return (0, 0);
    }

    let mut x1 = to_fixed(p1.x);
    let mut x2 = x1;

    let sb = slope(p1.x, p1.y, p2.x, p2.y);
    let sc = slope(p1.x, p1.y, p3.x, p3.y);
    let dx1 = sb.min(sc);
    let dx2 = sb.max(sc);

    let mid_y = height.min(p2.y) as i32;
    fill_range(fb, p1.y as i32, mid_y, &mut x1, dx1, &mut x2, dx2, pattern);

    let dx = slope(p2.x, p2.y, p3.x, p3.y);
    if sb < sc {
        x1 = to_fixed(p2.x);
        fill_range(fb, p2.y as i32, end_y, &mut x1, dx, &mut x2, dx2, pattern);
    } else {
        x2 = to_fixed(p2.x);
        fill_range(fb, p2.y as i32, end_y, &mut x1, dx1, &mut x2, dx, pattern);
    }

    ((p1.y as i32).max(0), end_y)
}

/// Draw a line `thick` pixels wide between two screen-space points
pub fn draw_line(fb: &mut FrameBuffer, p1: &Vec3, p2: &Vec3, thick: i32, pattern: &Pattern) {
    let (p1, p2) = if p1.y > p2.y { (p2, p1) } else { (p1, p2) };
    let rows = fb.height() as i32;
    let cols = fb.width() as f32;

    let mut y = p1.y as i32;
    let end_y = p2.y as i32;
    if y >= rows || end_y < 0 || p1.x.min(p2.x) >= cols || p1.x.max(p2.x) < 0.0 {
        return;
    }

    let mut x = to_fixed(p1.x);
    let dx = slope(p1.x, p1.y, p2.x, p2.y);
    let mut py = p1.y;

    if y < 0 {
        x = (x as f32 + -p1.y * dx as f32) as i32;
        y = 0;
        py = 0.0;
    }

    let mut x1 = (x as f32 + dx as f32 * (y as f32 + 1.0 - py)) as i32;

    while y <= end_y {
        let color = pattern_row(pattern, y);
        if y == end_y {
            x1 = to_fixed(p2.x);
        }

        if dx < 0 {
            fb.draw_span(y, x1 >> 16, (x >> 16).wrapping_add(thick), color);
        } else {
            fb.draw_span(y, x >> 16, (x1 >> 16).wrapping_add(thick), color);
        }

        y += 1;
        if y == rows {
            break;
        }
        x = x1;
        x1 = x1.wrapping_add(dx);
    }
}
