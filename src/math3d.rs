//! 3D Math Utilities for the 1-bit Renderer
//!
//! Plain copyable vector and affine-transform types feeding the `mini3d`
//! rasterizer and the shader-like effects.

use std::ops::{Add, Mul, Neg, Sub};

/// Fractional part, `x - floor(x)` (always in [0, 1) for finite input)
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Scalar linear interpolation; `t` is not clamped
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of `lerp`: where `v` sits between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn invlerp(a: f32, b: f32, v: f32) -> f32 {
    ((v - a) / (b - a)).clamp(0.0, 1.0)
}

/// 3D Vector (also used for points)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Divide by the Euclidean length.
    ///
    /// Zero-length input yields NaN components; callers that can produce
    /// degenerate vectors must reject the result downstream.
    #[inline]
    pub fn normalize(&self) -> Self {
        let inv = 1.0 / self.length();
        *self * inv
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Componentwise product
    #[inline]
    pub fn mul_elem(&self, other: &Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    #[inline]
    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    #[inline]
    pub fn fract(&self) -> Self {
        Self::new(fract(self.x), fract(self.y), fract(self.z))
    }

    /// Reflect `self` about the plane with unit normal `n`
    #[inline]
    pub fn reflect(&self, n: &Self) -> Self {
        *self - *n * (2.0 * self.dot(n))
    }

    /// Linear interpolation between two points.
    ///
    /// Note: `t` is not clamped to [0, 1], allowing extrapolation.
    #[inline]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let s = 1.0 - t;
        Self::new(
            self.x * s + other.x * t,
            self.y * s + other.y * t,
            self.z * s + other.z * t,
        )
    }

    /// Approximate equality check for floating point comparison
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }

    /// Unit normal of triangle (p1, p2, p3), following its winding
    #[inline]
    pub fn tri_normal(p1: &Self, p2: &Self, p3: &Self) -> Self {
        (*p2 - *p1).cross(&(*p3 - *p1)).normalize()
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Mul<Vec3> for f32 {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

// ============================================================================
// Affine transform
// ============================================================================

/// Affine transform: row-major 3x3 linear part plus a translation.
///
/// Applying it to a point computes `m * p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xform {
    pub m: [[f32; 3]; 3],
    pub t: Vec3,
}

impl Xform {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        t: Vec3::ZERO,
    };

    /// Linear transform from rows, no translation
    pub const fn from_rows(r0: [f32; 3], r1: [f32; 3], r2: [f32; 3]) -> Self {
        Self {
            m: [r0, r1, r2],
            t: Vec3::ZERO,
        }
    }

    pub const fn translate(dx: f32, dy: f32, dz: f32) -> Self {
        Self {
            m: Self::IDENTITY.m,
            t: Vec3::new(dx, dy, dz),
        }
    }

    /// Same linear part with a replaced translation
    pub fn with_translation(mut self, t: Vec3) -> Self {
        self.t = t;
        self
    }

    /// Rotation of `angle` radians around `axis` (Rodrigues' formula).
    /// The axis is normalized here.
    pub fn axis_angle(angle: f32, axis: Vec3) -> Self {
        let (s, c) = angle.sin_cos();
        let Vec3 { x, y, z } = axis.normalize();
        let ic = 1.0 - c;
        Self::from_rows(
            [c + x * x * ic, x * y * ic - z * s, x * z * ic + y * s],
            [y * x * ic + z * s, c + y * y * ic, y * z * ic - x * s],
            [z * x * ic - y * s, z * y * ic + x * s, c + z * z * ic],
        )
    }

    /// Transform a point: `m * p + t`
    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            p.x * m[0][0] + p.y * m[0][1] + p.z * m[0][2] + self.t.x,
            p.x * m[1][0] + p.y * m[1][1] + p.z * m[1][2] + self.t.y,
            p.x * m[2][0] + p.y * m[2][1] + p.z * m[2][2] + self.t.z,
        )
    }

    /// Transform a direction (linear part only)
    #[inline]
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            v.x * m[0][0] + v.y * m[0][1] + v.z * m[0][2],
            v.x * m[1][0] + v.y * m[1][1] + v.z * m[1][2],
            v.x * m[2][0] + v.y * m[2][1] + v.z * m[2][2],
        )
    }

    /// Determinant of the linear part; negative for mirroring transforms
    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0][0] * m[1][1] * m[2][2] + m[0][1] * m[1][2] * m[2][0] + m[0][2] * m[1][0] * m[2][1]
            - m[2][0] * m[1][1] * m[0][2]
            - m[1][0] * m[0][1] * m[2][2]
            - m[0][0] * m[2][1] * m[1][2]
    }
}

impl Default for Xform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Affine composition: `(a * b).apply(p) == a.apply(b.apply(p))`
impl Mul for Xform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.m;
        let b = &rhs.m;
        let mut m = [[0.0; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Self {
            m,
            t: self.apply(rhs.t),
        }
    }
}
