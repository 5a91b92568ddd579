//! 16.16 fixed-point texture coordinate.
//!
//! Integer stepping keeps a span free of float drift: every pixel is exactly
//! `start + i * step`.  Arithmetic wraps on overflow; the integer part is
//! always masked before it becomes a texel index, so a wrapped value still
//! lands inside the texture.

use std::ops::{Add, AddAssign, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fixed16(pub i32);

impl Fixed16 {
    pub const SHIFT: u32 = 16;
    pub const ONE: Fixed16 = Fixed16(1 << 16);
    pub const ZERO: Fixed16 = Fixed16(0);

    /// Whole texels (`n << 16`).
    #[inline(always)]
    pub const fn from_int(n: i32) -> Self {
        Fixed16(n.wrapping_shl(Self::SHIFT))
    }

    /// Truncating conversion; out-of-range floats saturate.
    #[inline(always)]
    pub fn from_f32(v: f32) -> Self {
        Fixed16((v * 65536.0) as i32)
    }

    #[inline(always)]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }

    /// Integer part (floor, since the shift is arithmetic).
    #[inline(always)]
    pub const fn int(self) -> i32 {
        self.0 >> Self::SHIFT
    }

    /// Wrapped texel index in `0..=mask`.
    #[inline(always)]
    pub const fn texel(self, mask: i32) -> usize {
        (self.int() & mask) as usize
    }

    #[inline(always)]
    pub fn clamp_to(self, lo: i32, hi: i32) -> Self {
        Fixed16(self.0.clamp(lo, hi))
    }
}

impl Add for Fixed16 {
    type Output = Fixed16;
    #[inline(always)]
    fn add(self, rhs: Fixed16) -> Fixed16 {
        Fixed16(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed16 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Fixed16) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed16 {
    type Output = Fixed16;
    #[inline(always)]
    fn sub(self, rhs: Fixed16) -> Fixed16 {
        Fixed16(self.0.wrapping_sub(rhs.0))
    }
}
