//! 17.14 fixed-point arithmetic
//!
//! Signed 32-bit value: 1 sign bit, 17 integer bits, 14 fractional bits.
//! Used for the load average and per-thread recent CPU usage, which must
//! be computed in interrupt context where the FPU is off limits.
//!
//! Products and quotients of two fixed-point values are computed in 64
//! bits so the intermediate value cannot overflow.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Sub};

/// Number of fractional bits
pub const FRAC_BITS: u32 = 14;

/// Raw representation of 1.0
const ONE: i32 = 1 << FRAC_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[repr(transparent)]
pub struct FixedPoint(i32);

impl FixedPoint {
    pub const ZERO: Self = Self(0);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn from_int(n: i32) -> Self {
        Self(n << FRAC_BITS)
    }

    /// Arithmetic shift: truncates toward negative infinity, never rounds
    pub const fn to_int(self) -> i32 {
        self.0 >> FRAC_BITS
    }

    /// `a / b` as a fixed-point value.
    ///
    /// Precondition: `b != 0`.
    pub fn int_div_int(a: i32, b: i32) -> Self {
        Self((((a as i64) << FRAC_BITS) / b as i64) as i32)
    }

    /// Add exactly 1.0
    pub fn increment(&mut self) {
        self.0 += ONE;
    }

    /// `to_int(self * 100)`, the form reported to user programs.
    ///
    /// Widened so any representable value reports without overflow.
    pub fn to_int_x100(self) -> i32 {
        ((self.0 as i64 * 100) >> FRAC_BITS) as i32
    }
}

impl Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for FixedPoint {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Add<i32> for FixedPoint {
    type Output = Self;

    fn add(self, rhs: i32) -> Self {
        self + Self::from_int(rhs)
    }
}

impl Sub<i32> for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: i32) -> Self {
        self - Self::from_int(rhs)
    }
}

impl Mul<i32> for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self(self.0 * rhs)
    }
}

/// Truncating division by an integer; `rhs != 0`
impl Div<i32> for FixedPoint {
    type Output = Self;

    fn div(self, rhs: i32) -> Self {
        Self(self.0 / rhs)
    }
}

impl Mul for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> FRAC_BITS) as i32)
    }
}

/// Denominator must be non-zero
impl Div for FixedPoint {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self((((self.0 as i64) << FRAC_BITS) / rhs.0 as i64) as i32)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x100 = self.to_int_x100();
        let sign = if x100 < 0 { "-" } else { "" };
        let abs = x100.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
