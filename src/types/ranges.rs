// Copyright (c) 2024 Mike Tsao

use core::{fmt::Display, ops::Mul};
use serde::{Deserialize, Serialize};

/// [RangedF64] enforces the given range limits while staying cheap to use
/// compared to a plain f64. It clamps at creation, when setting the value, and
/// when converting from a primitive. It never reports that clamping happened.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RangedF64<const LOWER: i8, const UPPER: i8>(pub f64);
#[allow(missing_docs)]
impl<const LOWER: i8, const UPPER: i8> RangedF64<LOWER, UPPER> {
    /// The highest valid value.
    pub const MAX: f64 = UPPER as f64;
    /// The lowest valid value.
    pub const MIN: f64 = LOWER as f64;

    pub fn new(value: f64) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }
    pub const fn maximum() -> Self {
        Self(Self::MAX)
    }
    pub const fn minimum() -> Self {
        Self(Self::MIN)
    }
    pub fn set(&mut self, value: f64) {
        self.0 = value.clamp(Self::MIN, Self::MAX);
    }
    pub fn to_f32(&self) -> f32 {
        self.0 as f32
    }
}
impl<const LOWER: i8, const UPPER: i8> Default for RangedF64<LOWER, UPPER> {
    fn default() -> Self {
        Self::minimum()
    }
}
impl<const LOWER: i8, const UPPER: i8> Display for RangedF64<LOWER, UPPER> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}
impl<const LOWER: i8, const UPPER: i8> Mul<f64> for RangedF64<LOWER, UPPER> {
    type Output = f64;

    fn mul(self, rhs: f64) -> Self::Output {
        self.0 * rhs
    }
}
impl<const LOWER: i8, const UPPER: i8> From<RangedF64<LOWER, UPPER>> for f64 {
    fn from(value: RangedF64<LOWER, UPPER>) -> Self {
        value.0.clamp(RangedF64::<LOWER, UPPER>::MIN, RangedF64::<LOWER, UPPER>::MAX)
    }
}
impl<const LOWER: i8, const UPPER: i8> From<f64> for RangedF64<LOWER, UPPER> {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}
impl<const LOWER: i8, const UPPER: i8> From<f32> for RangedF64<LOWER, UPPER> {
    fn from(value: f32) -> Self {
        Self::new(value as f64)
    }
}

/// A [Normal] is a [RangedF64] whose range is [0.0, 1.0].
pub type Normal = RangedF64<0, 1>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_clamps() {
        assert_eq!(Normal::new(2.0).0, 1.0);
        assert_eq!(Normal::new(-0.5).0, 0.0);
        assert_eq!(Normal::from(0.25f32).0, 0.25);

        let mut n = Normal::maximum();
        n.set(1.5);
        assert_eq!(n, Normal::maximum());
        n.set(0.5);
        assert_eq!(f64::from(n), 0.5);
        assert_eq!(Normal::default(), Normal::minimum());
    }
}
