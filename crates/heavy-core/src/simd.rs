//! Fixed-width float vectors for block processing.
//!
//! All signal kernels operate on [`Vf<W>`], an aligned `[f32; W]` with lane-wise
//! arithmetic. The loops are written over fixed-size arrays so the compiler
//! lowers them to the target's SIMD registers; there is one code path for every
//! width.
//!
//! The width used by a [`Context`](crate::Context) is chosen at build time:
//!
//! | Feature | `N_SIMD` |
//! |---------|----------|
//! | (default) | 4 |
//! | `simd-8` | 8 |
//! | `simd-scalar` | 1 |
//!
//! Kernels that need cross-lane precomputation (recursive filters, ramps) are
//! generic over `W` so any width can be tested directly.

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of lanes processed per sub-block.
#[cfg(feature = "simd-8")]
pub const N_SIMD: usize = 8;
/// Number of lanes processed per sub-block.
#[cfg(all(feature = "simd-scalar", not(feature = "simd-8")))]
pub const N_SIMD: usize = 1;
/// Number of lanes processed per sub-block.
#[cfg(not(any(feature = "simd-8", feature = "simd-scalar")))]
pub const N_SIMD: usize = 4;

/// Vector of the build-time width.
pub type Buf = Vf<N_SIMD>;

/// Rounds `n` down to a multiple of [`N_SIMD`].
#[inline]
pub const fn align_down(n: usize) -> usize {
    n - n % N_SIMD
}

/// Rounds `n` up to a multiple of [`N_SIMD`].
#[inline]
pub const fn align_up(n: usize) -> usize {
    n.div_ceil(N_SIMD) * N_SIMD
}

/// A vector of `W` floats.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C, align(32))]
pub struct Vf<const W: usize>(pub [f32; W]);

impl<const W: usize> Default for Vf<W> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const W: usize> Vf<W> {
    /// Number of lanes.
    pub const LANES: usize = W;

    /// All lanes zero.
    #[inline]
    pub const fn zero() -> Self {
        Self([0.0; W])
    }

    /// All lanes set to `v`.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self([v; W])
    }

    /// Builds a vector lane by lane.
    #[inline]
    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        Self(core::array::from_fn(f))
    }

    /// Lane `i` holds `i as f32`.
    #[inline]
    pub fn ramp() -> Self {
        Self(core::array::from_fn(|i| i as f32))
    }

    /// Loads the first `W` samples of `src`.
    #[inline]
    pub fn load(src: &[f32]) -> Self {
        let mut v = [0.0; W];
        v.copy_from_slice(&src[..W]);
        Self(v)
    }

    /// Stores the lanes into the first `W` samples of `dst`.
    #[inline]
    pub fn store(self, dst: &mut [f32]) {
        dst[..W].copy_from_slice(&self.0);
    }

    /// Lane `i`.
    #[inline]
    pub fn lane(self, i: usize) -> f32 {
        self.0[i]
    }

    /// Last lane.
    #[inline]
    pub fn last(self) -> f32 {
        self.0[W - 1]
    }

    /// Applies `f` to every lane.
    #[inline]
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(self.0.map(f))
    }

    /// Combines lanes of two vectors with `f`.
    #[inline]
    pub fn zip_map(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Self(core::array::from_fn(|i| f(self.0[i], other.0[i])))
    }

    /// `self * b + c` per lane.
    #[inline]
    pub fn fma(self, b: Self, c: Self) -> Self {
        Self(core::array::from_fn(|i| self.0[i] * b.0[i] + c.0[i]))
    }

    /// Lane-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        self.zip_map(other, f32::min)
    }

    /// Lane-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        self.zip_map(other, f32::max)
    }

    /// Lane-wise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        self.map(f32::abs)
    }

    /// Per lane: `a` where `mask` is set, otherwise `b`.
    #[inline]
    pub fn select(mask: [bool; W], a: Self, b: Self) -> Self {
        Self(core::array::from_fn(|i| if mask[i] { a.0[i] } else { b.0[i] }))
    }

    /// Sum of all lanes.
    #[inline]
    pub fn sum(self) -> f32 {
        self.0.iter().sum()
    }

    /// Shifts lanes up by one, inserting `first` at lane 0.
    ///
    /// Returns the shifted vector and the lane that fell off the end.
    #[inline]
    pub fn shift_in(self, first: f32) -> (Self, f32) {
        let out = core::array::from_fn(|i| if i == 0 { first } else { self.0[i - 1] });
        (Self(out), self.last())
    }
}

impl<const W: usize> Add for Vf<W> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl<const W: usize> Sub for Vf<W> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl<const W: usize> Mul for Vf<W> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a * b)
    }
}

impl<const W: usize> Mul<f32> for Vf<W> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        self.map(|a| a * rhs)
    }
}

impl<const W: usize> Div for Vf<W> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a / b)
    }
}

impl<const W: usize> Neg for Vf<W> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<const W: usize> AddAssign for Vf<W> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const W: usize> SubAssign for Vf<W> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const W: usize> MulAssign for Vf<W> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_helpers() {
        assert_eq!(align_down(N_SIMD * 3 + N_SIMD - 1), N_SIMD * 3);
        assert_eq!(align_up(1), N_SIMD);
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(N_SIMD), N_SIMD);
    }

    #[test]
    fn arithmetic_is_lane_wise() {
        let a = Vf([1.0, 2.0, 3.0, 4.0]);
        let b = Vf::<4>::splat(2.0);
        assert_eq!((a + b).0, [3.0, 4.0, 5.0, 6.0]);
        assert_eq!((a - b).0, [-1.0, 0.0, 1.0, 2.0]);
        assert_eq!((a * b).0, [2.0, 4.0, 6.0, 8.0]);
        assert_eq!((a / b).0, [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(a.fma(b, b).0, [4.0, 6.0, 8.0, 10.0]);
        assert_eq!(a.sum(), 10.0);
    }

    #[test]
    fn shift_in_carries_last_lane() {
        let a = Vf([1.0, 2.0, 3.0, 4.0]);
        let (shifted, out) = a.shift_in(9.0);
        assert_eq!(shifted.0, [9.0, 1.0, 2.0, 3.0]);
        assert_eq!(out, 4.0);
    }

    #[test]
    fn ramp_and_select() {
        let r = Vf::<8>::ramp();
        assert_eq!(r.lane(7), 7.0);
        let s = Vf::select([true, false], Vf([1.0, 1.0]), Vf([2.0, 2.0]));
        assert_eq!(s.0, [1.0, 2.0]);
    }

    #[test]
    fn load_store_round_trip() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let v = Vf::<4>::load(&data[1..]);
        let mut out = [0.0; 4];
        v.store(&mut out);
        assert_eq!(out, [2.0, 3.0, 4.0, 5.0]);
    }
}
