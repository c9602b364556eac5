//! Strength-reduced unsigned division for divisors fixed at the call site.
//!
//! Partition computations have to work for arbitrary chunk sizes, not just
//! the power-of-two block sizes handled by [`BlockLayout`](crate::BlockLayout).
//! When the same divisor is used across many positions, replacing the
//! hardware divide with a precomputed multiplicative inverse pays off.

/// A divisor with a precomputed 128-bit round-up multiplicative inverse.
///
/// Quotients are computed as the high 64 bits of `magic * n / 2^128` where
/// `magic = floor(2^128 / d) + 1`. The result is exact for every `u64`
/// numerator and every non-zero divisor; divisor `1` is special-cased since
/// its magic constant does not fit in 128 bits.
#[derive(Debug, Clone, Copy)]
pub struct FastDivisor {
    divisor: u64,
    magic: u128,
}

impl FastDivisor {
    /// Creates a reduced divisor for `d`.
    ///
    /// # Panics
    ///
    /// Panics if `d` is zero.
    pub fn new(d: u64) -> FastDivisor {
        assert!(d != 0, "divisor must be non-zero");
        let magic = if d == 1 {
            0
        } else {
            u128::MAX / d as u128 + 1
        };
        FastDivisor { divisor: d, magic }
    }

    /// The divisor this reducer was built for.
    #[inline]
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// `n / d`.
    #[inline]
    pub fn div(&self, n: u64) -> u64 {
        if self.divisor == 1 {
            return n;
        }
        // floor(magic * n / 2^128), computed with two 128-bit products:
        // magic = hi * 2^64 + lo, so
        // floor(magic * n / 2^128) = floor((hi * n + floor(lo * n / 2^64)) / 2^64)
        let n = n as u128;
        let hi = (self.magic >> 64) * n;
        let lo = ((self.magic as u64 as u128) * n) >> 64;
        ((hi + lo) >> 64) as u64
    }

    /// `n % d`.
    #[inline]
    pub fn rem(&self, n: u64) -> u64 {
        n - self.div(n) * self.divisor
    }

    /// `(n / d, n % d)` with a single reduced division.
    #[inline]
    pub fn div_rem(&self, n: u64) -> (u64, u64) {
        let q = self.div(n);
        (q, n - q * self.divisor)
    }
}
