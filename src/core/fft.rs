//! FFT-related constants and utilities shared across the crate.

use rustfft::num_complex::Complex;

/// Zero-valued complex number, used for FFT buffer initialization.
pub const COMPLEX_ZERO: Complex<f64> = Complex::new(0.0, 0.0);

/// Magnitude floor applied to the spectral envelope before residual
/// division, preventing near-infinite residual bins.
pub const ENVELOPE_FLOOR: f64 = 1e-10;

/// Absolute floor for overlap-add weight normalization.
pub const WEIGHT_EPSILON: f64 = 1e-8;

/// Below this output-frame RMS the energy normalization gain is forced
/// to 1.0 (silence stays silence, no division blow-up).
pub const RMS_EPSILON: f64 = 1e-12;

/// Smallest power of two greater than or equal to `n` (minimum 2).
#[inline]
pub fn next_pow2(n: usize) -> usize {
    n.max(2).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::next_pow2;

    #[test]
    fn next_pow2_values() {
        assert_eq!(next_pow2(0), 2);
        assert_eq!(next_pow2(1), 2);
        assert_eq!(next_pow2(2), 2);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(256), 256);
        assert_eq!(next_pow2(257), 512);
    }
}
