//! Autocorrelation LPC analysis.
//!
//! The spectral envelope estimator models each frame as an all-pole filter
//! `sqrt(gain) / A(z)` whose coefficients come from the Levinson-Durbin
//! recursion over the frame autocorrelation.

/// Result of LPC analysis on a single frame.
#[derive(Debug, Clone)]
pub struct LpcCoefficients {
    /// Direct-form coefficients a[1..=order] of A(z) = 1 + a1 z^-1 + ...
    /// May be shorter than the requested order for degenerate frames.
    pub coeffs: Vec<f64>,
    /// Final prediction error energy.
    pub gain: f64,
}

/// Autocorrelation of `signal` for lags `0..=max_lag`.
pub fn autocorrelation(signal: &[f64], max_lag: usize) -> Vec<f64> {
    let n = signal.len();
    let mut r = vec![0.0; max_lag + 1];
    for (k, rk) in r.iter_mut().enumerate() {
        let mut sum = 0.0;
        for i in 0..n.saturating_sub(k) {
            sum += signal[i] * signal[i + k];
        }
        *rk = sum;
    }
    r
}

/// Levinson-Durbin recursion over autocorrelation values `r[0..=order]`.
///
/// The effective order shrinks when the frame is shorter than `order + 1`
/// samples or the prediction error collapses; zero-energy frames produce an
/// empty coefficient set with zero gain. Never panics on degenerate input.
pub fn levinson_durbin(r: &[f64], order: usize) -> LpcCoefficients {
    let order = order.min(r.len().saturating_sub(1));
    if order == 0 || r[0] <= 0.0 {
        return LpcCoefficients {
            coeffs: vec![],
            gain: r.first().copied().unwrap_or(0.0).max(0.0),
        };
    }

    let mut a = vec![0.0; order];
    let mut a_prev = vec![0.0; order];
    let mut error = r[0];
    let mut solved = 0;

    for m in 0..order {
        let mut acc = r[m + 1];
        for j in 0..m {
            acc += a_prev[j] * r[m - j];
        }
        if error.abs() < 1e-30 {
            break;
        }
        let k = -acc / error;
        a[m] = k;
        for j in 0..m {
            a[j] = a_prev[j] + k * a_prev[m - 1 - j];
        }
        error *= 1.0 - k * k;
        solved = m + 1;
        if error <= 0.0 {
            error = 1e-30;
            break;
        }
        a_prev[..=m].copy_from_slice(&a[..=m]);
    }

    a.truncate(solved);
    LpcCoefficients {
        coeffs: a,
        gain: error,
    }
}

/// Analyzes a (windowed, pre-emphasized) frame at the given order.
pub fn analyze(frame: &[f64], order: usize) -> LpcCoefficients {
    // A short frame implicitly reduces the order through the lag count.
    let max_lag = order.min(frame.len().saturating_sub(1));
    let r = autocorrelation(frame, max_lag);
    levinson_durbin(&r, max_lag)
}

/// In-place pre-emphasis: y[n] = x[n] - alpha * x[n-1].
pub fn preemphasize(frame: &mut [f64], alpha: f64) {
    let mut prev = 0.0;
    for sample in frame.iter_mut() {
        let cur = *sample;
        *sample = cur - alpha * prev;
        prev = cur;
    }
}

/// In-place de-emphasis, the inverse filter: y[n] = x[n] + alpha * y[n-1].
pub fn deemphasize(frame: &mut [f64], alpha: f64) {
    let mut prev = 0.0;
    for sample in frame.iter_mut() {
        *sample += alpha * prev;
        prev = *sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn autocorrelation_zero_lag_is_energy() {
        let x = vec![1.0, -2.0, 3.0];
        let r = autocorrelation(&x, 2);
        assert!((r[0] - 14.0).abs() < 1e-12);
        assert!((r[1] - (-8.0)).abs() < 1e-12);
    }

    #[test]
    fn first_order_predictor_recovers_ar1() {
        // x[n] = 0.9 x[n-1] + noise-free start: r[k] = 0.9^k r[0]
        let r: Vec<f64> = (0..=1).map(|k| 0.9f64.powi(k)).collect();
        let lpc = levinson_durbin(&r, 1);
        assert_eq!(lpc.coeffs.len(), 1);
        assert!((lpc.coeffs[0] + 0.9).abs() < 1e-9);
        assert!((lpc.gain - (1.0 - 0.81)).abs() < 1e-9);
    }

    #[test]
    fn zero_energy_frame_is_degenerate_not_panic() {
        let lpc = analyze(&[0.0; 64], 10);
        assert!(lpc.coeffs.is_empty());
        assert_eq!(lpc.gain, 0.0);
    }

    #[test]
    fn short_frame_reduces_order() {
        let lpc = analyze(&[0.5, -0.25, 0.1], 16);
        assert!(lpc.coeffs.len() <= 2);
        assert!(lpc.gain >= 0.0);
    }

    #[test]
    fn sine_frame_yields_resonant_model() {
        let frame: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 500.0 * i as f64 / 8000.0).sin())
            .collect();
        let lpc = analyze(&frame, 10);
        assert!(!lpc.coeffs.is_empty());
        // Prediction error of a pure sine is far below the frame energy.
        assert!(lpc.gain < 0.1 * frame.iter().map(|x| x * x).sum::<f64>());
    }

    #[test]
    fn emphasis_roundtrip() {
        let original: Vec<f64> = (0..64).map(|i| ((i * 7) % 13) as f64 / 13.0 - 0.5).collect();
        let mut x = original.clone();
        preemphasize(&mut x, 0.97);
        deemphasize(&mut x, 0.97);
        for (a, b) in x.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
