//! Per-frame vocal tract spectral envelope estimation.
//!
//! The envelope of a windowed, pre-emphasized frame is the magnitude
//! response of its LPC all-pole model, `sqrt(gain) / |A(e^jw)|`, evaluated
//! on the positive-frequency grid of the analysis FFT.

use std::f64::consts::PI;

use crate::analysis::lpc::{self, LpcCoefficients};
use crate::analysis::lsf;

/// LPC model plus its LSF representation for one frame.
#[derive(Debug, Clone)]
pub struct EnvelopeEstimate {
    /// All-pole model of the frame.
    pub lpc: LpcCoefficients,
    /// Line spectral frequencies (radians, sorted) of the model.
    pub lsfs: Vec<f64>,
}

/// Runs LPC analysis on an already windowed, pre-emphasized frame.
///
/// Degenerate frames (shorter than `order + 1` samples, or silent) yield a
/// reduced or empty model rather than an error.
pub fn estimate(frame: &[f64], order: usize) -> EnvelopeEstimate {
    let lpc = lpc::analyze(frame, order);
    let lsfs = lsf::lpc_to_lsf(&lpc.coeffs);
    EnvelopeEstimate { lpc, lsfs }
}

/// Evaluates `sqrt(gain) / |A(e^jw)|` at `num_bins` points spanning 0..=pi.
///
/// An empty coefficient set degenerates to a flat envelope at `sqrt(gain)`.
pub fn evaluate(coeffs: &[f64], gain: f64, num_bins: usize) -> Vec<f64> {
    if num_bins == 0 {
        return vec![];
    }
    let amp = gain.max(0.0).sqrt();
    if coeffs.is_empty() {
        return vec![amp; num_bins];
    }

    let denom = (num_bins - 1).max(1) as f64;
    let mut env = vec![0.0; num_bins];
    for (k, bin) in env.iter_mut().enumerate() {
        let w = PI * k as f64 / denom;
        let mut re = 1.0;
        let mut im = 0.0;
        for (i, &a) in coeffs.iter().enumerate() {
            let angle = (i + 1) as f64 * w;
            re += a * angle.cos();
            im -= a * angle.sin();
        }
        let mag = (re * re + im * im).sqrt();
        *bin = if mag > 1e-15 { amp / mag } else { amp * 1e15 };
    }
    env
}

/// Evaluates the envelope for an estimate's own model.
pub fn evaluate_estimate(estimate: &EnvelopeEstimate, num_bins: usize) -> Vec<f64> {
    evaluate(&estimate.lpc.coeffs, estimate.lpc.gain, num_bins)
}
