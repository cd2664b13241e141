#![forbid(unsafe_code)]
//! Pitch-synchronous frequency-domain voice transformation.
//!
//! `voicemorph` reshapes recorded speech along four independent axes: pitch,
//! duration, energy and vocal tract. Each analysis frame is split into an
//! excitation residual and an LPC spectral envelope; the residual is moved
//! to a pitch-scaled frequency axis, a target envelope is imposed on top,
//! and the frames are overlap-added back together with frame repetition and
//! skipping keeping the duration on target.
//!
//! # Quick Start
//!
//! ```
//! use voicemorph::{AudioBuffer, TransformParams};
//!
//! // Half a second of 220 Hz sine at 16 kHz
//! let data: Vec<f64> = (0..8000)
//!     .map(|i| 0.4 * (2.0 * std::f64::consts::PI * 220.0 * i as f64 / 16000.0).sin())
//!     .collect();
//! let input = AudioBuffer::new(data, 16000).unwrap();
//!
//! // One octave up, 20% slower
//! let params = TransformParams::new(16000)
//!     .with_pitch_scale(2.0)
//!     .with_time_scale(1.2);
//!
//! let output = voicemorph::transform(&input, &params).unwrap();
//! assert!(!output.is_empty());
//! ```
//!
//! A precomputed f0 contour (for example from a pitch tracker with better
//! voicing decisions) can be supplied through [`transform_with_contour`];
//! [`transform`] estimates one internally by autocorrelation.

pub mod analysis;
pub mod core;
pub mod error;
pub mod frames;
pub mod io;
pub mod mapping;
pub mod prosody;
pub mod synthesis;

pub use analysis::pitch::{track_pitch, PitchContour, PitchMarkSet};
pub use core::types::{
    AudioBuffer, FrameMode, Sample, ScaleFactors, ScaleSchedule, TransformParams,
};
pub use core::window::WindowType;
pub use error::MorphError;
pub use mapping::{CodebookEntry, LabelEntry, MapperConfig, SmoothingParams, SmoothingSource};
pub use prosody::F0Mapping;
pub use synthesis::{EngineState, FdResynthesizer};

use analysis::pitch::{DEFAULT_PITCH_SKIP_SECS, DEFAULT_PITCH_WINDOW_SECS};

/// Default f0 search band for the built-in pitch tracker, Hz.
pub const DEFAULT_MIN_F0: f64 = 50.0;
/// Upper bound of the default f0 search band, Hz.
pub const DEFAULT_MAX_F0: f64 = 500.0;

/// Transforms an utterance, estimating the pitch contour internally.
pub fn transform(
    input: &AudioBuffer,
    params: &TransformParams,
) -> Result<AudioBuffer, MorphError> {
    validate_samples(&input.data)?;
    let contour = track_pitch(
        &input.data,
        input.sample_rate,
        DEFAULT_PITCH_WINDOW_SECS,
        DEFAULT_PITCH_SKIP_SECS,
        DEFAULT_MIN_F0,
        DEFAULT_MAX_F0,
    )?;
    transform_with_contour(input, &contour, params)
}

/// Transforms an utterance against a precomputed pitch contour.
pub fn transform_with_contour(
    input: &AudioBuffer,
    contour: &PitchContour,
    params: &TransformParams,
) -> Result<AudioBuffer, MorphError> {
    validate_samples(&input.data)?;
    let mut effective = params.clone();
    effective.sample_rate = input.sample_rate;

    let marks = PitchMarkSet::from_contour(contour, input.data.len())?;
    let mut engine = FdResynthesizer::new(effective)?;
    let output = engine.process(input, contour, &marks)?;
    AudioBuffer::new(output, input.sample_rate)
}

/// Reads a WAV file, transforms it and writes the result as 16-bit PCM.
///
/// The synthesized signal is peak-normalized before writing when it clips.
pub fn transform_wav_file(
    input_path: &str,
    output_path: &str,
    params: &TransformParams,
) -> Result<(), MorphError> {
    let input = io::wav::read_wav_file(input_path)?;
    let mut output = transform(&input, params)?;
    io::scratch::normalize_clipping(&mut output.data);
    io::wav::write_wav_file_16bit(output_path, &output)
}

fn validate_samples(samples: &[Sample]) -> Result<(), MorphError> {
    if samples.is_empty() {
        return Err(MorphError::MissingInput("waveform is empty".to_string()));
    }
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(MorphError::InvalidFormat(
            "input contains non-finite samples".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn voiced_input(f0: f64, secs: f64) -> AudioBuffer {
        let n = (16000.0 * secs) as usize;
        let data = (0..n)
            .map(|i| {
                let t = i as f64 / 16000.0;
                // Two harmonics so the tracker locks onto the fundamental
                0.4 * (2.0 * PI * f0 * t).sin() + 0.2 * (2.0 * PI * 2.0 * f0 * t).sin()
            })
            .collect();
        AudioBuffer::new(data, 16000).unwrap()
    }

    #[test]
    fn transform_with_internal_tracker() {
        let input = voiced_input(150.0, 0.4);
        let params = TransformParams::new(16000).with_pitch_scale(1.3);
        let output = transform(&input, &params).unwrap();
        assert!(!output.is_empty());
        assert_eq!(output.sample_rate, 16000);
        assert!(output.data.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn rejects_non_finite_input() {
        let input = AudioBuffer::new(vec![0.0, f64::NAN, 0.1], 16000).unwrap();
        let params = TransformParams::new(16000);
        assert!(transform(&input, &params).is_err());
    }

    #[test]
    fn rejects_empty_input() {
        let input = AudioBuffer::new(vec![], 16000).unwrap();
        let params = TransformParams::new(16000);
        assert!(transform(&input, &params).is_err());
    }

    #[test]
    fn params_follow_buffer_sample_rate() {
        // A params object built for another rate adapts to the buffer.
        let input = voiced_input(150.0, 0.3);
        let params = TransformParams::new(44100);
        let output = transform(&input, &params).unwrap();
        assert_eq!(output.sample_rate, 16000);
    }
}
