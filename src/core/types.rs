//! Core types: sample/buffer representations and transformation parameters.

use serde::{Deserialize, Serialize};

use crate::core::window::WindowType;
use crate::error::MorphError;
use crate::mapping::MapperConfig;
use crate::mapping::SmoothingParams;
use crate::prosody::F0Mapping;

/// A single audio sample (64-bit float, nominal range -1.0 to 1.0).
pub type Sample = f64;

/// Lower clamp for the per-frame pitch and time scale factors.
pub const MIN_SCALE: f64 = 0.1;
/// Upper clamp for the per-frame pitch and time scale factors.
pub const MAX_SCALE: f64 = 5.0;

/// Mono audio buffer at a fixed sample rate.
///
/// The transformation path is mono; the WAV reader downmixes stereo input.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Sample data.
    pub data: Vec<Sample>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a new audio buffer.
    ///
    /// # Errors
    /// Returns `MorphError::InvalidFormat` if `sample_rate` is 0.
    pub fn new(data: Vec<Sample>, sample_rate: u32) -> Result<Self, MorphError> {
        if sample_rate == 0 {
            return Err(MorphError::InvalidFormat(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        Ok(Self { data, sample_rate })
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }

    /// Returns true if the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, &s| m.max(s.abs()))
    }

    /// Root-mean-square amplitude.
    pub fn rms(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        (self.data.iter().map(|s| s * s).sum::<f64>() / self.data.len() as f64).sqrt()
    }
}

/// Per-frame transformation scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    /// Pitch scale: >1.0 raises pitch. Clamped to [0.1, 5.0].
    pub pitch: f64,
    /// Time scale: >1.0 lengthens. Clamped to [0.1, 5.0].
    pub time: f64,
    /// Energy scale applied at gain normalization.
    pub energy: f64,
    /// Vocal tract (frequency warp) scale; 1.0 = no warp.
    pub vocal_tract: f64,
}

impl ScaleFactors {
    /// Identity factors.
    pub fn identity() -> Self {
        Self {
            pitch: 1.0,
            time: 1.0,
            energy: 1.0,
            vocal_tract: 1.0,
        }
    }

    /// Builds factors with pitch and time clamped to the supported range.
    pub fn clamped(pitch: f64, time: f64, energy: f64, vocal_tract: f64) -> Self {
        Self {
            pitch: pitch.clamp(MIN_SCALE, MAX_SCALE),
            time: time.clamp(MIN_SCALE, MAX_SCALE),
            energy,
            vocal_tract,
        }
    }
}

/// A scale factor schedule: one value for the whole utterance, or one value
/// per fixed-rate analysis frame index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScaleSchedule {
    Constant(f64),
    PerFrame(Vec<f64>),
}

impl ScaleSchedule {
    /// Value for the given fixed-rate frame index. Per-frame schedules clamp
    /// the index to the last entry; an empty schedule yields 1.0.
    pub fn at(&self, index: usize) -> f64 {
        match self {
            ScaleSchedule::Constant(v) => *v,
            ScaleSchedule::PerFrame(values) => {
                if values.is_empty() {
                    1.0
                } else {
                    values[index.min(values.len() - 1)]
                }
            }
        }
    }

    fn validate(&self, name: &str) -> Result<(), MorphError> {
        let check = |v: f64| -> Result<(), MorphError> {
            if !v.is_finite() || v <= 0.0 {
                return Err(MorphError::InvalidParams(format!(
                    "{} scale must be positive and finite, got {}",
                    name, v
                )));
            }
            Ok(())
        };
        match self {
            ScaleSchedule::Constant(v) => check(*v),
            ScaleSchedule::PerFrame(values) => values.iter().try_for_each(|&v| check(v)),
        }
    }
}

/// Frame extraction mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FrameMode {
    /// Pitch-synchronous frames spanning `num_periods` pitch periods.
    PitchSynchronous,
    /// Fixed window/skip in seconds; fallback when no reliable pitch marks
    /// exist, or for vocal-tract-only conversion at a constant rate.
    FixedRate { window_secs: f64, skip_secs: f64 },
}

/// Parameters controlling a voice transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformParams {
    /// Sample rate in Hz (default: 16000).
    pub sample_rate: u32,
    /// Pitch periods per analysis frame (default: 2).
    pub num_periods: usize,
    /// Pre-emphasis coefficient (default: 0.97).
    pub preemphasis: f64,
    /// LPC order; `None` derives `sample_rate/1000 + 4`.
    pub lpc_order: Option<usize>,
    /// Analysis/synthesis window type (default: Hann).
    pub window: WindowType,
    /// Frame extraction mode.
    pub frame_mode: FrameMode,
    /// Pitch scale schedule.
    pub pitch_scale: ScaleSchedule,
    /// Time scale schedule.
    pub time_scale: ScaleSchedule,
    /// Energy scale schedule.
    pub energy_scale: ScaleSchedule,
    /// Vocal tract scale schedule.
    pub vocal_tract_scale: ScaleSchedule,
    /// Target-f0 derivation method.
    pub f0_mapping: F0Mapping,
    /// Vocal tract mapper selection.
    pub mapper: MapperConfig,
    /// Optional two-pass vocal tract smoothing.
    pub smoothing: Option<SmoothingParams>,
}

impl TransformParams {
    /// Creates parameters for the given sample rate with identity scales.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            num_periods: 2,
            preemphasis: 0.97,
            lpc_order: None,
            window: WindowType::Hann,
            frame_mode: FrameMode::PitchSynchronous,
            pitch_scale: ScaleSchedule::Constant(1.0),
            time_scale: ScaleSchedule::Constant(1.0),
            energy_scale: ScaleSchedule::Constant(1.0),
            vocal_tract_scale: ScaleSchedule::Constant(1.0),
            f0_mapping: F0Mapping::Direct,
            mapper: MapperConfig::Identity,
            smoothing: None,
        }
    }

    /// Sets a constant pitch scale.
    pub fn with_pitch_scale(mut self, scale: f64) -> Self {
        self.pitch_scale = ScaleSchedule::Constant(scale);
        self
    }

    /// Sets a constant time scale.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = ScaleSchedule::Constant(scale);
        self
    }

    /// Sets a constant energy scale.
    pub fn with_energy_scale(mut self, scale: f64) -> Self {
        self.energy_scale = ScaleSchedule::Constant(scale);
        self
    }

    /// Sets a constant vocal tract scale.
    pub fn with_vocal_tract_scale(mut self, scale: f64) -> Self {
        self.vocal_tract_scale = ScaleSchedule::Constant(scale);
        self
    }

    /// Sets the frame extraction mode.
    pub fn with_frame_mode(mut self, mode: FrameMode) -> Self {
        self.frame_mode = mode;
        self
    }

    /// Sets the vocal tract mapper.
    pub fn with_mapper(mut self, mapper: MapperConfig) -> Self {
        self.mapper = mapper;
        self
    }

    /// Sets the two-pass smoothing parameters.
    pub fn with_smoothing(mut self, smoothing: SmoothingParams) -> Self {
        self.smoothing = Some(smoothing);
        self
    }

    /// Effective LPC order for the configured sample rate.
    pub fn effective_lpc_order(&self) -> usize {
        self.lpc_order
            .unwrap_or(self.sample_rate as usize / 1000 + 4)
    }

    /// Validates all parameters.
    pub fn validate(&self) -> Result<(), MorphError> {
        if self.sample_rate == 0 {
            return Err(MorphError::InvalidParams(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        if self.num_periods == 0 {
            return Err(MorphError::InvalidParams(
                "num_periods must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.preemphasis) {
            return Err(MorphError::InvalidParams(format!(
                "pre-emphasis coefficient must be in [0, 1), got {}",
                self.preemphasis
            )));
        }
        if let FrameMode::FixedRate {
            window_secs,
            skip_secs,
        } = self.frame_mode
        {
            if window_secs <= 0.0 || skip_secs <= 0.0 {
                return Err(MorphError::InvalidParams(
                    "fixed-rate window and skip must be positive".to_string(),
                ));
            }
        }
        self.pitch_scale.validate("pitch")?;
        self.time_scale.validate("time")?;
        self.energy_scale.validate("energy")?;
        self.vocal_tract_scale.validate("vocal tract")?;
        if let Some(smoothing) = &self.smoothing {
            smoothing.validate()?;
        }
        self.mapper.validate()?;
        Ok(())
    }
}
