//! Analysis frame extraction.
//!
//! Produces successive frames from the input waveform, either
//! pitch-synchronously (one pitch mark advance per call, frame spanning
//! `num_periods` local periods) or at a fixed window/skip.

use crate::analysis::pitch::{PitchContour, PitchMarkSet, VOICED_F0_FLOOR};
use crate::core::types::Sample;
use crate::error::MorphError;

/// One analysis frame handed to the resynthesis engine.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Contiguous samples, always even in length; zero-padded near the
    /// waveform end.
    pub samples: Vec<Sample>,
    /// Frame index (0-based).
    pub index: usize,
    /// Center time of the frame in seconds.
    pub time: f64,
    /// Voicing of the underlying pitch interval.
    pub voiced: bool,
    /// True for the final frame of the utterance.
    pub last: bool,
}

enum Mode<'a> {
    PitchSynchronous {
        marks: &'a PitchMarkSet,
        num_periods: usize,
    },
    FixedRate {
        window: usize,
        skip: usize,
        contour: Option<&'a PitchContour>,
    },
}

/// Iterates analysis frames over a waveform.
pub struct FrameProvider<'a> {
    samples: &'a [Sample],
    sample_rate: u32,
    mode: Mode<'a>,
    index: usize,
    total: usize,
}

impl<'a> FrameProvider<'a> {
    /// Pitch-synchronous mode: frame i spans `marks[i] .. marks[i + num_periods]`.
    ///
    /// The last `num_periods` marks serve as lookahead and start no frame.
    pub fn pitch_synchronous(
        samples: &'a [Sample],
        sample_rate: u32,
        marks: &'a PitchMarkSet,
        num_periods: usize,
    ) -> Result<Self, MorphError> {
        if samples.is_empty() {
            return Err(MorphError::MissingInput("waveform is empty".to_string()));
        }
        if marks.marks.len() <= num_periods {
            return Err(MorphError::InputTooShort {
                provided: marks.marks.len(),
                minimum: num_periods + 1,
            });
        }
        let total = marks.marks.len() - num_periods;
        Ok(Self {
            samples,
            sample_rate,
            mode: Mode::PitchSynchronous { marks, num_periods },
            index: 0,
            total,
        })
    }

    /// Fixed-rate mode with window and skip given in seconds.
    ///
    /// Voicing per frame is looked up in `contour` when provided, otherwise
    /// every frame is treated as unvoiced (vocal-tract-only conversion).
    pub fn fixed_rate(
        samples: &'a [Sample],
        sample_rate: u32,
        window_secs: f64,
        skip_secs: f64,
        contour: Option<&'a PitchContour>,
    ) -> Result<Self, MorphError> {
        if samples.is_empty() {
            return Err(MorphError::MissingInput("waveform is empty".to_string()));
        }
        if window_secs <= 0.0 || skip_secs <= 0.0 {
            return Err(MorphError::InvalidParams(
                "fixed-rate window and skip must be positive".to_string(),
            ));
        }
        let fs = sample_rate as f64;
        let mut window = ((window_secs * fs).round() as usize).max(4);
        if window % 2 == 1 {
            window += 1;
        }
        let skip = ((skip_secs * fs).round() as usize).max(1);
        let total = samples.len().div_ceil(skip);
        Ok(Self {
            samples,
            sample_rate,
            mode: Mode::FixedRate {
                window,
                skip,
                contour,
            },
            index: 0,
            total,
        })
    }

    /// Total frames this provider will emit.
    pub fn total_frames(&self) -> usize {
        self.total
    }

    /// Analysis skip in samples ahead of the current frame.
    pub fn analysis_skip(&self) -> usize {
        match &self.mode {
            Mode::PitchSynchronous { marks, .. } => {
                let i = self.index.min(marks.marks.len() - 2);
                marks.period(i)
            }
            Mode::FixedRate { skip, .. } => *skip,
        }
    }

    /// Fixed-rate skip in samples, `None` in pitch-synchronous mode.
    pub fn fixed_skip(&self) -> Option<usize> {
        match &self.mode {
            Mode::PitchSynchronous { .. } => None,
            Mode::FixedRate { skip, .. } => Some(*skip),
        }
    }

    /// Start time of the upcoming frame in seconds.
    pub fn current_time(&self) -> f64 {
        let start = match &self.mode {
            Mode::PitchSynchronous { marks, .. } => {
                marks.marks[self.index.min(marks.marks.len() - 1)]
            }
            Mode::FixedRate { skip, .. } => self.index * skip,
        };
        start as f64 / self.sample_rate as f64
    }

    /// Produces the next frame, or `None` when the waveform is exhausted.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.index >= self.total {
            return None;
        }
        let fs = self.sample_rate as f64;
        let (start, len, voiced) = match &self.mode {
            Mode::PitchSynchronous { marks, num_periods } => {
                let start = marks.marks[self.index];
                let mut len = marks.marks[self.index + num_periods] - start;
                if len % 2 == 1 {
                    len += 1;
                }
                (start, len.max(4), marks.voiced[self.index])
            }
            Mode::FixedRate {
                window,
                skip,
                contour,
            } => {
                let start = self.index * skip;
                let t = (start + window / 2) as f64 / fs;
                let voiced = contour.is_some_and(|c| c.f0_at_time(t) > VOICED_F0_FLOOR);
                (start, *window, voiced)
            }
        };

        // Zero-pad past the waveform end rather than shortening the frame.
        let mut samples = vec![0.0; len];
        let available = self.samples.len().saturating_sub(start);
        let copy = available.min(len);
        if copy > 0 {
            samples[..copy].copy_from_slice(&self.samples[start..start + copy]);
        }

        let frame = Frame {
            samples,
            index: self.index,
            time: (start as f64 + len as f64 / 2.0) / fs,
            voiced,
            last: self.index + 1 == self.total,
        };
        self.index += 1;
        Some(frame)
    }
}
