//! Pitch contour and pitch mark handling.
//!
//! The engine consumes a frame-rate f0 contour and per-sample pitch marks.
//! Both can come from a file, or be derived here: the tracker estimates a
//! contour by normalized autocorrelation, and `PitchMarkSet::from_contour`
//! places glottal-pulse marks by walking the contour.

use crate::core::types::Sample;
use crate::error::MorphError;

/// F0 values at or below this are treated as unvoiced.
pub const VOICED_F0_FLOOR: f64 = 10.0;

/// Normalized autocorrelation threshold for the voiced decision.
const VOICING_THRESHOLD: f64 = 0.3;

/// Default analysis window for pitch tracking, seconds.
pub const DEFAULT_PITCH_WINDOW_SECS: f64 = 0.040;
/// Default frame skip for pitch tracking, seconds.
pub const DEFAULT_PITCH_SKIP_SECS: f64 = 0.010;

/// Fixed-rate fundamental frequency contour.
#[derive(Debug, Clone)]
pub struct PitchContour {
    /// One f0 value in Hz per analysis frame; 0.0 marks unvoiced frames.
    pub f0: Vec<f64>,
    /// Analysis window length in seconds.
    pub window_secs: f64,
    /// Frame skip in seconds.
    pub skip_secs: f64,
    /// Sample rate of the analyzed waveform.
    pub sample_rate: u32,
}

impl PitchContour {
    /// Number of contour frames.
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    /// True when the contour holds no frames.
    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }

    /// Contour index nearest to time `t` seconds, clamped into range.
    pub fn index_at_time(&self, t: f64) -> usize {
        if self.f0.is_empty() {
            return 0;
        }
        let idx = (t / self.skip_secs).round();
        (idx.max(0.0) as usize).min(self.f0.len() - 1)
    }

    /// F0 at the frame nearest to time `t`; 0.0 when empty.
    pub fn f0_at_time(&self, t: f64) -> f64 {
        if self.f0.is_empty() {
            return 0.0;
        }
        self.f0[self.index_at_time(t)]
    }

    /// True when the frame at index `i` is voiced.
    pub fn voiced(&self, i: usize) -> bool {
        self.f0.get(i).is_some_and(|&f| f > VOICED_F0_FLOOR)
    }

    /// Mean and standard deviation of f0 over voiced frames.
    ///
    /// Returns (0.0, 0.0) for a fully unvoiced contour.
    pub fn voiced_statistics(&self) -> (f64, f64) {
        let voiced: Vec<f64> = self
            .f0
            .iter()
            .copied()
            .filter(|&f| f > VOICED_F0_FLOOR)
            .collect();
        if voiced.is_empty() {
            return (0.0, 0.0);
        }
        let mean = voiced.iter().sum::<f64>() / voiced.len() as f64;
        let var = voiced.iter().map(|f| (f - mean) * (f - mean)).sum::<f64>()
            / voiced.len() as f64;
        (mean, var.sqrt())
    }
}

/// Ordered glottal closure instants with per-interval voicing.
#[derive(Debug, Clone)]
pub struct PitchMarkSet {
    /// Strictly increasing sample indices.
    pub marks: Vec<usize>,
    /// Voicing flag per interval; length is `marks.len() - 1`.
    pub voiced: Vec<bool>,
    /// Samples remaining after the last mark.
    pub end_padding: usize,
}

impl PitchMarkSet {
    /// Pitch period of interval `i` in samples.
    pub fn period(&self, i: usize) -> usize {
        self.marks[i + 1] - self.marks[i]
    }

    /// Number of pitch intervals.
    pub fn num_intervals(&self) -> usize {
        self.voiced.len()
    }

    /// Places pitch marks by walking an f0 contour across `total_samples`.
    ///
    /// Voiced regions advance one local pitch period per mark; unvoiced
    /// regions advance by the contour skip size with the interval flagged
    /// unvoiced.
    pub fn from_contour(
        contour: &PitchContour,
        total_samples: usize,
    ) -> Result<Self, MorphError> {
        if contour.is_empty() {
            return Err(MorphError::MissingInput("pitch contour is empty".to_string()));
        }
        let fs = contour.sample_rate as f64;
        let skip_samples = ((contour.skip_secs * fs).round() as usize).max(1);

        let mut marks = vec![0usize];
        let mut voiced = Vec::new();
        let mut cur = 0usize;
        while cur < total_samples {
            let f0 = contour.f0_at_time(cur as f64 / fs);
            let (step, is_voiced) = if f0 > VOICED_F0_FLOOR {
                (((fs / f0).round() as usize).max(1), true)
            } else {
                (skip_samples, false)
            };
            let next = cur + step;
            if next >= total_samples {
                break;
            }
            marks.push(next);
            voiced.push(is_voiced);
            cur = next;
        }

        let end_padding = total_samples - *marks.last().unwrap_or(&0);
        Ok(Self {
            marks,
            voiced,
            end_padding,
        })
    }
}

/// Estimates a fixed-rate f0 contour by normalized autocorrelation.
///
/// Frames whose normalized autocorrelation peak stays below the voicing
/// threshold get f0 = 0.0.
pub fn track_pitch(
    samples: &[Sample],
    sample_rate: u32,
    window_secs: f64,
    skip_secs: f64,
    min_f0: f64,
    max_f0: f64,
) -> Result<PitchContour, MorphError> {
    if samples.is_empty() {
        return Err(MorphError::MissingInput("waveform is empty".to_string()));
    }
    if min_f0 <= 0.0 || max_f0 <= min_f0 {
        return Err(MorphError::InvalidParams(format!(
            "invalid f0 search band [{}, {}]",
            min_f0, max_f0
        )));
    }

    let fs = sample_rate as f64;
    let win = ((window_secs * fs).round() as usize).max(2);
    let skip = ((skip_secs * fs).round() as usize).max(1);
    let num_frames = samples.len().div_ceil(skip);

    let mut f0 = Vec::with_capacity(num_frames);
    for i in 0..num_frames {
        let start = i * skip;
        let end = (start + win).min(samples.len());
        f0.push(frame_f0(&samples[start..end], fs, min_f0, max_f0));
    }

    Ok(PitchContour {
        f0,
        window_secs,
        skip_secs,
        sample_rate,
    })
}

fn frame_f0(frame: &[Sample], fs: f64, min_f0: f64, max_f0: f64) -> f64 {
    if frame.len() < 4 {
        return 0.0;
    }
    let min_lag = (fs / max_f0).floor() as usize;
    let max_lag = ((fs / min_f0).ceil() as usize).min(frame.len() - 1);
    if min_lag >= max_lag {
        return 0.0;
    }

    let r = crate::analysis::lpc::autocorrelation(frame, max_lag);
    if r[0] <= 0.0 {
        return 0.0;
    }

    let mut best_lag = min_lag;
    let mut best_val = r[min_lag];
    for (lag, &val) in r.iter().enumerate().take(max_lag + 1).skip(min_lag + 1) {
        if val > best_val {
            best_val = val;
            best_lag = lag;
        }
    }

    if best_val / r[0] > VOICING_THRESHOLD {
        fs / best_lag as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn tracks_sine_fundamental() {
        let fs = 16000.0;
        let samples = sine(200.0, fs, 16000);
        let contour = track_pitch(&samples, 16000, 0.04, 0.01, 50.0, 500.0).unwrap();
        let (mean, _) = contour.voiced_statistics();
        assert!((mean - 200.0).abs() < 10.0, "tracked mean {}", mean);
    }

    #[test]
    fn silence_is_unvoiced() {
        let contour = track_pitch(&vec![0.0; 8000], 16000, 0.04, 0.01, 50.0, 500.0).unwrap();
        assert!(contour.f0.iter().all(|&f| f == 0.0));
        assert_eq!(contour.voiced_statistics(), (0.0, 0.0));
    }

    #[test]
    fn marks_follow_period_in_voiced_regions() {
        let fs = 16000u32;
        let contour = PitchContour {
            f0: vec![200.0; 100],
            window_secs: 0.04,
            skip_secs: 0.01,
            sample_rate: fs,
        };
        let pm = PitchMarkSet::from_contour(&contour, 16000).unwrap();
        // 200 Hz at 16 kHz = 80-sample period
        for i in 0..pm.num_intervals() {
            assert_eq!(pm.period(i), 80);
            assert!(pm.voiced[i]);
        }
        // Strictly increasing
        for pair in pm.marks.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(pm.end_padding < 16000);
    }

    #[test]
    fn unvoiced_regions_use_skip_step() {
        let contour = PitchContour {
            f0: vec![0.0; 50],
            window_secs: 0.04,
            skip_secs: 0.01,
            sample_rate: 16000,
        };
        let pm = PitchMarkSet::from_contour(&contour, 8000).unwrap();
        for i in 0..pm.num_intervals() {
            assert_eq!(pm.period(i), 160);
            assert!(!pm.voiced[i]);
        }
    }

    #[test]
    fn contour_time_lookup_clamps() {
        let contour = PitchContour {
            f0: vec![100.0, 110.0, 120.0],
            window_secs: 0.04,
            skip_secs: 0.01,
            sample_rate: 16000,
        };
        assert_eq!(contour.index_at_time(-1.0), 0);
        assert_eq!(contour.index_at_time(0.011), 1);
        assert_eq!(contour.index_at_time(10.0), 2);
        assert_eq!(contour.f0_at_time(10.0), 120.0);
    }

    #[test]
    fn empty_contour_rejected_for_marks() {
        let contour = PitchContour {
            f0: vec![],
            window_secs: 0.04,
            skip_secs: 0.01,
            sample_rate: 16000,
        };
        assert!(PitchMarkSet::from_contour(&contour, 1000).is_err());
    }
}
