//! Pitch-synchronous frequency-domain resynthesis (FD-PSOLA).
//!
//! For every analysis frame the engine separates excitation from vocal
//! tract (residual = spectrum / LPC envelope), rebuilds the spectrum on a
//! pitch-scaled frequency axis under a target envelope, and overlap-adds
//! the reconstructed time frame into the output stream. Frame repetition
//! and skipping compensate the duration drift that pitch scaling causes.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::analysis::envelope;
use crate::analysis::lpc;
use crate::analysis::lsf;
use crate::analysis::pitch::{PitchContour, PitchMarkSet};
use crate::core::fft::{next_pow2, COMPLEX_ZERO, ENVELOPE_FLOOR, RMS_EPSILON};
use crate::core::overlap::OverlapAddBuffer;
use crate::core::types::{
    AudioBuffer, FrameMode, Sample, ScaleFactors, TransformParams, MIN_SCALE,
};
use crate::core::window::{apply_window, generate_window};
use crate::error::MorphError;
use crate::frames::{Frame, FrameProvider};
use crate::mapping::{LsfSequence, MappedLsfs, SmoothingSource, SmoothingState, VocalTractMapper};
use crate::prosody::ProsodyTransformer;

/// Engine state over one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Normal,
    LastFrame,
    Done,
}

/// Per-utterance mutable scratch: FFT planner, complex buffers and frame
/// workspaces, sized once and reused across frames. Passed explicitly
/// through the frame processing path so no hidden state aliases between
/// utterances.
struct SynthesisArena {
    planner: FftPlanner<f64>,
    analysis: Vec<Complex<f64>>,
    synthesis: Vec<Complex<f64>>,
    residual: Vec<Complex<f64>>,
    frame: Vec<f64>,
    out_frame: Vec<f64>,
}

impl SynthesisArena {
    fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            analysis: Vec::new(),
            synthesis: Vec::new(),
            residual: Vec::new(),
            frame: Vec::new(),
            out_frame: Vec::new(),
        }
    }
}

/// The FD-PSOLA resynthesis engine.
///
/// One instance per utterance; instances share no mutable state, so
/// independent utterances may be processed concurrently by independent
/// engines.
pub struct FdResynthesizer {
    params: TransformParams,
    mapper: Box<dyn VocalTractMapper>,
    state: EngineState,
}

impl FdResynthesizer {
    /// Builds an engine for the given parameters.
    ///
    /// Fails at construction time for invalid parameters, before any frame
    /// processing starts.
    pub fn new(params: TransformParams) -> Result<Self, MorphError> {
        params.validate()?;
        let mapper = params.mapper.build();
        Ok(Self {
            params,
            mapper,
            state: EngineState::Normal,
        })
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Transforms a whole utterance and returns the output samples.
    ///
    /// With smoothing configured this runs a recording pass, neighbor-
    /// averages the recorded vocal tract sequence, then runs the actual
    /// transformation pass against the smoothed sequence.
    pub fn process(
        &mut self,
        input: &AudioBuffer,
        contour: &PitchContour,
        marks: &PitchMarkSet,
    ) -> Result<Vec<Sample>, MorphError> {
        if input.is_empty() {
            return Err(MorphError::MissingInput("waveform is empty".to_string()));
        }
        if contour.is_empty() {
            return Err(MorphError::MissingInput("pitch contour is empty".to_string()));
        }

        match &self.params.smoothing {
            None => self.run_pass(input, contour, marks, SmoothingState::Off, None, &mut None),
            Some(cfg) => {
                let neighbors = cfg.neighbors;
                let mut recorded = Some(LsfSequence::new());
                self.run_pass(
                    input,
                    contour,
                    marks,
                    SmoothingState::Record,
                    None,
                    &mut recorded,
                )?;
                let smoothed = recorded
                    .take()
                    .map(|seq| seq.smoothed(neighbors))
                    .unwrap_or_default();
                self.run_pass(
                    input,
                    contour,
                    marks,
                    SmoothingState::Apply,
                    Some(&smoothed),
                    &mut None,
                )
            }
        }
    }

    fn run_pass(
        &mut self,
        input: &AudioBuffer,
        contour: &PitchContour,
        marks: &PitchMarkSet,
        smoothing: SmoothingState,
        replay: Option<&LsfSequence>,
        record: &mut Option<LsfSequence>,
    ) -> Result<Vec<Sample>, MorphError> {
        self.state = EngineState::Normal;
        let num_periods = self.params.num_periods;
        let lpc_order = self.params.effective_lpc_order();
        let alpha = self.params.preemphasis;

        let mut provider = match self.params.frame_mode {
            FrameMode::PitchSynchronous => FrameProvider::pitch_synchronous(
                &input.data,
                input.sample_rate,
                marks,
                num_periods,
            )?,
            FrameMode::FixedRate {
                window_secs,
                skip_secs,
            } => FrameProvider::fixed_rate(
                &input.data,
                input.sample_rate,
                window_secs,
                skip_secs,
                Some(contour),
            )?,
        };

        let prosody =
            ProsodyTransformer::new(contour, &self.params.f0_mapping, &self.params.pitch_scale);

        // Pitch scale floors at MIN_SCALE, so a transformed frame can grow
        // by at most 1/MIN_SCALE plus the even-forcing sample.
        let max_frame_len = max_frame_length(marks, num_periods, &self.params.frame_mode, input);
        let capacity = ((max_frame_len as f64 / MIN_SCALE).ceil() as usize + 2).max(8);

        let mut arena = SynthesisArena::new();
        let mut ledger = super::ledger::DurationLedger::new();
        let mut ola = OverlapAddBuffer::with_capacity(capacity);
        let mut output: Vec<Sample> = Vec::with_capacity(input.data.len());

        let mut synthesis_pos = 0usize;
        let mut first_emission_pending = true;

        while let Some(frame) = provider.next_frame() {
            if frame.last {
                self.state = EngineState::LastFrame;
            }
            let contour_idx = contour.index_at_time(frame.time);
            let current_f0 = contour.f0[contour_idx];

            let pitch_scale = if frame.voiced {
                prosody.pitch_scale_for(current_f0, contour_idx)
            } else {
                1.0
            };
            let scales = ScaleFactors::clamped(
                pitch_scale,
                self.params.time_scale.at(contour_idx),
                self.params.energy_scale.at(contour_idx),
                self.params.vocal_tract_scale.at(contour_idx),
            );

            let len = frame.samples.len();
            let new_len = scaled_frame_length(len, scales.pitch);
            let new_period = new_len as f64 / num_periods as f64;

            let plan = ledger.plan(len, new_len, new_period, scales.time, num_periods, frame.last);

            if plan.emissions == 0 {
                // Skipped frame. The recording pass still analyzes it, with
                // the configured source vector, so the replay sequence stays
                // aligned with frame indices.
                if smoothing == SmoothingState::Record {
                    let est = analyze_frame(&mut arena, &frame, alpha, lpc_order, &self.params);
                    let source = self
                        .params
                        .smoothing
                        .as_ref()
                        .map(|s| s.source)
                        .unwrap_or(SmoothingSource::SourceLsfs);
                    let recorded = match source {
                        SmoothingSource::SourceLsfs => est.lsfs,
                        SmoothingSource::MappedLsfs => {
                            self.mapper.map(&est.lsfs, frame.time).target
                        }
                        SmoothingSource::RatioFilter => {
                            correction_ratio(&self.mapper.map(&est.lsfs, frame.time))
                        }
                    };
                    if let Some(seq) = record.as_mut() {
                        seq.push(recorded);
                    }
                }
                continue;
            }

            let out_frame = self.process_spectral(
                &mut arena,
                &frame,
                &scales,
                alpha,
                lpc_order,
                smoothing,
                replay,
                record,
            );

            let syn_hop = match provider.fixed_skip() {
                Some(skip) => ((skip as f64 / scales.pitch).round() as usize).max(1),
                None => (new_period.round() as usize).max(1),
            };

            for rep in 0..plan.emissions {
                let is_last_emission = frame.last && rep == plan.emissions - 1;
                // Unvoiced repetitions are time-reversed on every second
                // emission to break up audible periodicity.
                let reversed = !frame.voiced && rep % 2 == 1;

                let mut window = generate_window(self.params.window, out_frame.len());
                let half = out_frame.len() / 2;
                if first_emission_pending {
                    for w in window.iter_mut().take(half) {
                        *w = 1.0;
                    }
                }
                if is_last_emission {
                    for w in window.iter_mut().skip(half) {
                        *w = 1.0;
                    }
                }
                first_emission_pending = false;

                arena.frame.clear();
                if reversed {
                    arena
                        .frame
                        .extend(out_frame.iter().rev().zip(window.iter()).map(|(s, w)| s * w));
                } else {
                    arena
                        .frame
                        .extend(out_frame.iter().zip(window.iter()).map(|(s, w)| s * w));
                }

                ola.advance_to(synthesis_pos, &mut output);
                ola.accumulate(synthesis_pos, &arena.frame, &window)?;
                synthesis_pos += syn_hop;
            }
        }

        ola.drain(&mut output);
        self.state = EngineState::Done;
        Ok(output)
    }

    /// Spectral transformation of one frame; returns the de-emphasized,
    /// energy-normalized synthesis frame of the pitch-scaled length.
    #[allow(clippy::too_many_arguments)]
    fn process_spectral(
        &mut self,
        arena: &mut SynthesisArena,
        frame: &Frame,
        scales: &ScaleFactors,
        alpha: f64,
        lpc_order: usize,
        smoothing: SmoothingState,
        replay: Option<&LsfSequence>,
        record: &mut Option<LsfSequence>,
    ) -> Vec<f64> {
        let len = frame.samples.len();
        let fft_size = next_pow2(len);
        let max_freq = fft_size / 2 + 1;

        // Pre-emphasis, then the analysis window.
        arena.frame.clear();
        arena.frame.extend_from_slice(&frame.samples);
        lpc::preemphasize(&mut arena.frame, alpha);
        let window = generate_window(self.params.window, len);
        apply_window(&mut arena.frame, &window);

        let in_rms = rms(&arena.frame);

        let cfg_source = self.params.smoothing.as_ref().map(|s| s.source);

        // Source vocal tract model, possibly replaced by the smoothed
        // source sequence during the apply pass.
        let mut estimate = envelope::estimate(&arena.frame, lpc_order);
        if smoothing == SmoothingState::Apply && cfg_source == Some(SmoothingSource::SourceLsfs) {
            if let Some(lsfs) = replay.and_then(|seq| seq.get(frame.index)) {
                if !lsfs.is_empty() {
                    estimate.lpc.coeffs = lsf::lsf_to_lpc(lsfs);
                    estimate.lsfs = lsfs.to_vec();
                }
            }
        }
        let input_env = envelope::evaluate_estimate(&estimate, max_freq);

        // Target vocal tract shape from the mapper (or the smoothed mapped
        // sequence), with the input frame's gain.
        let mut mapped = self.mapper.map(&estimate.lsfs, frame.time);
        if smoothing == SmoothingState::Apply && cfg_source == Some(SmoothingSource::MappedLsfs) {
            if let Some(lsfs) = replay.and_then(|seq| seq.get(frame.index)) {
                if !lsfs.is_empty() {
                    mapped.target = lsfs.to_vec();
                }
            }
        }
        if smoothing == SmoothingState::Record {
            if let Some(seq) = record.as_mut() {
                match cfg_source.unwrap_or(SmoothingSource::SourceLsfs) {
                    SmoothingSource::SourceLsfs => seq.push(estimate.lsfs.clone()),
                    SmoothingSource::MappedLsfs => seq.push(mapped.target.clone()),
                    SmoothingSource::RatioFilter => seq.push(correction_ratio(&mapped)),
                }
            }
        }
        let target_coeffs = lsf::lsf_to_lpc(&mapped.target);

        // Forward FFT of the windowed, pre-emphasized frame.
        arena.analysis.clear();
        arena
            .analysis
            .extend(arena.frame.iter().map(|&s| Complex::new(s, 0.0)));
        arena.analysis.resize(fft_size, COMPLEX_ZERO);
        let fft_forward = arena.planner.plan_fft_forward(fft_size);
        fft_forward.process(&mut arena.analysis);

        // Residual spectrum: input spectrum divided by the (floored) input
        // envelope, positive frequencies only.
        arena.residual.clear();
        for k in 0..max_freq {
            let env = input_env[k].max(ENVELOPE_FLOOR);
            arena.residual.push(arena.analysis[k] / env);
        }

        // Output spectrum support, pitch-scaled and forced odd.
        let new_len = scaled_frame_length(len, scales.pitch);
        let mut new_max_freq = (max_freq as f64 / scales.pitch).round() as usize;
        if new_max_freq % 2 == 0 {
            new_max_freq += 1;
        }
        new_max_freq = new_max_freq.max(3);
        let new_fft = 2 * (new_max_freq - 1);

        // Target envelope on the new grid, optionally warped along the
        // frequency axis by the vocal tract scale. Under ratio smoothing the
        // apply pass multiplies the source envelope by the smoothed
        // correction filter instead of evaluating the mapped model.
        let smoothed_ratio = if smoothing == SmoothingState::Apply
            && cfg_source == Some(SmoothingSource::RatioFilter)
        {
            replay.and_then(|seq| seq.get(frame.index))
        } else {
            None
        };
        let mut target_env = match smoothed_ratio {
            Some(ratio) => {
                let src_env =
                    envelope::evaluate(&estimate.lpc.coeffs, estimate.lpc.gain, new_max_freq);
                apply_correction_ratio(&src_env, ratio)
            }
            None => envelope::evaluate(&target_coeffs, estimate.lpc.gain, new_max_freq),
        };
        if (scales.vocal_tract - 1.0).abs() > 1e-9 {
            target_env = warp_envelope(&target_env, scales.vocal_tract);
        }

        // Extended residual: direct copy where the axes overlap, periodic
        // copy-paste with reflection on alternate repeats beyond the input
        // Nyquist. Truncation or zero padding here buzzes audibly at large
        // pitch scale factors.
        arena.synthesis.clear();
        arena.synthesis.resize(new_fft, COMPLEX_ZERO);
        let direct = max_freq.min(new_max_freq);
        for k in 0..direct {
            arena.synthesis[k] = arena.residual[k] * target_env[k];
        }
        if new_max_freq > max_freq {
            let span = max_freq - 1;
            for k in max_freq..new_max_freq {
                let offset = k - max_freq;
                let block = offset / span;
                let pos = offset % span;
                let src = if block % 2 == 0 {
                    // Reflected repeat, walking back down from Nyquist.
                    max_freq - 2 - pos
                } else {
                    // Forward repeat, walking up from just above DC.
                    1 + pos
                };
                arena.synthesis[k] = arena.residual[src] * target_env[k];
            }
        }

        // The Nyquist bin pairs with itself; collapse to a real value. DC
        // keeps its real part so the frame mean survives.
        let nyq = new_max_freq - 1;
        arena.synthesis[nyq] = Complex::new(arena.synthesis[nyq].norm(), 0.0);
        arena.synthesis[0] = Complex::new(arena.synthesis[0].re, 0.0);

        // Conjugate symmetry for a real inverse transform.
        for k in 1..new_max_freq - 1 {
            arena.synthesis[new_fft - k] = arena.synthesis[k].conj();
        }

        let fft_inverse = arena.planner.plan_fft_inverse(new_fft);
        fft_inverse.process(&mut arena.synthesis);
        let norm = 1.0 / new_fft as f64;

        arena.out_frame.clear();
        arena.out_frame.resize(new_len, 0.0);
        let copy = new_len.min(new_fft);
        for k in 0..copy {
            arena.out_frame[k] = arena.synthesis[k].re * norm;
        }

        // Energy normalization before de-emphasis, both sides measured in
        // the pre-emphasized domain.
        let out_rms = rms(&arena.out_frame);
        let gain = if out_rms > RMS_EPSILON {
            (len as f64 / new_len as f64).sqrt() * (in_rms / out_rms) * scales.energy
        } else {
            1.0
        };
        for s in arena.out_frame.iter_mut() {
            *s *= gain;
        }
        lpc::deemphasize(&mut arena.out_frame, alpha);

        arena.out_frame.clone()
    }
}

/// Frequency grid size for recorded correction filters. Frames have varying
/// FFT sizes, so the ratio is sampled on a fixed grid and interpolated back.
const RATIO_FILTER_BINS: usize = 64;

/// Per-frame correction filter: the mapped target envelope over the matched
/// source envelope, sampled on the fixed grid. Gains cancel in the ratio.
fn correction_ratio(mapped: &MappedLsfs) -> Vec<f64> {
    let target = envelope::evaluate(&lsf::lsf_to_lpc(&mapped.target), 1.0, RATIO_FILTER_BINS);
    let matched = envelope::evaluate(
        &lsf::lsf_to_lpc(&mapped.matched_source),
        1.0,
        RATIO_FILTER_BINS,
    );
    target
        .iter()
        .zip(matched.iter())
        .map(|(&t, &m)| t / m.max(ENVELOPE_FLOOR))
        .collect()
}

/// Multiplies an envelope by a correction filter recorded on the fixed grid,
/// linearly interpolated onto the envelope's grid.
fn apply_correction_ratio(env: &[f64], ratio: &[f64]) -> Vec<f64> {
    if env.is_empty() || ratio.is_empty() {
        return env.to_vec();
    }
    let last = (ratio.len() - 1) as f64;
    let denom = (env.len() - 1).max(1) as f64;
    env.iter()
        .enumerate()
        .map(|(k, &e)| {
            let pos = k as f64 / denom * last;
            let i = pos.floor() as usize;
            let frac = pos - i as f64;
            let r = if i + 1 < ratio.len() {
                ratio[i] * (1.0 - frac) + ratio[i + 1] * frac
            } else {
                ratio[ratio.len() - 1]
            };
            e * r
        })
        .collect()
}

/// Analysis-only path used for skipped frames during the recording pass.
fn analyze_frame(
    arena: &mut SynthesisArena,
    frame: &Frame,
    alpha: f64,
    lpc_order: usize,
    params: &TransformParams,
) -> envelope::EnvelopeEstimate {
    arena.frame.clear();
    arena.frame.extend_from_slice(&frame.samples);
    lpc::preemphasize(&mut arena.frame, alpha);
    let window = generate_window(params.window, frame.samples.len());
    apply_window(&mut arena.frame, &window);
    envelope::estimate(&arena.frame, lpc_order)
}

/// Pitch-scaled frame length: rounded, forced even, floored at 4 samples.
fn scaled_frame_length(len: usize, pitch_scale: f64) -> usize {
    let mut new_len = (len as f64 / pitch_scale).round() as usize;
    if new_len % 2 == 1 {
        new_len += 1;
    }
    new_len.max(4)
}

/// Frequency-axis warp simulating vocal tract length change: bin `k` reads
/// the envelope at `round((k+1)/scale) - 1`, clamped into range.
fn warp_envelope(env: &[f64], scale: f64) -> Vec<f64> {
    let n = env.len();
    (0..n)
        .map(|k| {
            let src = ((k + 1) as f64 / scale).round() as isize - 1;
            env[src.clamp(0, n as isize - 1) as usize]
        })
        .collect()
}

fn max_frame_length(
    marks: &PitchMarkSet,
    num_periods: usize,
    mode: &FrameMode,
    input: &AudioBuffer,
) -> usize {
    match mode {
        FrameMode::PitchSynchronous => {
            let mut max_len = 4;
            if marks.marks.len() > num_periods {
                for i in 0..marks.marks.len() - num_periods {
                    let len = marks.marks[i + num_periods] - marks.marks[i];
                    max_len = max_len.max(len + 1);
                }
            }
            max_len
        }
        FrameMode::FixedRate { window_secs, .. } => {
            ((window_secs * input.sample_rate as f64).round() as usize).max(4) + 1
        }
    }
}

fn rms(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    (x.iter().map(|s| s * s).sum::<f64>() / x.len() as f64).sqrt()
}
