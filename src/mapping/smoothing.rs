//! Two-pass vocal tract smoothing.
//!
//! Frame-to-frame discontinuity in the mapped vocal tract parameters is
//! reduced by neighbor-averaging the per-frame LSF vectors. The averaging
//! window spans frames not yet computed at synthesis time, so the engine
//! runs a recording pass first, smooths the recorded sequence, and replays
//! it during the actual transformation pass.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::MorphError;

/// Which per-frame vector the smoothing pass records and replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingSource {
    /// Smooth the estimated source LSFs before mapping.
    SourceLsfs,
    /// Smooth the mapper's target LSFs.
    MappedLsfs,
    /// Smooth the per-frame correction filter, the mapped target envelope
    /// over the matched source envelope on a fixed frequency grid.
    RatioFilter,
}

/// Smoothing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingParams {
    pub source: SmoothingSource,
    /// Neighbors averaged on each side of a frame.
    pub neighbors: usize,
}

impl SmoothingParams {
    pub fn validate(&self) -> Result<(), MorphError> {
        if self.neighbors == 0 {
            return Err(MorphError::InvalidParams(
                "smoothing neighbor count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Engine-side state of the two-pass smoothing machine. Invalid flag
/// combinations of the record/apply lifecycle are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingState {
    Off,
    Record,
    Apply,
}

/// A recorded sequence of per-frame vectors, one per analysis frame: LSFs
/// for the LSF sources, sampled filter ratios for [`SmoothingSource::RatioFilter`].
///
/// Acts as the explicit buffered intermediate between the two passes; it can
/// be persisted to a scratch stream when the sequence should outlive the
/// process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LsfSequence {
    frames: Vec<Vec<f64>>,
}

impl LsfSequence {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, lsfs: Vec<f64>) {
        self.frames.push(lsfs);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// Neighbor-averages every frame over `neighbors` frames on each side.
    ///
    /// Only neighbors of the same LSF order participate; a frame with no
    /// compatible neighbors passes through unchanged (degenerate frames keep
    /// their reduced-order vectors).
    pub fn smoothed(&self, neighbors: usize) -> LsfSequence {
        let mut out = Vec::with_capacity(self.frames.len());
        for (i, center) in self.frames.iter().enumerate() {
            let lo = i.saturating_sub(neighbors);
            let hi = (i + neighbors).min(self.frames.len().saturating_sub(1));
            let order = center.len();

            let mut avg = vec![0.0; order];
            let mut count = 0usize;
            for frame in &self.frames[lo..=hi] {
                if frame.len() == order {
                    for (a, &v) in avg.iter_mut().zip(frame.iter()) {
                        *a += v;
                    }
                    count += 1;
                }
            }
            if count == 0 {
                out.push(center.clone());
            } else {
                for a in avg.iter_mut() {
                    *a /= count as f64;
                }
                out.push(avg);
            }
        }
        LsfSequence { frames: out }
    }

    /// Writes the sequence as a little-endian scratch stream.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), MorphError> {
        writer.write_all(&(self.frames.len() as u32).to_le_bytes())?;
        for frame in &self.frames {
            writer.write_all(&(frame.len() as u32).to_le_bytes())?;
            for &v in frame {
                writer.write_all(&v.to_le_bytes())?;
            }
        }
        Ok(())
    }

    /// Reads a sequence written by `write_to`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MorphError> {
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];
        reader.read_exact(&mut buf4)?;
        let count = u32::from_le_bytes(buf4) as usize;
        let mut frames = Vec::with_capacity(count.min(1 << 20));
        for _ in 0..count {
            reader.read_exact(&mut buf4)?;
            let len = u32::from_le_bytes(buf4) as usize;
            let mut frame = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                reader.read_exact(&mut buf8)?;
                frame.push(f64::from_le_bytes(buf8));
            }
            frames.push(frame);
        }
        Ok(Self { frames })
    }
}
