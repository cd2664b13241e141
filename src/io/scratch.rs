//! Raw sample scratch streams.
//!
//! Long transformations stream synthesized samples to a headerless
//! little-endian `f64` scratch file as they are flushed, then repackage the
//! stream into a WAV file once the final length and peak are known. The
//! repackaging step peak-normalizes when the synthesized signal clips.

use std::io::{Read, Write};

use crate::core::types::{AudioBuffer, Sample};
use crate::error::MorphError;

/// Writes samples to a scratch stream as little-endian `f64`.
pub struct ScratchWriter<W: Write> {
    inner: W,
    written: usize,
    peak: f64,
}

impl<W: Write> ScratchWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            written: 0,
            peak: 0.0,
        }
    }

    /// Appends samples, tracking the running peak.
    pub fn write_samples(&mut self, samples: &[Sample]) -> Result<(), MorphError> {
        for &s in samples {
            self.inner.write_all(&s.to_le_bytes())?;
            self.peak = self.peak.max(s.abs());
        }
        self.written += samples.len();
        Ok(())
    }

    /// Samples written so far.
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Largest absolute sample seen so far.
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, MorphError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads a whole little-endian `f64` scratch stream.
pub fn read_scratch<R: Read>(reader: &mut R) -> Result<Vec<Sample>, MorphError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() % 8 != 0 {
        return Err(MorphError::InvalidFormat(format!(
            "scratch stream length {} is not a multiple of 8",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect())
}

/// Scales samples down to unity peak when they clip; below-peak signals
/// pass through untouched.
pub fn normalize_clipping(samples: &mut [Sample]) -> f64 {
    let peak = samples.iter().fold(0.0f64, |m, &s| m.max(s.abs()));
    if peak > 1.0 {
        let scale = 1.0 / peak;
        for s in samples.iter_mut() {
            *s *= scale;
        }
        scale
    } else {
        1.0
    }
}

/// Repackages a scratch stream into an audio buffer, normalizing if the
/// stream clips.
pub fn repackage<R: Read>(reader: &mut R, sample_rate: u32) -> Result<AudioBuffer, MorphError> {
    let mut samples = read_scratch(reader)?;
    normalize_clipping(&mut samples);
    AudioBuffer::new(samples, sample_rate)
}
