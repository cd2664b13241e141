//! Weighted overlap-add accumulator over a fixed-capacity ring.
//!
//! Every sample position holds the sum of all windowed frame contributions
//! that overlap it plus the sum of the corresponding window weights. A
//! position is normalized and flushed out exactly once, when the synthesis
//! pointer moves past it; flushed positions are gone for good.

use crate::core::fft::WEIGHT_EPSILON;
use crate::error::MorphError;

/// Fixed-capacity circular (value, weight) accumulator.
///
/// The buffer never allocates after construction. Contributions must arrive
/// at non-decreasing start positions; `advance_to` flushes everything before
/// the new start so ring slots can be reused.
#[derive(Debug, Clone)]
pub struct OverlapAddBuffer {
    values: Vec<f64>,
    weights: Vec<f64>,
    /// Ring slot holding the sample at absolute position `start`.
    origin: usize,
    /// Absolute position of the first unflushed sample.
    start: usize,
    /// Absolute position one past the furthest contribution so far.
    end: usize,
}

impl OverlapAddBuffer {
    /// Creates a buffer able to hold `capacity` in-flight sample positions.
    ///
    /// Capacity must be at least the maximum transformed frame length.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity],
            weights: vec![0.0; capacity],
            origin: 0,
            start: 0,
            end: 0,
        }
    }

    /// Fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Absolute position of the first sample not yet flushed.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    fn slot(&self, abs: usize) -> usize {
        (self.origin + (abs - self.start)) % self.capacity()
    }

    /// Flushes all positions before `position` into `out`.
    ///
    /// Flushed samples are weight-normalized; positions that never received
    /// a contribution emit silence.
    pub fn advance_to(&mut self, position: usize, out: &mut Vec<f64>) {
        while self.start < position {
            if self.start < self.end {
                let slot = self.origin;
                let w = self.weights[slot];
                let v = self.values[slot];
                out.push(if w > WEIGHT_EPSILON { v / w } else { v });
                self.values[slot] = 0.0;
                self.weights[slot] = 0.0;
                self.origin = (self.origin + 1) % self.capacity();
            } else {
                // Gap the synthesis pointer skipped over.
                out.push(0.0);
                self.origin = (self.origin + 1) % self.capacity();
                self.end = self.start + 1;
            }
            self.start += 1;
        }
        self.end = self.end.max(self.start);
    }

    /// Adds a windowed frame starting at absolute `position`.
    ///
    /// `samples` are the already-weighted contribution values; `weights` are
    /// the matching window weights added to the weight accumulator.
    pub fn accumulate(
        &mut self,
        position: usize,
        samples: &[f64],
        weights: &[f64],
    ) -> Result<(), MorphError> {
        if position < self.start {
            return Err(MorphError::InvalidParams(
                "overlap-add contribution behind flushed region".to_string(),
            ));
        }
        let span = position + samples.len();
        if span > self.start + self.capacity() {
            return Err(MorphError::InvalidParams(format!(
                "overlap-add frame of {} samples exceeds buffer capacity {}",
                samples.len(),
                self.capacity()
            )));
        }
        for (i, (&s, &w)) in samples.iter().zip(weights.iter()).enumerate() {
            let slot = self.slot(position + i);
            self.values[slot] += s;
            self.weights[slot] += w;
        }
        self.end = self.end.max(span);
        Ok(())
    }

    /// Flushes every remaining position into `out` (end of utterance).
    pub fn drain(&mut self, out: &mut Vec<f64>) {
        let end = self.end;
        self.advance_to(end, out);
    }
}
