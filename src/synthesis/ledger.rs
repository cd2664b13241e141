//! Duration ledger: skip/repeat planning for time-scale compensation.
//!
//! Pitch scaling changes each output frame's length, so the desired duration
//! (input length times the time scale) is reconciled by skipping or
//! repeating whole synthesis frames. The running difference carries forward
//! between frames and is forced to zero by the final frame's extra repeats.
//! The 0.1-period decision band is an empirically tuned constant.

/// Fraction of the new synthesis period below which a local duration
/// difference is ignored.
const DECISION_BAND: f64 = 0.1;

/// What to do with the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Number of times the frame is emitted; 0 means skipped.
    pub emissions: usize,
}

/// Running duration difference tracker.
#[derive(Debug, Clone, Default)]
pub struct DurationLedger {
    /// Carry-forward value in samples, added to the next local difference.
    next_add: f64,
}

impl DurationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current carry in samples.
    pub fn carry(&self) -> f64 {
        self.next_add
    }

    /// Plans the current frame.
    ///
    /// `frame_len` is the analysis frame length, `new_frame_len` the
    /// pitch-scaled synthesis length, `new_period` the synthesis period.
    /// On the last frame any remaining positive carry becomes additional
    /// repeats, plus one forced repetition to flush the overlap-add tail.
    pub fn plan(
        &mut self,
        frame_len: usize,
        new_frame_len: usize,
        new_period: f64,
        time_scale: f64,
        num_periods: usize,
        is_last: bool,
    ) -> FramePlan {
        let mut repeat_skip: i64 = 0;
        let mut local_diff = self.next_add
            + (frame_len as f64 * time_scale - new_frame_len as f64) / num_periods as f64;
        self.next_add = 0.0;

        if local_diff < -DECISION_BAND * new_period {
            repeat_skip -= 1;
            self.next_add = new_period + local_diff;
        } else if local_diff > DECISION_BAND * new_period {
            while local_diff > DECISION_BAND * new_period {
                repeat_skip += 1;
                local_diff -= new_period;
            }
            self.next_add = local_diff;
        }

        if is_last {
            while self.next_add > 0.0 {
                repeat_skip += 1;
                self.next_add -= new_period;
            }
            self.next_add = 0.0;
            repeat_skip += 1;
        }

        FramePlan {
            emissions: (repeat_skip + 1).max(0) as usize,
        }
    }
}
