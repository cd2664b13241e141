//! Prosody transformation: per-frame target f0 derivation.
//!
//! The transformer turns the utterance's source contour into a target f0
//! value per fixed-rate frame index, either by direct pitch-scale
//! application or by mapping the source statistics onto externally supplied
//! target statistics. Pitch-synchronous frames look the result up through
//! the nearest contour index for their frame time.

use serde::{Deserialize, Serialize};

use crate::analysis::pitch::{PitchContour, VOICED_F0_FLOOR};
use crate::core::types::{ScaleSchedule, MAX_SCALE, MIN_SCALE};

/// Target-f0 derivation method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum F0Mapping {
    /// Target f0 follows the source contour; only the pitch-scale schedule
    /// shifts it.
    Direct,
    /// Mean/variance normalization of the source contour onto target
    /// statistics, then the pitch-scale schedule on top.
    Statistics { target_mean: f64, target_std: f64 },
}

/// Per-utterance target f0 schedule, aligned 1:1 with contour frame indices.
#[derive(Debug, Clone)]
pub struct ProsodyTransformer {
    target_f0: Vec<f64>,
}

impl ProsodyTransformer {
    /// Computes the target contour for the whole utterance.
    pub fn new(contour: &PitchContour, mapping: &F0Mapping, pitch_scale: &ScaleSchedule) -> Self {
        let (src_mean, src_std) = contour.voiced_statistics();
        let target_f0 = contour
            .f0
            .iter()
            .enumerate()
            .map(|(i, &f0)| {
                if f0 <= VOICED_F0_FLOOR {
                    return 0.0;
                }
                let base = match mapping {
                    F0Mapping::Direct => f0,
                    F0Mapping::Statistics {
                        target_mean,
                        target_std,
                    } => {
                        if src_std > 1e-9 {
                            (f0 - src_mean) / src_std * target_std + target_mean
                        } else {
                            *target_mean
                        }
                    }
                };
                (base * pitch_scale.at(i)).max(0.0)
            })
            .collect();
        Self { target_f0 }
    }

    /// Target f0 for the given contour index; 0.0 when out of range.
    pub fn target_f0(&self, index: usize) -> f64 {
        self.target_f0.get(index).copied().unwrap_or(0.0)
    }

    /// Number of schedule entries.
    pub fn len(&self) -> usize {
        self.target_f0.len()
    }

    /// True when the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.target_f0.is_empty()
    }

    /// Pitch scale for a frame: `target / current` when both sides are
    /// reliably voiced, else 1.0; clamped to [0.1, 5.0].
    pub fn pitch_scale_for(&self, current_f0: f64, index: usize) -> f64 {
        let target = self.target_f0(index);
        if current_f0 > VOICED_F0_FLOOR && target > VOICED_F0_FLOOR {
            (target / current_f0).clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        }
    }
}
