//! Vocal tract mapping capability.
//!
//! The resynthesis engine asks a `VocalTractMapper` for a target LSF set per
//! frame and stays agnostic of how the mapping is produced. The shipped
//! implementations are the identity map and a weighted nearest-neighbor
//! codebook search with optional phonetic-context preselection; the trait is
//! the seam for richer regressors.

use serde::{Deserialize, Serialize};

use crate::error::MorphError;

/// Mapper output for one frame.
#[derive(Debug, Clone)]
pub struct MappedLsfs {
    /// Target vocal tract shape.
    pub target: Vec<f64>,
    /// The source-side estimate matched during the search, usable for
    /// ratio-based filtering and smoothing.
    pub matched_source: Vec<f64>,
}

/// Maps source LSFs to target LSFs, one frame at a time.
pub trait VocalTractMapper {
    /// Maps the given source LSFs; `time` is the frame center in seconds,
    /// used by context-aware implementations.
    fn map(&mut self, source_lsfs: &[f64], time: f64) -> MappedLsfs;
}

/// One codebook pair of source and target vocal tract shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebookEntry {
    pub source: Vec<f64>,
    pub target: Vec<f64>,
    /// Phonetic label this entry was trained from, if any.
    pub label: Option<String>,
}

/// A phonetic label with its start time in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEntry {
    pub time: f64,
    pub label: String,
}

/// Tagged mapper selection. One configuration enum covers every mapper
/// variant so parameter files stay a single serde type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MapperConfig {
    /// Target equals source; prosody-only transformation.
    Identity,
    /// Weighted k-nearest-neighbor search over an LSF codebook.
    Codebook {
        entries: Vec<CodebookEntry>,
        /// Neighbors averaged into the mapped shape.
        num_neighbors: usize,
        /// Input utterance labels for context preselection, if available.
        labels: Vec<LabelEntry>,
        /// How many label-matched entries are preselected before the LSF
        /// distance search; 0 disables preselection.
        context_neighbors: usize,
    },
}

impl MapperConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), MorphError> {
        match self {
            MapperConfig::Identity => Ok(()),
            MapperConfig::Codebook {
                entries,
                num_neighbors,
                ..
            } => {
                if entries.is_empty() {
                    return Err(MorphError::InvalidParams(
                        "codebook has no entries".to_string(),
                    ));
                }
                if *num_neighbors == 0 {
                    return Err(MorphError::InvalidParams(
                        "codebook num_neighbors must be at least 1".to_string(),
                    ));
                }
                for entry in entries {
                    if entry.source.len() != entry.target.len() {
                        return Err(MorphError::InvalidParams(
                            "codebook entry source/target order mismatch".to_string(),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// Builds the mapper this configuration describes.
    pub fn build(&self) -> Box<dyn VocalTractMapper> {
        match self {
            MapperConfig::Identity => Box::new(IdentityMapper),
            MapperConfig::Codebook {
                entries,
                num_neighbors,
                labels,
                context_neighbors,
            } => Box::new(CodebookMapper {
                entries: entries.clone(),
                num_neighbors: (*num_neighbors).max(1),
                labels: labels.clone(),
                context_neighbors: *context_neighbors,
            }),
        }
    }
}

/// Target equals source.
pub struct IdentityMapper;

impl VocalTractMapper for IdentityMapper {
    fn map(&mut self, source_lsfs: &[f64], _time: f64) -> MappedLsfs {
        MappedLsfs {
            target: source_lsfs.to_vec(),
            matched_source: source_lsfs.to_vec(),
        }
    }
}

/// Weighted k-nearest-neighbor codebook search.
pub struct CodebookMapper {
    entries: Vec<CodebookEntry>,
    num_neighbors: usize,
    labels: Vec<LabelEntry>,
    context_neighbors: usize,
}

impl CodebookMapper {
    /// Label active at time `t`, by nearest start time at or before `t`.
    fn label_at(&self, t: f64) -> Option<&str> {
        let mut current: Option<&str> = None;
        for entry in &self.labels {
            if entry.time <= t {
                current = Some(&entry.label);
            } else {
                break;
            }
        }
        current
    }

    /// Candidate entry indices after context preselection.
    fn candidates(&self, t: f64) -> Vec<usize> {
        if self.context_neighbors == 0 || self.labels.is_empty() {
            return (0..self.entries.len()).collect();
        }
        let Some(label) = self.label_at(t) else {
            return (0..self.entries.len()).collect();
        };
        let matched: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.label.as_deref() == Some(label))
            .map(|(i, _)| i)
            .take(self.context_neighbors)
            .collect();
        if matched.len() >= self.num_neighbors {
            matched
        } else {
            // Too few context matches; fall back to the whole book.
            (0..self.entries.len()).collect()
        }
    }
}

fn lsf_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl VocalTractMapper for CodebookMapper {
    fn map(&mut self, source_lsfs: &[f64], time: f64) -> MappedLsfs {
        let order = source_lsfs.len();
        let mut scored: Vec<(f64, usize)> = self
            .candidates(time)
            .into_iter()
            .filter(|&i| self.entries[i].source.len() == order)
            .map(|i| (lsf_distance(source_lsfs, &self.entries[i].source), i))
            .collect();

        if scored.is_empty() {
            // No entry of a compatible order; degrade to identity.
            return MappedLsfs {
                target: source_lsfs.to_vec(),
                matched_source: source_lsfs.to_vec(),
            };
        }

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.num_neighbors);

        let mut weights: Vec<f64> = scored.iter().map(|(d, _)| 1.0 / (d + 1e-9)).collect();
        let total: f64 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= total;
        }

        let mut target = vec![0.0; order];
        let mut matched = vec![0.0; order];
        for (&w, &(_, idx)) in weights.iter().zip(scored.iter()) {
            let entry = &self.entries[idx];
            for k in 0..order {
                target[k] += w * entry.target[k];
                matched[k] += w * entry.source[k];
            }
        }

        MappedLsfs {
            target,
            matched_source: matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(src: &[f64], tgt: &[f64], label: Option<&str>) -> CodebookEntry {
        CodebookEntry {
            source: src.to_vec(),
            target: tgt.to_vec(),
            label: label.map(str::to_string),
        }
    }

    #[test]
    fn identity_maps_to_itself() {
        let mut mapper = IdentityMapper;
        let out = mapper.map(&[0.3, 0.9, 1.7], 0.0);
        assert_eq!(out.target, vec![0.3, 0.9, 1.7]);
        assert_eq!(out.matched_source, out.target);
    }

    #[test]
    fn exact_codebook_hit_returns_its_target() {
        let config = MapperConfig::Codebook {
            entries: vec![
                entry(&[0.4, 1.0], &[0.5, 1.2], None),
                entry(&[2.0, 2.8], &[1.9, 2.7], None),
            ],
            num_neighbors: 1,
            labels: vec![],
            context_neighbors: 0,
        };
        config.validate().unwrap();
        let mut mapper = config.build();
        let out = mapper.map(&[0.4, 1.0], 0.0);
        assert!((out.target[0] - 0.5).abs() < 1e-9);
        assert!((out.target[1] - 1.2).abs() < 1e-9);
        assert!((out.matched_source[0] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn neighbor_weighting_favors_the_closer_entry() {
        let config = MapperConfig::Codebook {
            entries: vec![
                entry(&[1.0], &[10.0], None),
                entry(&[2.0], &[20.0], None),
            ],
            num_neighbors: 2,
            labels: vec![],
            context_neighbors: 0,
        };
        let mut mapper = config.build();
        let out = mapper.map(&[1.1], 0.0);
        assert!(out.target[0] > 10.0 && out.target[0] < 15.0);
    }

    #[test]
    fn order_mismatch_degrades_to_identity() {
        let config = MapperConfig::Codebook {
            entries: vec![entry(&[1.0, 2.0], &[1.0, 2.0], None)],
            num_neighbors: 1,
            labels: vec![],
            context_neighbors: 0,
        };
        let mut mapper = config.build();
        let out = mapper.map(&[0.5, 1.5, 2.5], 0.0);
        assert_eq!(out.target, vec![0.5, 1.5, 2.5]);
    }

    #[test]
    fn context_preselection_restricts_candidates() {
        let config = MapperConfig::Codebook {
            entries: vec![
                entry(&[1.0], &[100.0], Some("aa")),
                entry(&[1.01], &[200.0], Some("iy")),
            ],
            num_neighbors: 1,
            labels: vec![
                LabelEntry {
                    time: 0.0,
                    label: "aa".to_string(),
                },
                LabelEntry {
                    time: 0.5,
                    label: "iy".to_string(),
                },
            ],
            context_neighbors: 4,
        };
        let mut mapper = config.build();
        // At t=0.1 the active label is "aa", so the slightly-farther "aa"
        // entry must win over the closer "iy" one.
        let out = mapper.map(&[1.005], 0.1);
        assert!((out.target[0] - 100.0).abs() < 1e-9);
        let out = mapper.map(&[1.005], 0.6);
        assert!((out.target[0] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn validation_rejects_bad_configs() {
        assert!(MapperConfig::Codebook {
            entries: vec![],
            num_neighbors: 1,
            labels: vec![],
            context_neighbors: 0,
        }
        .validate()
        .is_err());

        assert!(MapperConfig::Codebook {
            entries: vec![entry(&[1.0], &[1.0, 2.0], None)],
            num_neighbors: 1,
            labels: vec![],
            context_neighbors: 0,
        }
        .validate()
        .is_err());

        assert!(MapperConfig::Identity.validate().is_ok());
    }
}
