//! Voice conversion paths: codebook mapping and f0 statistics mapping.

mod common;

use common::*;
use voicemorph::{transform, CodebookEntry, F0Mapping, MapperConfig, TransformParams};

#[test]
fn f0_statistics_mapping_retargets_pitch() {
    let input = buffer(gen_voice(200.0, 16000, 9600), 16000);
    let mut params = TransformParams::new(16000);
    params.f0_mapping = F0Mapping::Statistics {
        target_mean: 300.0,
        target_std: 10.0,
    };
    let output = transform(&input, &params).unwrap();

    let f = dominant_frequency(&output.data, 16000);
    assert!(
        (f - 300.0).abs() < 50.0,
        "statistics mapping landed at {} Hz, expected near 300",
        f
    );
}

#[test]
fn codebook_mapper_produces_finite_output() {
    // Entries whose order matches the engine's LSF order (16 kHz -> 20).
    let order = 20;
    let make_lsfs = |offset: f64| -> Vec<f64> {
        (1..=order)
            .map(|k| (k as f64 + offset) * std::f64::consts::PI / (order as f64 + 2.0))
            .collect()
    };
    let entries = vec![
        CodebookEntry {
            source: make_lsfs(0.0),
            target: make_lsfs(0.2),
            label: None,
        },
        CodebookEntry {
            source: make_lsfs(0.3),
            target: make_lsfs(0.5),
            label: None,
        },
        CodebookEntry {
            source: make_lsfs(0.6),
            target: make_lsfs(0.8),
            label: None,
        },
    ];

    let input = buffer(gen_voice(180.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000).with_mapper(MapperConfig::Codebook {
        entries,
        num_neighbors: 2,
        labels: vec![],
        context_neighbors: 0,
    });
    let output = transform(&input, &params).unwrap();
    assert!(!output.is_empty());
    assert!(output.data.iter().all(|s| s.is_finite()));
}

#[test]
fn empty_codebook_is_invalid() {
    let params = TransformParams::new(16000).with_mapper(MapperConfig::Codebook {
        entries: vec![],
        num_neighbors: 2,
        labels: vec![],
        context_neighbors: 0,
    });
    assert!(params.validate().is_err());
}

#[test]
fn order_mismatched_codebook_falls_back_to_identity() {
    // 8-dimensional entries against a 20-order engine: the mapper passes
    // the source through unchanged and the transform still works.
    let entries = vec![CodebookEntry {
        source: vec![0.3; 8],
        target: vec![0.5; 8],
        label: None,
    }];
    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000).with_mapper(MapperConfig::Codebook {
        entries,
        num_neighbors: 1,
        labels: vec![],
        context_neighbors: 0,
    });
    let output = transform(&input, &params).unwrap();
    assert!(output.data.iter().all(|s| s.is_finite()));
}
