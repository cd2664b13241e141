//! Identity transformation: unity scales should approximately reproduce
//! the input in duration, energy and spectral content.

mod common;

use common::*;
use voicemorph::{transform, TransformParams};

#[test]
fn identity_preserves_duration() {
    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000);
    let output = transform(&input, &params).unwrap();

    let diff = output.data.len() as f64 - input.data.len() as f64;
    assert!(
        diff.abs() < 400.0,
        "identity drifted {} samples over {}",
        diff,
        input.data.len()
    );
}

#[test]
fn identity_preserves_energy_ballpark() {
    let input = buffer(gen_voice(180.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000);
    let output = transform(&input, &params).unwrap();

    let ratio = rms(&output.data) / rms(&input.data);
    assert!(
        ratio > 0.4 && ratio < 1.6,
        "identity energy ratio {}",
        ratio
    );
}

#[test]
fn identity_keeps_fundamental() {
    let input = buffer(gen_voice(200.0, 16000, 9600), 16000);
    let params = TransformParams::new(16000);
    let output = transform(&input, &params).unwrap();

    let f = dominant_frequency(&output.data, 16000);
    assert!((f - 200.0).abs() < 30.0, "identity moved pitch to {} Hz", f);
}

#[test]
fn identity_output_is_finite() {
    let input = buffer(gen_voice(120.0, 16000, 6400), 16000);
    let params = TransformParams::new(16000);
    let output = transform(&input, &params).unwrap();
    assert!(output.data.iter().all(|s| s.is_finite()));
}

#[test]
fn silence_stays_silent() {
    let input = buffer(vec![0.0; 8000], 16000);
    let params = TransformParams::new(16000);
    let output = transform(&input, &params).unwrap();
    assert!(!output.is_empty());
    assert!(output.data.iter().all(|&s| s == 0.0));
}
