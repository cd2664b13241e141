//! End-to-end file workflows: WAV in, WAV out, and contour persistence.

mod common;

use common::*;
use voicemorph::io::{contour, wav};
use voicemorph::{transform_wav_file, PitchContour, TransformParams};

fn temp_path(name: &str) -> String {
    let mut path = std::env::temp_dir();
    path.push(format!("voicemorph-test-{}-{}", std::process::id(), name));
    path.to_string_lossy().into_owned()
}

#[test]
fn wav_file_workflow() {
    let in_path = temp_path("in.wav");
    let out_path = temp_path("out.wav");

    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    wav::write_wav_file_16bit(&in_path, &input).unwrap();

    let params = TransformParams::new(16000).with_pitch_scale(1.4);
    transform_wav_file(&in_path, &out_path, &params).unwrap();

    let output = wav::read_wav_file(&out_path).unwrap();
    assert_eq!(output.sample_rate, 16000);
    assert!(!output.is_empty());
    assert!(output.peak() <= 1.0);

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn missing_input_file_errors() {
    let params = TransformParams::new(16000);
    let out_path = temp_path("never.wav");
    assert!(transform_wav_file("/nonexistent/input.wav", &out_path, &params).is_err());
}

#[test]
fn contour_file_roundtrip() {
    let path = temp_path("contour.bin");
    let original = PitchContour {
        f0: vec![110.0, 0.0, 123.5, 118.0, 0.0],
        window_secs: 0.040,
        skip_secs: 0.010,
        sample_rate: 16000,
    };
    contour::write_contour_file(&path, &original).unwrap();
    let back = contour::read_contour_file(&path).unwrap();
    assert_eq!(back.f0, original.f0);
    assert_eq!(back.sample_rate, original.sample_rate);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn float_wav_preserves_precision() {
    let input = buffer(gen_sine(300.0, 16000, 1000, 0.123456), 16000);
    let bytes = wav::write_wav_float(&input);
    let decoded = wav::read_wav(&bytes).unwrap();
    for (a, b) in decoded.data.iter().zip(input.data.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
}
