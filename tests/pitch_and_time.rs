//! Pitch and time scaling behavior on synthetic voiced signals.

mod common;

use common::*;
use voicemorph::{transform, TransformParams};

#[test]
fn octave_up_doubles_fundamental() {
    let input = buffer(gen_voice(200.0, 16000, 9600), 16000);
    let params = TransformParams::new(16000).with_pitch_scale(2.0);
    let output = transform(&input, &params).unwrap();

    let f = dominant_frequency(&output.data, 16000);
    assert!(
        (f - 400.0).abs() < 60.0,
        "octave up landed at {} Hz, expected near 400",
        f
    );
}

#[test]
fn octave_down_halves_fundamental() {
    let input = buffer(gen_voice(200.0, 16000, 9600), 16000);
    let params = TransformParams::new(16000).with_pitch_scale(0.5);
    let output = transform(&input, &params).unwrap();

    let f = dominant_frequency(&output.data, 16000);
    assert!(
        (40.0..140.0).contains(&f),
        "octave down landed at {} Hz, expected near 100",
        f
    );
}

#[test]
fn pitch_shift_preserves_duration() {
    let input = buffer(gen_voice(150.0, 16000, 9600), 16000);
    let params = TransformParams::new(16000).with_pitch_scale(1.5);
    let output = transform(&input, &params).unwrap();

    let ratio = output.data.len() as f64 / input.data.len() as f64;
    assert!(
        (ratio - 1.0).abs() < 0.12,
        "pitch-only transform changed duration by factor {}",
        ratio
    );
}

#[test]
fn pitch_shift_energy_stays_close() {
    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000).with_pitch_scale(0.5);
    let output = transform(&input, &params).unwrap();

    let db = 20.0 * (rms(&output.data) / rms(&input.data)).log10();
    assert!(db.abs() < 9.0, "pitch shift moved energy by {} dB", db);
}

#[test]
fn time_scale_two_doubles_length() {
    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000).with_time_scale(2.0);
    let output = transform(&input, &params).unwrap();

    let ratio = output.data.len() as f64 / input.data.len() as f64;
    assert!(
        (ratio - 2.0).abs() < 0.2,
        "time scale 2.0 produced length ratio {}",
        ratio
    );
}

#[test]
fn time_scale_half_halves_length() {
    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    let params = TransformParams::new(16000).with_time_scale(0.5);
    let output = transform(&input, &params).unwrap();

    let ratio = output.data.len() as f64 / input.data.len() as f64;
    assert!(
        (ratio - 0.5).abs() < 0.12,
        "time scale 0.5 produced length ratio {}",
        ratio
    );
}

#[test]
fn time_scale_keeps_pitch() {
    let input = buffer(gen_voice(200.0, 16000, 9600), 16000);
    let params = TransformParams::new(16000).with_time_scale(1.5);
    let output = transform(&input, &params).unwrap();

    let f = dominant_frequency(&output.data, 16000);
    assert!(
        (f - 200.0).abs() < 30.0,
        "time stretching moved pitch to {} Hz",
        f
    );
}

#[test]
fn combined_pitch_and_time() {
    let input = buffer(gen_voice(160.0, 16000, 9600), 16000);
    let params = TransformParams::new(16000)
        .with_pitch_scale(1.25)
        .with_time_scale(1.3);
    let output = transform(&input, &params).unwrap();

    let len_ratio = output.data.len() as f64 / input.data.len() as f64;
    assert!(
        (len_ratio - 1.3).abs() < 0.2,
        "combined transform length ratio {}",
        len_ratio
    );
    let f = dominant_frequency(&output.data, 16000);
    assert!(
        (f - 200.0).abs() < 40.0,
        "combined transform pitch at {} Hz, expected near 200",
        f
    );
}

#[test]
fn energy_scale_attenuates() {
    let input = buffer(gen_voice(200.0, 16000, 8000), 16000);
    let loud = transform(&input, &TransformParams::new(16000)).unwrap();
    let quiet = transform(
        &input,
        &TransformParams::new(16000).with_energy_scale(0.5),
    )
    .unwrap();

    let ratio = rms(&quiet.data) / rms(&loud.data);
    assert!(
        (ratio - 0.5).abs() < 0.1,
        "energy scale 0.5 gave RMS ratio {}",
        ratio
    );
}
