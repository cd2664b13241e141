#![allow(dead_code)]

use std::f64::consts::PI;

use voicemorph::AudioBuffer;

/// Mono sine wave.
pub fn gen_sine(freq_hz: f64, sr: u32, n: usize, amp: f64) -> Vec<f64> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f64 / sr as f64).sin())
        .collect()
}

/// Harmonic "voice": fundamental plus two decaying harmonics, so the pitch
/// tracker locks onto the fundamental reliably.
pub fn gen_voice(f0: f64, sr: u32, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sr as f64;
            0.4 * (2.0 * PI * f0 * t).sin()
                + 0.2 * (2.0 * PI * 2.0 * f0 * t).sin()
                + 0.1 * (2.0 * PI * 3.0 * f0 * t).sin()
        })
        .collect()
}

/// Deterministic pseudo-random noise in [-amp, amp].
pub fn gen_noise(n: usize, amp: f64, seed: u64) -> Vec<f64> {
    let mut state = seed.max(1);
    (0..n)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            amp * ((state as f64 / u64::MAX as f64) * 2.0 - 1.0)
        })
        .collect()
}

pub fn buffer(data: Vec<f64>, sr: u32) -> AudioBuffer {
    AudioBuffer::new(data, sr).unwrap()
}

pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
}

/// Goertzel-style spectral energy at one frequency.
pub fn spectral_energy_at(signal: &[f64], sr: u32, freq: f64) -> f64 {
    let n = signal.len();
    if n == 0 {
        return 0.0;
    }
    let mut real = 0.0f64;
    let mut imag = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * PI * freq * i as f64 / sr as f64;
        real += s * angle.cos();
        imag += s * angle.sin();
    }
    ((real * real + imag * imag) / n as f64).sqrt()
}

/// Frequency of the strongest DFT bin over a centered slice.
pub fn dominant_frequency(signal: &[f64], sr: u32) -> f64 {
    let n = signal.len().min(8192).max(16);
    let start = (signal.len() - n) / 2;
    let slice = &signal[start..start + n];

    let mut best_freq = 0.0;
    let mut best_mag = 0.0;
    // Scan 20..=1000 Hz in 2 Hz steps; plenty for test fundamentals.
    let mut f = 20.0;
    while f <= 1000.0 {
        let mag = spectral_energy_at(slice, sr, f);
        if mag > best_mag {
            best_mag = mag;
            best_freq = f;
        }
        f += 2.0;
    }
    best_freq
}
