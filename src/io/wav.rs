//! Minimal WAV reading and writing.
//!
//! The transformation path is mono `f64`; the reader downmixes stereo input
//! by averaging channel pairs and widens every supported sample format to
//! `f64`. Supported input formats: 16-bit PCM, 24-bit PCM and 32-bit IEEE
//! float. Output is 16-bit PCM or 32-bit float, always mono.

use std::io::{Read, Write};

use crate::core::types::{AudioBuffer, Sample};
use crate::error::MorphError;

const WAV_FORMAT_PCM: u16 = 1;
const WAV_FORMAT_IEEE_FLOAT: u16 = 3;

/// Parses a WAV byte stream into a mono audio buffer.
pub fn read_wav(data: &[u8]) -> Result<AudioBuffer, MorphError> {
    if data.len() < 44 {
        return Err(MorphError::InvalidFormat("WAV file too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(MorphError::InvalidFormat("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(MorphError::InvalidFormat(
            "missing WAVE identifier".to_string(),
        ));
    }

    let mut format_code: u16 = 0;
    let mut num_channels: u16 = 0;
    let mut sample_rate: u32 = 0;
    let mut bits_per_sample: u16 = 0;
    let mut audio_data: &[u8] = &[];

    let mut cursor = 12;
    while cursor + 8 <= data.len() {
        let chunk_id = &data[cursor..cursor + 4];
        cursor += 4;
        let chunk_size = read_u32_le(data, cursor) as usize;
        cursor += 4;

        if chunk_id == b"fmt " {
            if cursor + 16 > data.len() {
                return Err(MorphError::InvalidFormat("fmt chunk too short".to_string()));
            }
            format_code = read_u16_le(data, cursor);
            num_channels = read_u16_le(data, cursor + 2);
            sample_rate = read_u32_le(data, cursor + 4);
            // byte rate and block align skipped
            bits_per_sample = read_u16_le(data, cursor + 14);
        } else if chunk_id == b"data" {
            audio_data = if cursor + chunk_size > data.len() {
                // Truncated file: take what is there.
                &data[cursor..]
            } else {
                &data[cursor..cursor + chunk_size]
            };
        }

        cursor += chunk_size;
        // Chunks are word-aligned.
        if chunk_size % 2 == 1 {
            cursor += 1;
        }
    }

    if sample_rate == 0 {
        return Err(MorphError::InvalidFormat("no fmt chunk found".to_string()));
    }
    if num_channels == 0 || num_channels > 2 {
        return Err(MorphError::InvalidFormat(format!(
            "unsupported channel count: {}",
            num_channels
        )));
    }

    let interleaved: Vec<Sample> = match (format_code, bits_per_sample) {
        (WAV_FORMAT_PCM, 16) => audio_data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64 / 32768.0)
            .collect(),
        (WAV_FORMAT_PCM, 24) => audio_data
            .chunks_exact(3)
            .map(|b| {
                let raw = (b[0] as i32) | ((b[1] as i32) << 8) | ((b[2] as i32) << 16);
                let raw = if raw & 0x80_0000 != 0 {
                    raw | !0xFF_FFFF
                } else {
                    raw
                };
                raw as f64 / 8388608.0
            })
            .collect(),
        (WAV_FORMAT_IEEE_FLOAT, 32) => audio_data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        (fmt, bits) => {
            return Err(MorphError::InvalidFormat(format!(
                "unsupported WAV format: code={}, bits={}",
                fmt, bits
            )))
        }
    };

    let samples = if num_channels == 2 {
        interleaved
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) * 0.5)
            .collect()
    } else {
        interleaved
    };

    AudioBuffer::new(samples, sample_rate)
}

/// Reads a WAV file from disk.
pub fn read_wav_file(path: &str) -> Result<AudioBuffer, MorphError> {
    let mut file =
        std::fs::File::open(path).map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    read_wav(&data)
}

fn wav_header(sample_rate: u32, format_code: u16, bits_per_sample: u16, data_size: u32) -> Vec<u8> {
    let byte_rate = sample_rate * (bits_per_sample as u32 / 8);
    let block_align = bits_per_sample / 8;
    let file_size = 36 + data_size;

    let mut out = Vec::with_capacity(44 + data_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&format_code.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out
}

/// Encodes an audio buffer as 16-bit PCM WAV bytes.
pub fn write_wav_16bit(buffer: &AudioBuffer) -> Vec<u8> {
    let data_size = (buffer.data.len() * 2) as u32;
    let mut out = wav_header(buffer.sample_rate, WAV_FORMAT_PCM, 16, data_size);
    for &sample in &buffer.data {
        let raw = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        out.extend_from_slice(&raw.to_le_bytes());
    }
    out
}

/// Encodes an audio buffer as 32-bit float WAV bytes.
pub fn write_wav_float(buffer: &AudioBuffer) -> Vec<u8> {
    let data_size = (buffer.data.len() * 4) as u32;
    let mut out = wav_header(buffer.sample_rate, WAV_FORMAT_IEEE_FLOAT, 32, data_size);
    for &sample in &buffer.data {
        out.extend_from_slice(&(sample as f32).to_le_bytes());
    }
    out
}

/// Writes a 16-bit PCM WAV file to disk.
pub fn write_wav_file_16bit(path: &str, buffer: &AudioBuffer) -> Result<(), MorphError> {
    let data = write_wav_16bit(buffer);
    let mut file = std::fs::File::create(path)
        .map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    file.write_all(&data)
        .map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    Ok(())
}

/// Writes a 32-bit float WAV file to disk.
pub fn write_wav_file_float(path: &str, buffer: &AudioBuffer) -> Result<(), MorphError> {
    let data = write_wav_float(buffer);
    let mut file = std::fs::File::create(path)
        .map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    file.write_all(&data)
        .map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    Ok(())
}

#[inline]
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
