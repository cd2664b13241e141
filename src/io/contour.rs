//! Binary pitch contour files.
//!
//! Contours computed offline are exchanged as a small little-endian binary
//! file: frame count (u32), sample rate (u32), window and skip in seconds
//! (f64 each), then one f64 per frame. Unvoiced frames store 0.0.

use std::io::{Read, Write};

use crate::analysis::pitch::PitchContour;
use crate::error::MorphError;

/// Serializes a contour to a binary stream.
pub fn write_contour<W: Write>(contour: &PitchContour, writer: &mut W) -> Result<(), MorphError> {
    writer.write_all(&(contour.f0.len() as u32).to_le_bytes())?;
    writer.write_all(&contour.sample_rate.to_le_bytes())?;
    writer.write_all(&contour.window_secs.to_le_bytes())?;
    writer.write_all(&contour.skip_secs.to_le_bytes())?;
    for &f in &contour.f0 {
        writer.write_all(&f.to_le_bytes())?;
    }
    Ok(())
}

/// Deserializes a contour from a binary stream.
pub fn read_contour<R: Read>(reader: &mut R) -> Result<PitchContour, MorphError> {
    let num_frames = read_u32(reader)? as usize;
    let sample_rate = read_u32(reader)?;
    let window_secs = read_f64(reader)?;
    let skip_secs = read_f64(reader)?;

    if sample_rate == 0 {
        return Err(MorphError::InvalidFormat(
            "contour sample rate is 0".to_string(),
        ));
    }
    if !window_secs.is_finite()
        || window_secs <= 0.0
        || !skip_secs.is_finite()
        || skip_secs <= 0.0
    {
        return Err(MorphError::InvalidFormat(
            "contour window and skip must be positive".to_string(),
        ));
    }

    let mut f0 = Vec::with_capacity(num_frames);
    for _ in 0..num_frames {
        let v = read_f64(reader)?;
        if !v.is_finite() || v < 0.0 {
            return Err(MorphError::InvalidFormat(format!(
                "contour value {} out of range",
                v
            )));
        }
        f0.push(v);
    }

    Ok(PitchContour {
        f0,
        window_secs,
        skip_secs,
        sample_rate,
    })
}

/// Reads a contour file from disk.
pub fn read_contour_file(path: &str) -> Result<PitchContour, MorphError> {
    let mut file =
        std::fs::File::open(path).map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    read_contour(&mut file)
}

/// Writes a contour file to disk.
pub fn write_contour_file(path: &str, contour: &PitchContour) -> Result<(), MorphError> {
    let mut file = std::fs::File::create(path)
        .map_err(|e| MorphError::IoError(format!("{}: {}", path, e)))?;
    write_contour(contour, &mut file)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, MorphError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64, MorphError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}
