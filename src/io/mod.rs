//! File formats: WAV audio, binary pitch contours, raw sample scratch
//! streams.

pub mod contour;
pub mod scratch;
pub mod wav;
