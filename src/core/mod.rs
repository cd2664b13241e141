//! Core numeric utilities shared by the analysis and synthesis stages.

pub mod fft;
pub mod overlap;
pub mod types;
pub mod window;
