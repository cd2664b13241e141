//! Frame extraction from the input waveform.

pub mod provider;

pub use provider::{Frame, FrameProvider};
