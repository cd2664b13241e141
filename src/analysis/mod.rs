//! Signal analysis: LPC modeling, LSF conversion, envelope estimation and
//! pitch tracking.

pub mod envelope;
pub mod lpc;
pub mod lsf;
pub mod pitch;
