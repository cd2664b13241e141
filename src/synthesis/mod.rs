//! Resynthesis: duration bookkeeping and the FD-PSOLA engine.

pub mod engine;
pub mod ledger;

pub use engine::{EngineState, FdResynthesizer};
pub use ledger::{DurationLedger, FramePlan};
