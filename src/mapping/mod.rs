//! Vocal tract mapping and optional two-pass smoothing.

pub mod mapper;
pub mod smoothing;

pub use mapper::{
    CodebookEntry, CodebookMapper, IdentityMapper, LabelEntry, MappedLsfs, MapperConfig,
    VocalTractMapper,
};
pub use smoothing::{LsfSequence, SmoothingParams, SmoothingSource, SmoothingState};
