//! Command implementations

pub mod completions;
pub mod hash;
pub mod status;
pub mod sync;
