//! Operations behind the commands.

pub mod report;
pub mod sync;

pub use report::{Failure, OptionalNotice, SyncReport};
pub use sync::{SyncOptions, sync};
