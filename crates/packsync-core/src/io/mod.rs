//! IO modules - side effects (network, filesystem)

pub mod fs;
pub mod murmur;
pub mod source;
pub mod verify;
