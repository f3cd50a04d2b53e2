//! Infrastructure layer - file system access.

pub mod fs;
