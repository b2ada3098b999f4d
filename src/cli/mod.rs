//! CLI command implementations

pub mod init;
pub mod listen;
pub mod pattern;
