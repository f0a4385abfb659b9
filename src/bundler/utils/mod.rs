//! Shared helpers for file system access and external tool execution.

pub mod fs;
pub mod process;
