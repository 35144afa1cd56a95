//! Command implementations behind the `hmem` binary.

pub mod commands;
