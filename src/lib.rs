//! The `nuget-cli` command line tool.

#![deny(missing_docs)]

pub mod commands;
pub mod install;
pub mod log_bridge;
pub mod reporter;
