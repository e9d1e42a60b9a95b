//! Activity log CLI library.
//!
//! This crate provides the command-line harness over `alog-core`.

mod cli;
pub mod commands;
mod config;
pub mod input;

pub use cli::{Cli, Commands, FilterArgs};
pub use config::Config;
