//! CLI subcommand implementations.

pub mod distribution;
pub mod export;
pub mod summary;
pub mod timeline;
pub mod util;
