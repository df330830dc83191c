//! CLI subcommand implementations.

pub mod generate;
pub mod show;
pub mod subjects;
pub mod util;
