//! Study planner CLI library.
//!
//! This crate provides the CLI interface for the study planner.

mod cli;
pub mod commands;
mod config;
mod store;

pub use cli::{Cli, Commands, SubjectsAction};
pub use config::{Backend, Config};
pub use store::{Store, gateway_error};
