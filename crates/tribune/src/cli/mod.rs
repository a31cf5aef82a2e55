//! Command-line interface module.
//!
//! This module provides the CLI structure and the action runner for the tribune binary.

mod commands;
mod run;

pub use commands::{Action, Cli};
pub use run::run_action;
