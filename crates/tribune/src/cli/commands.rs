//! CLI argument definitions.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tribune_workflow::ApplicationResult;

/// Tribune - application review workflow for a Discord community
#[derive(Parser, Debug)]
#[command(name = "tribune")]
#[command(about = "Open, close, and announce community applications on Discord", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Operation to perform
    #[arg(short, long, value_enum)]
    pub action: Action,

    /// Show debug messages on the console
    #[arg(short, long)]
    pub debug: bool,

    /// Application result as <accept|deny|reject>-<message_type>
    #[arg(
        short,
        long,
        required_if_eq_any([("action", "end"), ("action", "result_only")])
    )]
    pub result: Option<ApplicationResult>,

    /// Workflow configuration file
    #[arg(short, long, default_value = "tribune.toml")]
    pub config: PathBuf,

    /// Result template file (defaults to result_options.toml beside the config)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Start even if an application thread is already recorded
    #[arg(long)]
    pub force: bool,

    /// File receiving the full debug log
    #[arg(long, default_value = "tribune.log")]
    pub log_file: PathBuf,

    /// Emit console logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

/// Workflow operations.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the interview thread and the member vote
    Start,
    /// Close the vote, archive the thread, and announce the result
    End,
    /// Only announce the result to the applicant
    #[value(name = "result_only")]
    ResultOnly,
}
