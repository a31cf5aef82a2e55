//! Tribune CLI binary.
//!
//! Runs one step of the application review workflow per invocation:
//! - `start`: open the interview thread and the member vote
//! - `end`: close the vote, archive the thread, announce the result
//! - `result_only`: announce the result without touching the vote

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, run_action};
    use logging::{LoggingConfig, init_logging};

    // Load .env before anything reads TRIBUNE_* variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(LoggingConfig {
        debug: cli.debug,
        json: cli.json_logs,
        log_file: &cli.log_file,
    })?;

    if let Err(e) = run_action(&cli).await {
        tracing::error!(error = %e, "Workflow failed");
        return Err(e.into());
    }

    Ok(())
}
