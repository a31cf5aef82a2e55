//! Application review workflow for Tribune.
//!
//! An application moves through three operations, each a fixed sequence of
//! chat calls:
//!
//! - **start**: open an interview thread for the applicant, reset the member
//!   channel, and post a pinned vote message with accept/deny reactions
//! - **end**: lock and settle the member channel, tally the vote, write the
//!   closing record, archive the thread, and announce the outcome
//! - **send_result**: post the formatted result to the applicant channel
//!
//! Configuration is read once and validated up front ([`WorkflowConfig`]).
//! The ids `start` creates are carried to `end` through a separate JSON state
//! file ([`StateStore`]), leaving the human-edited config untouched.
//!
//! # Example
//!
//! ```no_run
//! use tribune_discord::DiscordClient;
//! use tribune_workflow::{Orchestrator, ResultTemplates, StateStore, WorkflowConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkflowConfig::load("tribune.toml")?;
//! let templates = ResultTemplates::load(config.results_path())?;
//! let store = StateStore::new(config.state_path());
//! let client = DiscordClient::new(config.operator_token(), *config.api_version())?;
//!
//! let mut orchestrator = Orchestrator::initialize(client, config, templates, store).await?;
//! orchestrator.start(false).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod metadata;
mod orchestrator;
mod outcome;
mod search;
mod snowflake;
mod state;
mod templates;

pub use config::{
    CommandConfig, DEFAULT_RESULTS_FILE, ENV_PREFIX, SettleConfig, WorkflowConfig,
};
pub use metadata::{
    ApplicationMetadata, ApplicationMetadataBuilder, ApplicationMetadataBuilderError,
    format_elapsed, parse_timestamp,
};
pub use orchestrator::Orchestrator;
pub use outcome::{ApplicationResult, Decision};
pub use search::find_message;
pub use snowflake::{ApplicationLink, is_snowflake, next_snowflake};
pub use state::{StateStore, WorkflowState};
pub use templates::{ResultTemplates, fill};
