//! Error types for Tribune.
//!
//! This crate provides the error types shared by the Discord client, the
//! review workflow, and the command-line binary.
//!
//! # Layout
//!
//! Each origin has a `*ErrorKind` enum naming the condition and an `*Error`
//! struct that records where it was raised via `#[track_caller]`.
//! [`TribuneError`] boxes whichever one occurred, and `?` converts into it.
//!
//! ```
//! use tribune_error::{TribuneResult, WorkflowError, WorkflowErrorKind};
//!
//! fn require_thread(thread_id: Option<&str>) -> TribuneResult<&str> {
//!     let id = thread_id.ok_or_else(|| {
//!         WorkflowError::new(WorkflowErrorKind::NotStarted("app_thread_id".into()))
//!     })?;
//!     Ok(id)
//! }
//!
//! let err = require_thread(None).unwrap_err();
//! assert!(matches!(err.workflow_kind(), Some(WorkflowErrorKind::NotStarted(_))));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod discord;
mod error;
mod json;
mod workflow;

pub use config::ConfigError;
pub use discord::{DiscordError, DiscordErrorKind, DiscordResult};
pub use error::{TribuneError, TribuneErrorKind, TribuneResult};
pub use json::JsonError;
pub use workflow::{WorkflowError, WorkflowErrorKind, WorkflowResult};
