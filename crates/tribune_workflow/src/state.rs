//! Workflow state carried between invocations.
//!
//! `start` records the thread and vote message it created; `end` reads them
//! back and clears them once the application is closed. The state lives in
//! its own JSON file so the human-edited config is never rewritten.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use tribune_error::{JsonError, TribuneResult, WorkflowError, WorkflowErrorKind};

/// Ids recorded by `start` and consumed by `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct WorkflowState {
    /// Author of the application message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    applicant_id: Option<String>,
    /// Interview thread opened by `start`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_thread_id: Option<String>,
    /// Vote initiator in the member channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vote_message_id: Option<String>,
    /// When `start` finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    /// Metadata file of an `end` that got past deleting the vote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata_path: Option<PathBuf>,
}

impl WorkflowState {
    /// Record a completed `start`.
    pub fn record_start(
        &mut self,
        applicant_id: impl Into<String>,
        app_thread_id: impl Into<String>,
        vote_message_id: impl Into<String>,
    ) {
        self.applicant_id = Some(applicant_id.into());
        self.app_thread_id = Some(app_thread_id.into());
        self.vote_message_id = Some(vote_message_id.into());
        self.started_at = Some(Utc::now());
        self.metadata_path = None;
    }

    /// Note the metadata file before `end` deletes the vote it was counted from.
    pub fn record_closing(&mut self, metadata_path: impl Into<PathBuf>) {
        self.metadata_path = Some(metadata_path.into());
    }

    /// Forget the thread and vote message after a completed `end`.
    pub fn record_end(&mut self) {
        self.app_thread_id = None;
        self.vote_message_id = None;
        self.metadata_path = None;
    }

    /// The recorded thread id.
    ///
    /// # Errors
    ///
    /// [`WorkflowErrorKind::NotStarted`] when `start` has not recorded one.
    pub fn require_thread(&self) -> Result<&str, WorkflowError> {
        self.app_thread_id
            .as_deref()
            .ok_or_else(|| WorkflowError::new(WorkflowErrorKind::NotStarted("app_thread_id".into())))
    }

    /// The recorded vote message id.
    pub fn require_vote_message(&self) -> Result<&str, WorkflowError> {
        self.vote_message_id.as_deref().ok_or_else(|| {
            WorkflowError::new(WorkflowErrorKind::NotStarted("vote_message_id".into()))
        })
    }
}

/// Reads and writes [`WorkflowState`] as pretty JSON.
#[derive(Debug, Clone, Getters)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by the file at `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load state; a missing file is an empty state.
    pub fn load(&self) -> TribuneResult<WorkflowState> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file, starting empty");
            return Ok(WorkflowState::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| io_error(&self.path, e))?;
        let state: WorkflowState = serde_json::from_str(&contents).map_err(|e| {
            JsonError::in_document(
                self.path.display().to_string(),
                format!("Failed to parse state file: {}", e),
            )
        })?;

        debug!(path = %self.path.display(), ?state, "Loaded workflow state");
        Ok(state)
    }

    /// Write state, creating parent directories as needed.
    pub fn save(&self, state: &WorkflowState) -> TribuneResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(state).map_err(|e| {
            JsonError::in_document(
                self.path.display().to_string(),
                format!("Failed to serialize state: {}", e),
            )
        })?;
        std::fs::write(&self.path, json).map_err(|e| io_error(&self.path, e))?;

        debug!(path = %self.path.display(), "Saved workflow state");
        Ok(())
    }
}

pub(crate) fn io_error(path: &Path, err: std::io::Error) -> WorkflowError {
    WorkflowError::new(WorkflowErrorKind::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}
