//! The record written when an application closes.

use crate::state::io_error;
use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use tribune_error::{JsonError, TribuneResult, WorkflowError, WorkflowErrorKind, WorkflowResult};

/// Summary of a closed application, serialized once per `end`.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ApplicationMetadata {
    applicant_name: String,
    applicant_id: String,
    /// Day the vote opened, `YYYY-MM-DD`
    start_date: String,
    /// `{d}d {h}h {m}m {s}s` since the vote opened
    time_elapsed: String,
    accept_votes: usize,
    deny_votes: usize,
    /// The `<decision>-<type>` token
    app_result: String,
    result_message: String,
    application_link: String,
    operator_id: String,
}

impl ApplicationMetadata {
    /// Start building a record.
    pub fn builder() -> ApplicationMetadataBuilder {
        ApplicationMetadataBuilder::default()
    }

    /// `{prefix}_{start_date}_{applicant_id}.json`
    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}_{}_{}.json", prefix, self.start_date, self.applicant_id)
    }

    /// Write pretty JSON into `dir`, replacing any earlier file of the same name.
    ///
    /// Returns the path written.
    pub fn write(&self, dir: &Path, prefix: &str) -> TribuneResult<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let path = dir.join(self.file_name(prefix));
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            JsonError::in_document(
                path.display().to_string(),
                format!("Failed to serialize metadata: {}", e),
            )
        })?;
        std::fs::write(&path, json).map_err(|e| io_error(&path, e))?;

        debug!(path = %path.display(), "Wrote application metadata");
        Ok(path)
    }

    /// Read back a record written by [`write`](Self::write).
    pub fn read(path: &Path) -> TribuneResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let metadata = serde_json::from_str(&contents).map_err(|e| {
            JsonError::in_document(
                path.display().to_string(),
                format!("Failed to parse metadata: {}", e),
            )
        })?;
        Ok(metadata)
    }
}

/// Render a duration as `{d}d {h}h {m}m {s}s`. Negative spans render as zero.
///
/// # Example
///
/// ```
/// use chrono::TimeDelta;
/// use tribune_workflow::format_elapsed;
///
/// assert_eq!(format_elapsed(TimeDelta::seconds(90_061)), "1d 1h 1m 1s");
/// ```
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
}

/// Parse a service timestamp (RFC 3339) into UTC.
pub fn parse_timestamp(timestamp: &str) -> WorkflowResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| WorkflowError::new(WorkflowErrorKind::InvalidTimestamp(timestamp.to_string())))
}
