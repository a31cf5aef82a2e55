//! Discord API error types.
//!
//! Covers failing response statuses, transport failures, and undecodable
//! bodies. Bad attachments and tokens are rejected before any request is sent.

use derive_getters::Getters;

/// Discord error variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DiscordErrorKind {
    /// Response status outside 200..=299.
    #[display("Status Code: {status}, JSON: {body}")]
    Status {
        /// HTTP status code returned by the service
        status: u16,
        /// Response body as returned by the service
        body: String,
    },

    /// Request could not be sent or the response could not be read.
    #[display("Transport error: {_0}")]
    Transport(String),

    /// A successful response carried a body that did not decode.
    #[display("Failed to decode response: {_0}")]
    Decode(String),

    /// Attachment descriptor rejected before any network call.
    #[display("Invalid attachment: {_0}")]
    InvalidAttachment(String),

    /// Operator token cannot be sent as a header.
    #[display("Invalid operator token")]
    InvalidToken,
}

/// Discord error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Discord Error: {} at line {} in {}", kind, line, file)]
pub struct DiscordError {
    kind: DiscordErrorKind,
    line: u32,
    file: &'static str,
}

impl DiscordError {
    /// Create a new DiscordError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use tribune_error::{DiscordError, DiscordErrorKind};
    ///
    /// let err = DiscordError::new(DiscordErrorKind::Status {
    ///     status: 403,
    ///     body: r#"{"message": "Missing Access", "code": 50001}"#.to_string(),
    /// });
    /// assert!(err.to_string().contains("403"));
    /// ```
    #[track_caller]
    pub fn new(kind: DiscordErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Status code carried by a [`DiscordErrorKind::Status`] error.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            DiscordErrorKind::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;
