//! Review workflow error types.

/// Specific workflow error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WorkflowErrorKind {
    /// The message behind the application link is not the one the service returned.
    #[display("Application message mismatch: expected {expected}, found {found}")]
    ApplicantMismatch {
        /// Message id taken from the application link
        expected: String,
        /// Message id the service returned instead
        found: String,
    },

    /// No message in a fetched list satisfied a search.
    #[display("Message not found: {_0}")]
    MessageNotFound(String),

    /// The settle loop hit its attempt ceiling.
    #[display("Channel did not settle below {threshold} messages after {attempts} purge attempts")]
    SettleExhausted {
        /// Message count the loop waits to drop below
        threshold: usize,
        /// Purge attempts issued before giving up
        attempts: u32,
    },

    /// An application is already running.
    #[display("Application already started (thread {_0}); rerun with --force to start another")]
    AlreadyStarted(String),

    /// An operation needs state that only `start` records.
    #[display("Application not started: {_0} is not recorded")]
    NotStarted(String),

    /// Result token was not `<decision>-<message_type>`.
    #[display("Invalid result token '{_0}': expected <accept|deny|reject>-<message_type>")]
    InvalidResultToken(String),

    /// No result template exists for the decision and message type.
    #[display("No result template for [{decision}] {message_type}")]
    UnknownTemplate {
        /// Decision section
        decision: String,
        /// Message type key
        message_type: String,
    },

    /// A snowflake id was not a decimal string.
    #[display("Invalid snowflake id '{_0}'")]
    InvalidSnowflake(String),

    /// A timestamp returned by the service did not parse.
    #[display("Invalid timestamp '{_0}'")]
    InvalidTimestamp(String),

    /// The closing record could not be assembled.
    #[display("Failed to build application metadata: {_0}")]
    Metadata(String),

    /// Reading or writing a local file failed.
    #[display("I/O error on {path}: {message}")]
    Io {
        /// Path being accessed
        path: String,
        /// Underlying error message
        message: String,
    },
}

/// Workflow error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Workflow Error: {} at line {} in {}", kind, line, file)]
pub struct WorkflowError {
    kind: WorkflowErrorKind,
    line: u32,
    file: &'static str,
}

impl WorkflowError {
    /// Create a new workflow error with caller location tracking.
    ///
    /// # Example
    /// ```
    /// use tribune_error::{WorkflowError, WorkflowErrorKind};
    ///
    /// let err = WorkflowError::new(WorkflowErrorKind::NotStarted("app_thread_id".into()));
    /// assert!(err.to_string().contains("app_thread_id"));
    /// ```
    #[track_caller]
    pub fn new(kind: WorkflowErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WorkflowErrorKind {
        &self.kind
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
