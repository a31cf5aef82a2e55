//! The single error type returned across crate boundaries.

use crate::{ConfigError, DiscordError, JsonError, WorkflowError, WorkflowErrorKind};

/// Where a failure came from.
///
/// Config problems surface before any request is made, Discord failures
/// carry the service's status and body, JSON failures name the state or
/// metadata file, and workflow failures cover the review steps themselves.
///
/// # Examples
///
/// ```
/// use tribune_error::{JsonError, TribuneError, TribuneErrorKind};
///
/// let err: TribuneError = JsonError::in_document("tribune.state.json", "trailing comma").into();
/// assert!(matches!(err.kind(), TribuneErrorKind::Json(_)));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TribuneErrorKind {
    /// State or metadata file could not be encoded or decoded
    #[from(JsonError)]
    Json(JsonError),
    /// Config file, environment overrides, or result templates
    #[from(ConfigError)]
    Config(ConfigError),
    /// A request to the chat service failed
    #[from(DiscordError)]
    Discord(DiscordError),
    /// A review step could not proceed
    #[from(WorkflowError)]
    Workflow(WorkflowError),
}

/// Boxed [`TribuneErrorKind`], so results stay one pointer wide.
///
/// Every sub-error converts with `?`:
///
/// ```
/// use tribune_error::{ConfigError, TribuneResult};
///
/// fn load() -> TribuneResult<()> {
///     Err(ConfigError::new("missing field `guild`"))?
/// }
///
/// assert!(load().unwrap_err().to_string().contains("guild"));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tribune Error: {}", _0)]
pub struct TribuneError(Box<TribuneErrorKind>);

impl TribuneError {
    /// Wrap a kind.
    pub fn new(kind: TribuneErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// The underlying kind.
    pub fn kind(&self) -> &TribuneErrorKind {
        &self.0
    }

    /// The workflow condition, when this is a workflow failure.
    ///
    /// ```
    /// use tribune_error::{TribuneError, WorkflowError, WorkflowErrorKind};
    ///
    /// let err: TribuneError =
    ///     WorkflowError::new(WorkflowErrorKind::NotStarted("app_thread_id".into())).into();
    /// assert!(matches!(err.workflow_kind(), Some(WorkflowErrorKind::NotStarted(_))));
    /// ```
    pub fn workflow_kind(&self) -> Option<&WorkflowErrorKind> {
        match self.kind() {
            TribuneErrorKind::Workflow(e) => Some(e.kind()),
            _ => None,
        }
    }
}

// Lets `?` lift any sub-error straight into `TribuneError`
impl<T> From<T> for TribuneError
where
    T: Into<TribuneErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result of any operation that crosses crate boundaries.
pub type TribuneResult<T> = std::result::Result<T, TribuneError>;
