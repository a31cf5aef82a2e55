//! Application decisions and the result token that selects a message.

use std::str::FromStr;
use strum::{AsRefStr, EnumIter, EnumString};
use tribune_error::{WorkflowError, WorkflowErrorKind};

/// Outcome of an application.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    /// Applicant accepted
    #[display("accept")]
    Accept,
    /// Applicant denied after a vote
    #[display("deny")]
    Deny,
    /// Application rejected outright
    #[display("reject")]
    Reject,
}

impl Decision {
    /// Colour tag and label understood by the embed bot.
    pub fn banner(&self) -> &'static str {
        match self {
            Self::Accept => "#9fec97 Accepted",
            Self::Deny => "#da8e8e Denied",
            Self::Reject => "#da8e8e Rejected",
        }
    }
}

/// A `<decision>-<message_type>` token, e.g. `accept-standard`.
///
/// The message type selects which template under the decision is sent.
///
/// # Example
///
/// ```
/// use tribune_workflow::{ApplicationResult, Decision};
///
/// let result: ApplicationResult = "deny-inactive".parse().unwrap();
/// assert_eq!(*result.decision(), Decision::Deny);
/// assert_eq!(result.message_type(), "inactive");
/// assert_eq!(result.to_string(), "deny-inactive");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_getters::Getters)]
#[display("{decision}-{message_type}")]
pub struct ApplicationResult {
    decision: Decision,
    message_type: String,
}

impl ApplicationResult {
    /// Result for a decision and message type.
    pub fn new(decision: Decision, message_type: impl Into<String>) -> Self {
        Self {
            decision,
            message_type: message_type.into(),
        }
    }
}

impl FromStr for ApplicationResult {
    type Err = WorkflowError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || WorkflowError::new(WorkflowErrorKind::InvalidResultToken(token.to_string()));

        let (decision, message_type) = token.trim().split_once('-').ok_or_else(invalid)?;
        let decision = Decision::from_str(&decision.to_ascii_lowercase()).map_err(|_| invalid())?;
        if message_type.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(decision, message_type))
    }
}
