//! Snowflake id arithmetic and application link parsing.
//!
//! Platform ids are monotonically increasing decimal strings that can exceed
//! what callers want to parse, so arithmetic works on the digits directly.

use derive_getters::Getters;
use tribune_error::{WorkflowError, WorkflowErrorKind, WorkflowResult};

/// Whether `id` is a non-empty run of ASCII digits.
pub fn is_snowflake(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// The id immediately after `id`: decimal increment with carry.
///
/// # Errors
///
/// Fails when `id` is not a decimal string.
///
/// # Example
///
/// ```
/// use tribune_workflow::next_snowflake;
///
/// assert_eq!(next_snowflake("122").unwrap(), "123");
/// assert_eq!(next_snowflake("999").unwrap(), "1000");
/// ```
pub fn next_snowflake(id: &str) -> WorkflowResult<String> {
    if !is_snowflake(id) {
        return Err(WorkflowError::new(WorkflowErrorKind::InvalidSnowflake(
            id.to_string(),
        )));
    }

    let mut digits = id.as_bytes().to_vec();
    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        if !carry {
            break;
        }
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
        }
    }
    if carry {
        digits.insert(0, b'1');
    }

    // Only ASCII digits were written
    Ok(digits.into_iter().map(char::from).collect())
}

/// A message link: `https://discord.com/channels/{guild}/{channel}/{message}`.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ApplicationLink {
    channel_id: String,
    message_id: String,
}

impl ApplicationLink {
    /// Take the channel and message ids from the last two path segments.
    ///
    /// # Example
    ///
    /// ```
    /// use tribune_workflow::ApplicationLink;
    ///
    /// let link = ApplicationLink::parse("https://discord.com/channels/1/22/333").unwrap();
    /// assert_eq!(link.channel_id(), "22");
    /// assert_eq!(link.message_id(), "333");
    /// ```
    pub fn parse(link: &str) -> WorkflowResult<Self> {
        let mut segments = link.trim().trim_end_matches('/').rsplit('/');
        let message_id = segments.next().unwrap_or_default();
        let channel_id = segments.next().unwrap_or_default();

        if !is_snowflake(channel_id) || !is_snowflake(message_id) {
            return Err(WorkflowError::new(WorkflowErrorKind::InvalidSnowflake(
                link.to_string(),
            )));
        }

        Ok(Self {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        })
    }
}
