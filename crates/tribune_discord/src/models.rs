//! Wire models for the subset of Discord resources the review workflow touches.
//!
//! Unknown fields in responses are ignored; only what the workflow reads is
//! modelled.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Channel type for a public thread in Discord's channel-type enumeration.
pub const PUBLIC_THREAD: u8 = 11;

/// Discord message type.
///
/// Only the types the workflow searches for are named; everything else keeps
/// its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum MessageKind {
    /// Ordinary user message
    #[default]
    Default,
    /// System notice posted when a message is pinned
    ChannelPinnedMessage,
    /// System notice posted in the parent channel when a thread is created
    ThreadCreated,
    /// Any other message type
    Other(u8),
}

impl From<u8> for MessageKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Default,
            6 => Self::ChannelPinnedMessage,
            18 => Self::ThreadCreated,
            other => Self::Other(other),
        }
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Default => 0,
            MessageKind::ChannelPinnedMessage => 6,
            MessageKind::ThreadCreated => 18,
            MessageKind::Other(other) => other,
        }
    }
}

/// Discord user, as embedded in messages and reaction voter lists.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct User {
    /// Snowflake id
    pub(crate) id: String,
    /// Username without discriminator
    #[serde(default)]
    #[builder(default)]
    pub(crate) username: String,
    /// Display name
    #[serde(default)]
    #[builder(default)]
    pub(crate) global_name: Option<String>,
    /// True for bot accounts
    #[serde(default)]
    #[builder(default)]
    pub(crate) bot: bool,
}

impl User {
    /// Convenience constructor for a user known only by id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: String::new(),
            global_name: None,
            bot: false,
        }
    }
}

/// File attached to a posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct MessageAttachment {
    /// Attachment snowflake id
    #[serde(default)]
    pub(crate) id: String,
    /// Original file name
    pub(crate) filename: String,
}

/// Discord message envelope.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Message {
    /// Snowflake id
    pub(crate) id: String,
    /// Channel (or thread) the message lives in
    #[serde(default)]
    #[builder(default)]
    pub(crate) channel_id: String,
    /// Text content
    #[serde(default)]
    #[builder(default)]
    pub(crate) content: String,
    /// ISO-8601 creation time
    #[serde(default)]
    #[builder(default)]
    pub(crate) timestamp: String,
    /// Message author
    pub(crate) author: User,
    /// Message type
    #[serde(rename = "type", default)]
    #[builder(default)]
    pub(crate) kind: MessageKind,
    /// Whether the message is pinned
    #[serde(default)]
    #[builder(default)]
    pub(crate) pinned: bool,
    /// Uploaded files
    #[serde(default)]
    #[builder(default)]
    pub(crate) attachments: Vec<MessageAttachment>,
}

impl Message {
    /// Start building a message (mostly useful for tests and fakes).
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Whether `user_id` wrote this message.
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }
}

/// Lock/archive flags of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ThreadMetadata {
    /// Whether the thread is archived
    #[serde(default)]
    pub(crate) archived: bool,
    /// Whether only moderators may unarchive it
    #[serde(default)]
    pub(crate) locked: bool,
}

/// Channel envelope; threads are channels with a parent and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Channel {
    /// Snowflake id
    pub(crate) id: String,
    /// Channel type
    #[serde(rename = "type", default)]
    pub(crate) kind: u8,
    /// Channel or thread name
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Parent channel for threads
    #[serde(default)]
    pub(crate) parent_id: Option<String>,
    /// Thread lock/archive flags
    #[serde(default)]
    pub(crate) thread_metadata: Option<ThreadMetadata>,
}

/// Body of a thread creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct NewThread<'a> {
    pub(crate) name: &'a str,
    #[serde(rename = "type")]
    pub(crate) kind: u8,
}

/// Fields to change on a thread. Unset fields are left untouched.
///
/// # Example
///
/// ```
/// use tribune_discord::ThreadUpdate;
///
/// let update = ThreadUpdate::lock_and_archive();
/// assert_eq!(
///     serde_json::to_value(&update).unwrap(),
///     serde_json::json!({"locked": true, "archived": true})
/// );
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into, strip_option), default)]
pub struct ThreadUpdate {
    /// New thread name
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// Lock flag
    #[serde(skip_serializing_if = "Option::is_none")]
    locked: Option<bool>,
    /// Archive flag
    #[serde(skip_serializing_if = "Option::is_none")]
    archived: Option<bool>,
    /// Minutes of inactivity before auto-archive
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_archive_duration: Option<u32>,
}

impl ThreadUpdate {
    /// Start building an update.
    pub fn builder() -> ThreadUpdateBuilder {
        ThreadUpdateBuilder::default()
    }

    /// Lock the thread and archive it.
    pub fn lock_and_archive() -> Self {
        Self {
            locked: Some(true),
            archived: Some(true),
            ..Self::default()
        }
    }
}

/// Pagination filters for message listings.
///
/// At most one of the three anchors is meaningful to the service; the
/// constructors set exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageQuery {
    /// Messages older than this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) before: Option<String>,
    /// Messages newer than this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) after: Option<String>,
    /// Messages around this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) around: Option<String>,
}

impl MessageQuery {
    /// No filter: newest messages.
    pub fn latest() -> Self {
        Self::default()
    }

    /// Messages strictly older than `id`.
    pub fn before(id: impl Into<String>) -> Self {
        Self {
            before: Some(id.into()),
            ..Self::default()
        }
    }

    /// Messages strictly newer than `id`.
    pub fn after(id: impl Into<String>) -> Self {
        Self {
            after: Some(id.into()),
            ..Self::default()
        }
    }

    /// Messages around `id`.
    pub fn around(id: impl Into<String>) -> Self {
        Self {
            around: Some(id.into()),
            ..Self::default()
        }
    }
}
