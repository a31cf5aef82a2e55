//! In-memory implementation of [`ChatApi`] for testing.
//!
//! Models just enough of the platform for the review workflow: channels and
//! threads holding messages, the system notices for thread creation and pins,
//! reactions, and moderation bots that react to command messages. Every call
//! is recorded so tests can assert on the exact sequence issued.

use crate::{
    Attachment, ChatApi, Channel, DEFAULT_PAGE_SIZE, Message, MessageAttachment, MessageKind, MessageQuery,
    PUBLIC_THREAD, ThreadMetadata, ThreadUpdate, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tribune_error::{DiscordError, DiscordErrorKind, DiscordResult};

/// First id handed out to generated messages and threads.
const FIRST_GENERATED_ID: u64 = 1_100_000_000_000_000_000;

/// One recorded [`ChatApi`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `fetch_messages`
    FetchMessages {
        /// Channel listed
        channel_id: String,
        /// Page size requested
        limit: u8,
    },
    /// `send_message`
    SendMessage {
        /// Destination channel or thread
        channel_id: String,
        /// Posted text
        content: String,
        /// Names of attached files
        attachments: Vec<String>,
        /// Whether the thread endpoint was used
        is_thread: bool,
    },
    /// `delete_message`
    DeleteMessage {
        /// Channel holding the message
        channel_id: String,
        /// Deleted message
        message_id: String,
    },
    /// `add_reaction`
    AddReaction {
        /// Channel holding the message
        channel_id: String,
        /// Reacted message
        message_id: String,
        /// Emoji used
        emoji: String,
    },
    /// `get_reaction_voters`
    GetReactionVoters {
        /// Channel holding the message
        channel_id: String,
        /// Queried message
        message_id: String,
        /// Emoji queried
        emoji: String,
    },
    /// `pin_message`
    PinMessage {
        /// Channel holding the message
        channel_id: String,
        /// Pinned message
        message_id: String,
    },
    /// `create_thread`
    CreateThread {
        /// Parent channel
        channel_id: String,
        /// Thread name
        name: String,
    },
    /// `update_thread`
    UpdateThread {
        /// Updated thread
        thread_id: String,
        /// Requested changes
        update: ThreadUpdate,
    },
}

/// What a moderation bot does when it sees a command message.
///
/// In every case the bot removes the command message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEffect {
    /// Delete up to `batch` of the newest unpinned messages.
    Purge {
        /// Messages removed per command
        batch: usize,
    },
    /// Nothing visible beyond removing the command (lock, unlock).
    Swallow,
    /// Repost the command text under the bot's own identity (embeds).
    Relay {
        /// Bot account that reposts
        bot_id: String,
    },
}

#[derive(Debug, Default)]
struct ChatState {
    /// Messages per channel, oldest first
    channels: HashMap<String, Vec<Message>>,
    /// Voters keyed by (channel, message, emoji)
    reactions: HashMap<(String, String, String), Vec<User>>,
    threads: HashMap<String, Channel>,
    /// Command prefixes and their effects, checked in registration order
    commands: Vec<(String, CommandEffect)>,
    calls: Vec<ApiCall>,
    next_id: u64,
    /// Thread updates still to be refused with a server error
    failing_thread_updates: usize,
}

impl ChatState {
    fn next_id(&mut self) -> String {
        let id = FIRST_GENERATED_ID + self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn command_effect(&self, content: &str) -> Option<CommandEffect> {
        self.commands
            .iter()
            .find(|(prefix, _)| content.starts_with(prefix.as_str()))
            .map(|(_, effect)| effect.clone())
    }
}

/// Order two decimal snowflakes without parsing them.
fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn not_found(what: &str, code: u64) -> DiscordError {
    DiscordError::new(DiscordErrorKind::Status {
        status: 404,
        body: format!(r#"{{"message": "Unknown {}", "code": {}}}"#, what, code),
    })
}

/// In-process chat platform.
///
/// Channels spring into existence on first use. Listing a channel nobody has
/// posted to returns an empty page.
///
/// # Example
/// ```
/// use tribune_discord::{ChatApi, InMemoryChat, MessageQuery};
///
/// # #[tokio::main]
/// # async fn main() {
/// let chat = InMemoryChat::new("1");
/// chat.send_message("10", "hello", &[], false).await.unwrap();
/// let page = chat.fetch_messages("10", 100, &MessageQuery::latest()).await.unwrap();
/// assert_eq!(page[0].content(), "hello");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryChat {
    /// Account every call is made as
    caller: User,
    state: Arc<RwLock<ChatState>>,
}

impl InMemoryChat {
    /// Platform where calls are made as `caller_id`.
    pub fn new(caller_id: impl Into<String>) -> Self {
        Self {
            caller: User::with_id(caller_id),
            state: Arc::new(RwLock::new(ChatState::default())),
        }
    }

    /// Register a moderation bot reaction to messages starting with `prefix`.
    pub async fn on_command(&self, prefix: impl Into<String>, effect: CommandEffect) {
        self.state
            .write()
            .await
            .commands
            .push((prefix.into(), effect));
    }

    /// Place an existing message into a channel, as the newest message.
    pub async fn insert_message(&self, channel_id: &str, mut message: Message) {
        message.channel_id = channel_id.to_string();
        self.state
            .write()
            .await
            .channels
            .entry(channel_id.to_string())
            .or_default()
            .push(message);
    }

    /// Post a message as someone other than the caller. Not recorded as a call.
    pub async fn post_as(&self, channel_id: &str, author_id: &str, content: &str) -> Message {
        let mut state = self.state.write().await;
        let message = Message {
            id: state.next_id(),
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            author: User::with_id(author_id),
            kind: MessageKind::Default,
            pinned: false,
            attachments: Vec::new(),
        };
        state
            .channels
            .entry(channel_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    /// Add a reaction from someone other than the caller.
    pub async fn add_voter(&self, channel_id: &str, message_id: &str, emoji: &str, user_id: &str) {
        self.state
            .write()
            .await
            .reactions
            .entry((
                channel_id.to_string(),
                message_id.to_string(),
                emoji.to_string(),
            ))
            .or_default()
            .push(User::with_id(user_id));
    }

    /// Drop every reaction with `emoji`, the caller's own included.
    pub async fn clear_reactions(&self, channel_id: &str, message_id: &str, emoji: &str) {
        self.state.write().await.reactions.remove(&(
            channel_id.to_string(),
            message_id.to_string(),
            emoji.to_string(),
        ));
    }

    /// Messages in a channel, newest first.
    pub async fn messages(&self, channel_id: &str) -> Vec<Message> {
        self.state
            .read()
            .await
            .channels
            .get(channel_id)
            .map(|messages| messages.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// A thread created through [`ChatApi::create_thread`].
    pub async fn thread(&self, thread_id: &str) -> Option<Channel> {
        self.state.read().await.threads.get(thread_id).cloned()
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.state.read().await.calls.clone()
    }

    /// Refuse the next `count` thread updates with a 500, as an outage would.
    pub async fn fail_thread_updates(&self, count: usize) {
        self.state.write().await.failing_thread_updates = count;
    }

    /// Forget recorded calls, keeping platform contents.
    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }

    fn system_message(&self, id: String, channel_id: &str, content: &str, kind: MessageKind) -> Message {
        Message {
            id,
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            author: self.caller.clone(),
            kind,
            pinned: false,
            attachments: Vec::new(),
        }
    }
}

#[async_trait]
impl ChatApi for InMemoryChat {
    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        query: &MessageQuery,
    ) -> DiscordResult<Vec<Message>> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::FetchMessages {
            channel_id: channel_id.to_string(),
            limit,
        });

        let page_size = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        let page = state
            .channels
            .get(channel_id)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .filter(|m| {
                        query
                            .before
                            .as_deref()
                            .is_none_or(|before| compare_ids(&m.id, before) == Ordering::Less)
                    })
                    .filter(|m| {
                        query
                            .after
                            .as_deref()
                            .is_none_or(|after| compare_ids(&m.id, after) == Ordering::Greater)
                    })
                    .take(usize::from(page_size))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page)
    }

    async fn send_message(
        &self,
        destination_id: &str,
        content: &str,
        attachments: &[Attachment],
        is_thread: bool,
    ) -> DiscordResult<Message> {
        let mut files = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            attachment.part().await?;
            files.push(attachment.file_name().to_string());
        }

        let mut state = self.state.write().await;
        state.calls.push(ApiCall::SendMessage {
            channel_id: destination_id.to_string(),
            content: content.to_string(),
            attachments: files.clone(),
            is_thread,
        });

        if is_thread && !state.threads.contains_key(destination_id) {
            return Err(not_found("Channel", 10003));
        }

        let id = state.next_id();
        let mut message = self.system_message(id, destination_id, content, MessageKind::Default);
        message.attachments = files
            .into_iter()
            .map(|filename| MessageAttachment {
                id: String::new(),
                filename,
            })
            .collect();

        let effect = if is_thread {
            None
        } else {
            state.command_effect(content)
        };

        match effect {
            None => {
                state
                    .channels
                    .entry(destination_id.to_string())
                    .or_default()
                    .push(message.clone());
            }
            Some(CommandEffect::Swallow) => {}
            Some(CommandEffect::Purge { batch }) => {
                let channel = state
                    .channels
                    .entry(destination_id.to_string())
                    .or_default();
                let mut removed = 0;
                let mut ix = channel.len();
                while ix > 0 && removed < batch {
                    ix -= 1;
                    if !channel[ix].pinned {
                        channel.remove(ix);
                        removed += 1;
                    }
                }
            }
            Some(CommandEffect::Relay { bot_id }) => {
                let id = state.next_id();
                let mut relayed = message.clone();
                relayed.id = id;
                relayed.author = User {
                    id: bot_id,
                    username: String::new(),
                    global_name: None,
                    bot: true,
                };
                state
                    .channels
                    .entry(destination_id.to_string())
                    .or_default()
                    .push(relayed);
            }
        }

        Ok(message)
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::DeleteMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        if let Some(messages) = state.channels.get_mut(channel_id) {
            messages.retain(|m| m.id != message_id);
        }
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> DiscordResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::AddReaction {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
        });
        state
            .reactions
            .entry((
                channel_id.to_string(),
                message_id.to_string(),
                emoji.to_string(),
            ))
            .or_default()
            .push(self.caller.clone());
        Ok(())
    }

    async fn get_reaction_voters(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> DiscordResult<Vec<User>> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::GetReactionVoters {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
        });
        Ok(state
            .reactions
            .get(&(
                channel_id.to_string(),
                message_id.to_string(),
                emoji.to_string(),
            ))
            .cloned()
            .unwrap_or_default())
    }

    async fn pin_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::PinMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });

        match state
            .channels
            .get_mut(channel_id)
            .and_then(|messages| messages.iter_mut().find(|m| m.id == message_id))
        {
            Some(message) => message.pinned = true,
            None => return Err(not_found("Message", 10008)),
        }

        let id = state.next_id();
        let notice = self.system_message(id, channel_id, "", MessageKind::ChannelPinnedMessage);
        state
            .channels
            .entry(channel_id.to_string())
            .or_default()
            .push(notice);
        Ok(())
    }

    async fn create_thread(&self, channel_id: &str, name: &str) -> DiscordResult<Channel> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::CreateThread {
            channel_id: channel_id.to_string(),
            name: name.to_string(),
        });

        let thread = Channel {
            id: state.next_id(),
            kind: PUBLIC_THREAD,
            name: Some(name.to_string()),
            parent_id: Some(channel_id.to_string()),
            thread_metadata: Some(ThreadMetadata::default()),
        };
        state.threads.insert(thread.id.clone(), thread.clone());
        state.channels.entry(thread.id.clone()).or_default();

        let id = state.next_id();
        let notice = self.system_message(id, channel_id, name, MessageKind::ThreadCreated);
        state
            .channels
            .entry(channel_id.to_string())
            .or_default()
            .push(notice);
        Ok(thread)
    }

    async fn update_thread(
        &self,
        thread_id: &str,
        update: &ThreadUpdate,
    ) -> DiscordResult<Channel> {
        let mut state = self.state.write().await;
        state.calls.push(ApiCall::UpdateThread {
            thread_id: thread_id.to_string(),
            update: update.clone(),
        });

        if state.failing_thread_updates > 0 {
            state.failing_thread_updates -= 1;
            return Err(DiscordError::new(DiscordErrorKind::Status {
                status: 500,
                body: r#"{"message": "Internal Server Error", "code": 0}"#.to_string(),
            }));
        }

        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("Channel", 10003))?;
        let metadata = thread.thread_metadata.get_or_insert_with(ThreadMetadata::default);
        if let Some(locked) = update.locked() {
            metadata.locked = *locked;
        }
        if let Some(archived) = update.archived() {
            metadata.archived = *archived;
        }
        if let Some(name) = update.name() {
            thread.name = Some(name.clone());
        }
        Ok(thread.clone())
    }
}
