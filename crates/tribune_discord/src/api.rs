//! The chat operations the review workflow needs.

use crate::{Attachment, Channel, Message, MessageQuery, ThreadUpdate, User};
use async_trait::async_trait;
use tribune_error::DiscordResult;
use tracing::{debug, info, instrument};

/// Largest page the service returns for a message listing.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Page size the service uses when no limit is sent.
pub const DEFAULT_PAGE_SIZE: u8 = 50;

/// Chat platform operations, one HTTP call each unless noted.
///
/// [`DiscordClient`](crate::DiscordClient) implements this over HTTP and
/// [`InMemoryChat`](crate::InMemoryChat) in process. Every call either succeeds
/// or fails; nothing is retried.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Newest-first page of at most `limit` messages, filtered by `query`.
    /// A `limit` of 0 asks for the service's default page size.
    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        query: &MessageQuery,
    ) -> DiscordResult<Vec<Message>>;

    /// Post a message to a channel, or to a thread when `is_thread` is set.
    ///
    /// Attachments switch the request to multipart encoding.
    async fn send_message(
        &self,
        destination_id: &str,
        content: &str,
        attachments: &[Attachment],
        is_thread: bool,
    ) -> DiscordResult<Message>;

    /// Delete a message. Deleting a message that is already gone succeeds.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()>;

    /// Add the caller's own reaction.
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> DiscordResult<()>;

    /// Users who reacted with `emoji`.
    async fn get_reaction_voters(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> DiscordResult<Vec<User>>;

    /// Pin a message.
    async fn pin_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()>;

    /// Create a public thread under a channel.
    async fn create_thread(&self, channel_id: &str, name: &str) -> DiscordResult<Channel>;

    /// Change thread fields such as lock and archive flags.
    async fn update_thread(&self, thread_id: &str, update: &ThreadUpdate)
    -> DiscordResult<Channel>;

    /// Delete the newest page of messages one at a time, in listing order.
    ///
    /// One fetch followed by one delete per fetched message. Returns how many
    /// deletes were issued.
    #[instrument(skip(self))]
    async fn purge_channel(&self, channel_id: &str) -> DiscordResult<usize> {
        let messages = self
            .fetch_messages(channel_id, MAX_PAGE_SIZE, &MessageQuery::latest())
            .await?;
        debug!(count = messages.len(), "Purging fetched messages");

        for message in &messages {
            self.delete_message(channel_id, message.id()).await?;
        }

        info!(deleted = messages.len(), "Channel purged");
        Ok(messages.len())
    }
}
