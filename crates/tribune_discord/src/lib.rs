//! Discord REST API client for Tribune.
//!
//! This crate turns the chat operations the application review workflow needs
//! into authenticated requests against Discord's versioned REST API.
//!
//! # Layout
//!
//! - **endpoint**: resource locators for guilds, channels, messages, threads, users
//! - **models**: wire models for messages, users, channels, and request bodies
//! - **attachment**: files uploaded with a message
//! - **api**: the [`ChatApi`] trait, including the shared `purge_channel` sequence
//! - **client**: [`DiscordClient`], the HTTP implementation
//! - **memory**: [`InMemoryChat`], an in-process implementation for tests
//!
//! # Status handling
//!
//! Every response must carry a status in 200..=299. The one exception is
//! deleting a message the service no longer knows (error code 10008), which
//! counts as success so deletes can be repeated safely. Nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use tribune_discord::{ChatApi, DiscordClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DiscordClient::new(std::env::var("TRIBUNE_OPERATOR_TOKEN")?, 10)?;
//! let posted = client.send_message("1234567890", "Voting is open", &[], false).await?;
//! client.pin_message("1234567890", posted.id()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod api;
mod attachment;
mod client;
mod endpoint;
mod memory;
mod models;

pub use api::{ChatApi, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use attachment::Attachment;
pub use client::{DiscordClient, UNKNOWN_MESSAGE_CODE};
pub use endpoint::{DEFAULT_API_VERSION, DISCORD_API_BASE, Endpoint};
pub use memory::{ApiCall, CommandEffect, InMemoryChat};
pub(crate) use models::NewThread;
pub use models::{
    Channel, Message, MessageAttachment, MessageBuilder, MessageBuilderError, MessageKind,
    MessageQuery, PUBLIC_THREAD, ThreadMetadata, ThreadUpdate, ThreadUpdateBuilder,
    ThreadUpdateBuilderError, User, UserBuilder, UserBuilderError,
};
