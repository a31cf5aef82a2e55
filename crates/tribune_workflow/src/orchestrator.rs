//! The three workflow operations: start, end, and send_result.
//!
//! Each operation is a fixed sequence of chat calls. Steps run strictly in
//! order, each logs `[SUCCESS] n. step` when it completes, and the first
//! failure aborts the operation without undoing earlier steps.

use crate::{
    ApplicationMetadata, ApplicationResult, ResultTemplates, StateStore, WorkflowConfig,
    WorkflowState, fill, find_message, format_elapsed, next_snowflake, parse_timestamp,
};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use tribune_discord::{
    Attachment, ChatApi, MAX_PAGE_SIZE, Message, MessageKind, MessageQuery, ThreadUpdate,
};
use tribune_error::{TribuneResult, WorkflowError, WorkflowErrorKind};

/// Drives the application review against a [`ChatApi`].
///
/// Construct with [`initialize`](Self::initialize), which identifies the
/// applicant before any operation can run.
#[derive(Debug)]
pub struct Orchestrator<C> {
    client: C,
    config: WorkflowConfig,
    templates: ResultTemplates,
    store: StateStore,
    state: WorkflowState,
    applicant_id: String,
}

impl<C: ChatApi> Orchestrator<C> {
    /// Load state and identify the applicant from the application link.
    ///
    /// Fetches the single message just before `message_id + 1` in the
    /// application channel and checks that it is the linked message.
    ///
    /// # Errors
    ///
    /// [`WorkflowErrorKind::ApplicantMismatch`] when the service returns a
    /// different message, and any error from loading state or fetching.
    #[instrument(skip_all, fields(link = %config.application_link()))]
    pub async fn initialize(
        client: C,
        config: WorkflowConfig,
        templates: ResultTemplates,
        store: StateStore,
    ) -> TribuneResult<Self> {
        let state = store.load()?;

        let link = config.application();
        let cutoff = next_snowflake(link.message_id())?;
        let page = client
            .fetch_messages(link.channel_id(), 1, &MessageQuery::before(cutoff))
            .await?;

        let message = page.first().ok_or_else(|| {
            WorkflowError::new(WorkflowErrorKind::MessageNotFound(
                "application message".to_string(),
            ))
        })?;
        if message.id() != link.message_id() {
            return Err(WorkflowError::new(WorkflowErrorKind::ApplicantMismatch {
                expected: link.message_id().clone(),
                found: message.id().clone(),
            })
            .into());
        }

        let applicant_id = message.author().id().clone();
        debug!(applicant_id = %applicant_id, "Identified applicant");

        Ok(Self {
            client,
            config,
            templates,
            store,
            state,
            applicant_id,
        })
    }

    /// Author of the application message.
    pub fn applicant_id(&self) -> &str {
        &self.applicant_id
    }

    /// State as last loaded or recorded.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// The underlying chat client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Open the interview thread and the member vote.
    ///
    /// Refuses to run while state records an open thread unless `force` is set.
    #[instrument(skip(self), fields(applicant = %self.config.applicant_name()))]
    pub async fn start(&mut self, force: bool) -> TribuneResult<()> {
        if let Some(thread_id) = self.state.app_thread_id() {
            if !force {
                return Err(
                    WorkflowError::new(WorkflowErrorKind::AlreadyStarted(thread_id.clone())).into(),
                );
            }
            warn!(thread_id = %thread_id, "Starting over a recorded application");
        }

        let applicant_channel = self.config.applicant_channel().clone();
        let member_channel = self.config.member_channel().clone();
        let applicant_name = self.config.applicant_name().clone();
        info!("Starting application");

        let thread = self
            .client
            .create_thread(&applicant_channel, &applicant_name)
            .await?;
        let thread_id = thread.id().clone();
        self.pause().await;
        info!(thread_id = %thread_id, "[SUCCESS] 1. Create thread");

        let operator_id = self.config.operator_id().clone();
        self.delete_newest(&applicant_channel, "thread creation message", |m| {
            m.is_authored_by(&operator_id) && m.content() == &applicant_name
        })
        .await?;
        info!("[SUCCESS] 2. Delete thread creation message");

        let greeting = fill(
            self.config.thread_m1(),
            &[
                ("[APPLICANT_ID]", self.applicant_id.as_str()),
                ("[PING_ROLE]", self.config.ping_role().as_str()),
            ],
        );
        self.client
            .send_message(&thread_id, &greeting, &[], true)
            .await?;
        info!("[SUCCESS] 3. Send interview initiator");

        let reference = fill(
            self.config.thread_m2(),
            &[(
                "[APPLICATION_LINK]",
                self.config.application_link().as_str(),
            )],
        );
        self.client
            .send_message(&thread_id, &reference, &[], true)
            .await?;
        info!("[SUCCESS] 4. Send reference link");

        self.client
            .send_message(&member_channel, self.config.commands().unlock(), &[], false)
            .await?;
        self.pause().await;
        info!("[SUCCESS] 5. Unlock member channel");

        let purged = self.client.purge_channel(&member_channel).await?;
        info!(purged, "[SUCCESS] 6. Purge member channel");

        let mut vote_text = fill(
            self.config.member_m1(),
            &[
                ("[PING_ROLE]", self.config.ping_role().as_str()),
                ("[APPLICATION_LINK]", self.config.application_link().as_str()),
                ("[GUILD]", self.config.guild().as_str()),
                ("[THREAD_ID]", thread_id.as_str()),
            ],
        );
        if *self.config.vote_split_lines() {
            vote_text = vote_text.replace(' ', "\n");
        }
        let vote = self
            .client
            .send_message(&member_channel, &vote_text, &[], false)
            .await?;
        let vote_id = vote.id().clone();
        info!(vote_id = %vote_id, "[SUCCESS] 7. Send vote initiator");

        for emoji in [self.config.accept_emoji(), self.config.deny_emoji()] {
            self.client
                .add_reaction(&member_channel, &vote_id, emoji)
                .await?;
        }
        info!("[SUCCESS] 8. Add accept/deny reactions");

        self.client.pin_message(&member_channel, &vote_id).await?;
        self.pause().await;
        info!("[SUCCESS] 9. Pin vote message");

        self.delete_newest(&member_channel, "pin notification", |m| {
            *m.kind() == MessageKind::ChannelPinnedMessage
        })
        .await?;
        info!("[SUCCESS] 10. Delete pin notification");

        self.state
            .record_start(self.applicant_id.clone(), thread_id, vote_id);
        self.store.save(&self.state)?;

        info!("Application started");
        Ok(())
    }

    /// Close the vote, archive the thread, publish the tally and the result.
    ///
    /// Returns the path of the metadata file written. Once the metadata is on
    /// disk its path is saved with the state, so a rerun after a later failure
    /// picks up the tally from that file instead of the deleted vote.
    #[instrument(skip(self, result), fields(result = %result))]
    pub async fn end(&mut self, result: &ApplicationResult) -> TribuneResult<PathBuf> {
        let thread_id = self.state.require_thread()?.to_string();
        let vote_id = self.state.require_vote_message()?.to_string();
        let result_message = self.templates.lookup(result)?.to_string();
        let member_channel = self.config.member_channel().clone();
        info!("Closing application");

        let (metadata_path, accept_votes, deny_votes) = match self.state.metadata_path().clone() {
            Some(path) => {
                let metadata = ApplicationMetadata::read(&path)?;
                info!(path = %path.display(), "Vote already closed, resuming at step 5");
                (path, *metadata.accept_votes(), *metadata.deny_votes())
            }
            None => {
                self.close_vote(result, result_message, &member_channel, &vote_id)
                    .await?
            }
        };

        self.client
            .send_message(&thread_id, self.config.thread_mlock(), &[], true)
            .await?;
        self.client
            .update_thread(&thread_id, &ThreadUpdate::lock_and_archive())
            .await?;
        info!("[SUCCESS] 5. Lock and archive thread");

        let accept_count = accept_votes.to_string();
        let deny_count = deny_votes.to_string();
        let result_token = result.to_string();
        let announcement = fill(
            self.config.member_mlock(),
            &[
                ("[APPLICANT_NAME]", self.config.applicant_name().as_str()),
                ("[ACCEPT_VOTES]", accept_count.as_str()),
                ("[DENY_VOTES]", deny_count.as_str()),
                ("[APP_RESULT]", result_token.as_str()),
            ],
        );
        self.client
            .send_message(&member_channel, &announcement, &[], false)
            .await?;
        let attachment = Attachment::from_path(&metadata_path)?;
        self.client
            .send_message(
                &member_channel,
                self.config.member_mmeta(),
                &[attachment],
                false,
            )
            .await?;
        info!("[SUCCESS] 6. Announce lock and publish metadata");

        self.send_result(result).await?;
        info!("[SUCCESS] 7. Send application result");

        self.state.record_end();
        self.store.save(&self.state)?;

        info!("Application closed");
        Ok(metadata_path)
    }

    /// Announce the result to the applicant and remove the operator's trigger message.
    #[instrument(skip(self, result), fields(result = %result))]
    pub async fn send_result(&self, result: &ApplicationResult) -> TribuneResult<()> {
        let applicant_channel = self.config.applicant_channel();
        let result_message = self.templates.lookup(result)?;
        info!("Sending result");

        let content = format!(
            "{} {}|<@{}> [{}] {}",
            self.config.commands().embed(),
            result.decision().banner(),
            self.applicant_id,
            self.config.applicant_name(),
            result_message
        );
        self.client
            .send_message(applicant_channel, &content, &[], false)
            .await?;
        self.pause().await;
        info!("[SUCCESS] 1. Send result message");

        let operator_id = self.config.operator_id().clone();
        self.delete_newest(applicant_channel, "result command", |m| {
            m.is_authored_by(&operator_id)
        })
        .await?;
        info!("[SUCCESS] 2. Delete result command");

        info!("Result sent");
        Ok(())
    }

    /// Steps 1-4 of `end`: lock, settle, count, write metadata, clear the channel.
    ///
    /// Returns the metadata path and the two tallies.
    async fn close_vote(
        &mut self,
        result: &ApplicationResult,
        result_message: String,
        member_channel: &str,
        vote_id: &str,
    ) -> TribuneResult<(PathBuf, usize, usize)> {
        self.client
            .send_message(member_channel, self.config.commands().lock(), &[], false)
            .await?;
        self.pause().await;
        info!("[SUCCESS] 1. Lock member channel");

        let messages = self.settle(member_channel).await?;
        info!(remaining = messages.len(), "[SUCCESS] 2. Purge discussion");

        let vote = find_message(&messages, "vote message", |m| m.id() == vote_id)?;
        let opened = parse_timestamp(vote.timestamp())?;
        let accept_votes = self
            .client
            .get_reaction_voters(member_channel, vote_id, self.config.accept_emoji())
            .await?
            .len();
        let deny_votes = self
            .client
            .get_reaction_voters(member_channel, vote_id, self.config.deny_emoji())
            .await?
            .len();

        let metadata = ApplicationMetadata::builder()
            .applicant_name(self.config.applicant_name().clone())
            .applicant_id(self.applicant_id.clone())
            .start_date(opened.date_naive().to_string())
            .time_elapsed(format_elapsed(Utc::now() - opened))
            .accept_votes(accept_votes)
            .deny_votes(deny_votes)
            .app_result(result.to_string())
            .result_message(result_message)
            .application_link(self.config.application_link().clone())
            .operator_id(self.config.operator_id().clone())
            .build()
            .map_err(|e| WorkflowError::new(WorkflowErrorKind::Metadata(e.to_string())))?;
        let metadata_path = metadata.write(self.config.meta_path(), self.config.file_prefix())?;
        self.state.record_closing(metadata_path.clone());
        self.store.save(&self.state)?;
        info!(
            path = %metadata_path.display(),
            accept_votes,
            deny_votes,
            "[SUCCESS] 3. Write application metadata"
        );

        for message in &messages {
            self.client
                .delete_message(member_channel, message.id())
                .await?;
        }
        info!(deleted = messages.len(), "[SUCCESS] 4. Delete remaining messages");

        Ok((metadata_path, accept_votes, deny_votes))
    }

    /// Purge until fewer than `threshold` messages remain; returns the last listing.
    async fn settle(&self, channel_id: &str) -> TribuneResult<Vec<Message>> {
        let settle = self.config.settle();
        let mut messages = self.fetch_latest(channel_id).await?;
        let mut attempts = 0u32;

        while messages.len() >= *settle.threshold() {
            if *settle.max_attempts() > 0 && attempts >= *settle.max_attempts() {
                return Err(WorkflowError::new(WorkflowErrorKind::SettleExhausted {
                    threshold: *settle.threshold(),
                    attempts,
                })
                .into());
            }

            debug!(count = messages.len(), attempts, "Channel not settled, purging");
            self.client
                .send_message(channel_id, self.config.commands().purge(), &[], false)
                .await?;
            attempts += 1;
            self.pause().await;
            messages = self.fetch_latest(channel_id).await?;
        }

        Ok(messages)
    }

    async fn fetch_latest(&self, channel_id: &str) -> TribuneResult<Vec<Message>> {
        Ok(self
            .client
            .fetch_messages(channel_id, MAX_PAGE_SIZE, &MessageQuery::latest())
            .await?)
    }

    /// Delete the newest message matching `predicate`. A miss is logged, not fatal.
    async fn delete_newest<P>(
        &self,
        channel_id: &str,
        description: &str,
        predicate: P,
    ) -> TribuneResult<()>
    where
        P: Fn(&Message) -> bool,
    {
        let messages = self.fetch_latest(channel_id).await?;
        match find_message(&messages, description, predicate) {
            Ok(message) => {
                self.client
                    .delete_message(channel_id, message.id())
                    .await?
            }
            Err(e) => warn!(channel_id, error = %e, "Skipping cleanup"),
        }
        Ok(())
    }

    async fn pause(&self) {
        let pause = *self.config.pause_ms();
        if pause > 0 {
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
    }
}
