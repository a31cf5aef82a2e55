//! End-to-end workflow tests against the in-memory chat platform.

use tempfile::TempDir;
use tribune_discord::{ApiCall, ChatApi, CommandEffect, InMemoryChat, MessageKind};
use tribune_error::{TribuneErrorKind, WorkflowErrorKind};
use tribune_workflow::{
    ApplicationResult, Orchestrator, ResultTemplates, SettleConfig, StateStore, WorkflowConfig,
    next_snowflake,
};

const OPERATOR: &str = "500";
const APPLICANT: &str = "4242";
const MEMBER: &str = "600";
const EMBED_BOT: &str = "900";
const APPLICANT_CHANNEL: &str = "10";
const MEMBER_CHANNEL: &str = "20";

const TEMPLATES: &str = r#"
[accept]
standard = "Welcome aboard!"

[deny]
standard = "Not this time."
"#;

struct Fixture {
    chat: InMemoryChat,
    dir: TempDir,
    config: WorkflowConfig,
}

impl Fixture {
    /// Platform with the guild's bots, an application message, and a config pointing at it.
    async fn new(purge_batch: usize) -> Self {
        let chat = InMemoryChat::new(OPERATOR);
        chat.on_command("1unlock", CommandEffect::Swallow).await;
        chat.on_command("1lock", CommandEffect::Swallow).await;
        chat.on_command("2purge", CommandEffect::Purge { batch: purge_batch })
            .await;
        chat.on_command(
            "2embed",
            CommandEffect::Relay {
                bot_id: EMBED_BOT.to_string(),
            },
        )
        .await;

        let application = chat
            .post_as(APPLICANT_CHANNEL, APPLICANT, "I would like to join")
            .await;
        let link = format!(
            "https://discord.com/channels/1/{}/{}",
            APPLICANT_CHANNEL,
            application.id()
        );
        Self::with_link(chat, &link)
    }

    fn with_link(chat: InMemoryChat, link: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            r#"
operator_token = "Bot test"
operator_id = "{OPERATOR}"
guild = "1"
applicant_channel = "{APPLICANT_CHANNEL}"
member_channel = "{MEMBER_CHANNEL}"
applicant_name = "Ada"
application_link = "{link}"
ping_role = "<@&7>"
accept_emoji = "yes"
deny_emoji = "no"
thread_m1 = "Hi <@[APPLICANT_ID]> [PING_ROLE]"
thread_m2 = "Your application: [APPLICATION_LINK]"
member_m1 = "[PING_ROLE] vote on [APPLICATION_LINK]"
thread_mlock = "Interview closed"
member_mlock = "[APPLICANT_NAME]: [ACCEPT_VOTES]/[DENY_VOTES] [APP_RESULT]"
member_mmeta = "Metadata attached"
file_prefix = "app"
meta_path = "unused"
pause_ms = 0
"#
        );
        let config = WorkflowConfig::from_toml(&text)
            .unwrap()
            .with_meta_path(dir.path().join("meta"));
        Self { chat, dir, config }
    }

    fn store(&self) -> StateStore {
        StateStore::new(self.dir.path().join("state.json"))
    }

    async fn orchestrator(&self) -> Orchestrator<InMemoryChat> {
        self.orchestrator_with(self.config.clone()).await
    }

    async fn orchestrator_with(&self, config: WorkflowConfig) -> Orchestrator<InMemoryChat> {
        Orchestrator::initialize(
            self.chat.clone(),
            config,
            ResultTemplates::from_toml(TEMPLATES).unwrap(),
            self.store(),
        )
        .await
        .unwrap()
    }

    async fn chatter(&self, count: usize) {
        for n in 0..count {
            self.chat
                .post_as(MEMBER_CHANNEL, MEMBER, &format!("thoughts #{}", n))
                .await;
        }
    }

    async fn commands_sent(&self, prefix: &str) -> usize {
        self.chat
            .calls()
            .await
            .iter()
            .filter(|call| {
                matches!(call, ApiCall::SendMessage { content, .. } if content.starts_with(prefix))
            })
            .count()
    }
}

fn workflow_kind(err: &tribune_error::TribuneError) -> &WorkflowErrorKind {
    err.workflow_kind()
        .unwrap_or_else(|| panic!("expected workflow error, got {}", err))
}

fn accept() -> ApplicationResult {
    "accept-standard".parse().unwrap()
}

#[tokio::test]
async fn test_initialize_identifies_applicant() {
    let fixture = Fixture::new(5).await;
    let orchestrator = fixture.orchestrator().await;
    assert_eq!(orchestrator.applicant_id(), APPLICANT);

    // One message, fetched from just after the linked id
    let calls = fixture.chat.calls().await;
    assert_eq!(
        calls,
        vec![ApiCall::FetchMessages {
            channel_id: APPLICANT_CHANNEL.to_string(),
            limit: 1,
        }]
    );
}

#[tokio::test]
async fn test_initialize_rejects_wrong_message() {
    let chat = InMemoryChat::new(OPERATOR);
    let application = chat.post_as(APPLICANT_CHANNEL, APPLICANT, "hello").await;
    // Points one past the real message, so the listing returns the real one instead
    let missing = next_snowflake(application.id()).unwrap();
    let link = format!(
        "https://discord.com/channels/1/{}/{}",
        APPLICANT_CHANNEL, missing
    );
    let fixture = Fixture::with_link(chat, &link);

    let err = Orchestrator::initialize(
        fixture.chat.clone(),
        fixture.config.clone(),
        ResultTemplates::default(),
        fixture.store(),
    )
    .await
    .unwrap_err();

    match workflow_kind(&err) {
        WorkflowErrorKind::ApplicantMismatch { expected, found } => {
            assert_eq!(expected, &missing);
            assert_eq!(found, application.id());
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_start_opens_thread_and_vote() {
    let fixture = Fixture::new(5).await;
    fixture.chatter(3).await;
    let mut orchestrator = fixture.orchestrator().await;

    orchestrator.start(false).await.unwrap();

    let state = orchestrator.state().clone();
    let thread_id = state.app_thread_id().clone().unwrap();
    let vote_id = state.vote_message_id().clone().unwrap();

    // Thread creation notice is gone; the application message stays
    let applicant_channel = fixture.chat.messages(APPLICANT_CHANNEL).await;
    assert_eq!(applicant_channel.len(), 1);
    assert!(applicant_channel[0].is_authored_by(APPLICANT));

    let thread = fixture.chat.messages(&thread_id).await;
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[1].content(), "Hi <@4242> <@&7>");
    assert!(thread[0].content().starts_with("Your application: https://"));

    // Only the pinned vote survives in the member channel
    let members = fixture.chat.messages(MEMBER_CHANNEL).await;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id(), &vote_id);
    assert!(*members[0].pinned());
    assert_ne!(*members[0].kind(), MessageKind::ChannelPinnedMessage);
    assert!(members[0].content().starts_with("<@&7>\nvote\non\nhttps://"));

    let voters = fixture
        .chat
        .get_reaction_voters(MEMBER_CHANNEL, &vote_id, "yes")
        .await
        .unwrap();
    assert_eq!(voters.len(), 1);

    // Persisted for the next invocation
    let saved = fixture.store().load().unwrap();
    assert_eq!(saved, state);
    assert_eq!(saved.applicant_id().as_deref(), Some(APPLICANT));
}

#[tokio::test]
async fn test_start_refuses_second_run_without_force() {
    let fixture = Fixture::new(5).await;
    fixture.orchestrator().await.start(false).await.unwrap();

    // A fresh process sees the recorded thread
    let mut again = fixture.orchestrator().await;
    let err = again.start(false).await.unwrap_err();
    assert!(matches!(
        workflow_kind(&err),
        WorkflowErrorKind::AlreadyStarted(_)
    ));

    let first_thread = again.state().app_thread_id().clone();
    again.start(true).await.unwrap();
    assert_ne!(again.state().app_thread_id(), &first_thread);
}

#[tokio::test]
async fn test_end_requires_started_application() {
    let fixture = Fixture::new(5).await;
    let mut orchestrator = fixture.orchestrator().await;
    fixture.chat.clear_calls().await;

    let err = orchestrator.end(&accept()).await.unwrap_err();
    assert!(matches!(workflow_kind(&err), WorkflowErrorKind::NotStarted(_)));
    assert!(fixture.chat.calls().await.is_empty());
}

#[tokio::test]
async fn test_end_closes_application() {
    let fixture = Fixture::new(5).await;
    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.start(false).await.unwrap();

    let thread_id = orchestrator.state().app_thread_id().clone().unwrap();
    let vote_id = orchestrator.state().vote_message_id().clone().unwrap();
    for voter in ["601", "602", "603"] {
        fixture
            .chat
            .add_voter(MEMBER_CHANNEL, &vote_id, "yes", voter)
            .await;
    }
    fixture
        .chat
        .add_voter(MEMBER_CHANNEL, &vote_id, "no", "604")
        .await;
    fixture.chatter(25).await;
    let trigger = fixture
        .chat
        .post_as(APPLICANT_CHANNEL, OPERATOR, "/tribune end accept-standard")
        .await;
    fixture.chat.clear_calls().await;

    let path = orchestrator.end(&accept()).await.unwrap();

    // 26 messages shrink by 5 per purge: 21, 16, 11, 6
    assert_eq!(fixture.commands_sent("2purge").await, 4);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let file_name = format!(
        "app_{}_{}.json",
        written["start_date"].as_str().unwrap(),
        APPLICANT
    );
    assert_eq!(path, fixture.dir.path().join("meta").join(&file_name));
    assert_eq!(written["accept_votes"], 4);
    assert_eq!(written["deny_votes"], 2);
    assert_eq!(written["result_message"], "Welcome aboard!");
    assert_eq!(written["operator_id"], OPERATOR);

    // Thread gets the closing note, then is locked and archived
    let thread = fixture.chat.thread(&thread_id).await.unwrap();
    let flags = thread.thread_metadata().clone().unwrap();
    assert!(*flags.locked() && *flags.archived());
    assert_eq!(
        fixture.chat.messages(&thread_id).await[0].content(),
        "Interview closed"
    );

    // Member channel holds only the announcement and the metadata post
    let members = fixture.chat.messages(MEMBER_CHANNEL).await;
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].content(), "Ada: 4/2 accept-standard");
    assert_eq!(members[0].attachments()[0].filename(), &file_name);

    // Result relayed by the embed bot; the operator's trigger removed
    let applicant_channel = fixture.chat.messages(APPLICANT_CHANNEL).await;
    assert!(applicant_channel[0].is_authored_by(EMBED_BOT));
    assert!(applicant_channel.iter().all(|m| m.id() != trigger.id()));

    let state = fixture.store().load().unwrap();
    assert!(state.app_thread_id().is_none());
    assert!(state.vote_message_id().is_none());
}

#[tokio::test]
async fn test_end_counts_empty_voter_list_as_zero() {
    let fixture = Fixture::new(5).await;
    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.start(false).await.unwrap();

    // Nobody left on the deny side, not even the seed reaction
    let vote_id = orchestrator.state().vote_message_id().clone().unwrap();
    fixture
        .chat
        .clear_reactions(MEMBER_CHANNEL, &vote_id, "no")
        .await;
    fixture
        .chat
        .add_voter(MEMBER_CHANNEL, &vote_id, "yes", "601")
        .await;

    let path = orchestrator.end(&accept()).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["accept_votes"], 2);
    assert_eq!(written["deny_votes"], 0);

    let members = fixture.chat.messages(MEMBER_CHANNEL).await;
    assert_eq!(members[1].content(), "Ada: 2/0 accept-standard");
}

#[tokio::test]
async fn test_end_resumes_after_vote_was_deleted() {
    let fixture = Fixture::new(5).await;
    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.start(false).await.unwrap();
    let vote_id = orchestrator.state().vote_message_id().clone().unwrap();
    fixture
        .chat
        .add_voter(MEMBER_CHANNEL, &vote_id, "yes", "601")
        .await;
    fixture.chatter(3).await;

    // Fails at step 5, after the vote is gone
    fixture.chat.fail_thread_updates(1).await;
    let err = orchestrator.end(&accept()).await.unwrap_err();
    match err.kind() {
        TribuneErrorKind::Discord(e) => assert_eq!(e.status(), Some(500)),
        other => panic!("unexpected error: {}", other),
    }
    assert!(fixture.chat.messages(MEMBER_CHANNEL).await.is_empty());
    let saved = fixture.store().load().unwrap();
    let recorded = saved.metadata_path().clone().unwrap();
    assert!(saved.app_thread_id().is_some());

    // A fresh run picks the tally up from the metadata file
    let mut again = fixture.orchestrator().await;
    let path = again.end(&accept()).await.unwrap();
    assert_eq!(path, recorded);

    let members = fixture.chat.messages(MEMBER_CHANNEL).await;
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].content(), "Ada: 2/1 accept-standard");

    let state = fixture.store().load().unwrap();
    assert!(state.app_thread_id().is_none());
    assert!(state.metadata_path().is_none());
}

#[tokio::test]
async fn test_settle_stops_below_threshold() {
    let fixture = Fixture::new(5).await;
    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.start(false).await.unwrap();

    // Vote plus 8 = 9 messages: already settled
    fixture.chatter(8).await;
    orchestrator.end(&accept()).await.unwrap();
    assert_eq!(fixture.commands_sent("2purge").await, 0);
}

#[tokio::test]
async fn test_settle_purges_at_threshold() {
    let fixture = Fixture::new(5).await;
    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.start(false).await.unwrap();

    // Vote plus 9 = 10 messages: one purge brings it to 5
    fixture.chatter(9).await;
    orchestrator.end(&accept()).await.unwrap();
    assert_eq!(fixture.commands_sent("2purge").await, 1);
}

#[tokio::test]
async fn test_settle_gives_up_after_max_attempts() {
    let fixture = Fixture::new(1).await;
    let config = fixture.config.clone().with_settle(SettleConfig::new(10, 2));
    let mut orchestrator = fixture.orchestrator_with(config).await;
    orchestrator.start(false).await.unwrap();
    fixture.chatter(25).await;

    let err = orchestrator.end(&accept()).await.unwrap_err();
    match workflow_kind(&err) {
        WorkflowErrorKind::SettleExhausted { threshold, attempts } => {
            assert_eq!(*threshold, 10);
            assert_eq!(*attempts, 2);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(fixture.commands_sent("2purge").await, 2);

    // Nothing was closed, so the application can be ended again
    assert!(fixture.store().load().unwrap().app_thread_id().is_some());
}

#[tokio::test]
async fn test_send_result_posts_once_and_removes_trigger() {
    let fixture = Fixture::new(5).await;
    let orchestrator = fixture.orchestrator().await;
    let trigger = fixture
        .chat
        .post_as(APPLICANT_CHANNEL, OPERATOR, "/tribune result accept-standard")
        .await;
    fixture.chat.clear_calls().await;

    orchestrator.send_result(&accept()).await.unwrap();

    let calls = fixture.chat.calls().await;
    let sent: Vec<&ApiCall> = calls
        .iter()
        .filter(|c| matches!(c, ApiCall::SendMessage { .. }))
        .collect();
    assert_eq!(sent.len(), 1);
    match sent[0] {
        ApiCall::SendMessage {
            channel_id,
            content,
            ..
        } => {
            assert_eq!(channel_id, APPLICANT_CHANNEL);
            assert_eq!(
                content,
                "2embed #9fec97 Accepted|<@4242> [Ada] Welcome aboard!"
            );
        }
        other => panic!("unexpected call: {:?}", other),
    }

    let deletes: Vec<&ApiCall> = calls
        .iter()
        .filter(|c| matches!(c, ApiCall::DeleteMessage { .. }))
        .collect();
    assert_eq!(
        deletes,
        vec![&ApiCall::DeleteMessage {
            channel_id: APPLICANT_CHANNEL.to_string(),
            message_id: trigger.id().clone(),
        }]
    );
}

#[tokio::test]
async fn test_send_result_with_unknown_template_sends_nothing() {
    let fixture = Fixture::new(5).await;
    let orchestrator = fixture.orchestrator().await;
    fixture.chat.clear_calls().await;

    let result: ApplicationResult = "reject-spam".parse().unwrap();
    let err = orchestrator.send_result(&result).await.unwrap_err();
    assert!(matches!(
        workflow_kind(&err),
        WorkflowErrorKind::UnknownTemplate { .. }
    ));
    assert!(fixture.chat.calls().await.is_empty());
}
