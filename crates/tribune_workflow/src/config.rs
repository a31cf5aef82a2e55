//! Workflow configuration: loading, defaults, and validation.
//!
//! The config file is a human-edited document and is only ever read. Values
//! are layered from the file and then from `TRIBUNE_`-prefixed environment
//! variables (`TRIBUNE_OPERATOR_TOKEN`, `TRIBUNE_SETTLE__THRESHOLD`).
//!
//! Deserialization accepts missing fields so that validation
//! can report every problem in one [`ConfigError`] before anything touches the
//! network.

use crate::{ApplicationLink, is_snowflake};
use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use tribune_discord::{DEFAULT_API_VERSION, DISCORD_API_BASE};
use tribune_error::ConfigError;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TRIBUNE";

/// Default result template file name, resolved beside the config file.
pub const DEFAULT_RESULTS_FILE: &str = "result_options.toml";

fn default_api_version() -> u8 {
    DEFAULT_API_VERSION
}

fn default_api_base() -> String {
    DISCORD_API_BASE.to_string()
}

fn default_pause_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_unlock() -> String {
    "1unlock".to_string()
}

fn default_lock() -> String {
    "1lock".to_string()
}

fn default_purge() -> String {
    "2purge 1000".to_string()
}

fn default_embed() -> String {
    "2embed".to_string()
}

fn default_threshold() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    120
}

/// Text commands understood by the moderation bots in the guild.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
pub struct CommandConfig {
    /// Opens the member channel for discussion
    #[serde(default = "default_unlock")]
    unlock: String,
    /// Closes the member channel
    #[serde(default = "default_lock")]
    lock: String,
    /// Bulk-deletes recent member channel messages
    #[serde(default = "default_purge")]
    purge: String,
    /// Prefix for the embed bot that formats the result announcement
    #[serde(default = "default_embed")]
    embed: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            unlock: default_unlock(),
            lock: default_lock(),
            purge: default_purge(),
            embed: default_embed(),
        }
    }
}

/// Bounds for the purge-and-refetch loop run by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Getters)]
pub struct SettleConfig {
    /// Keep purging while at least this many messages remain
    #[serde(default = "default_threshold")]
    threshold: usize,
    /// Purge commands to issue before giving up; 0 never gives up
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
}

impl SettleConfig {
    /// Settle bounds with an explicit threshold and ceiling.
    pub fn new(threshold: usize, max_attempts: u32) -> Self {
        Self {
            threshold,
            max_attempts,
        }
    }
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self::new(default_threshold(), default_max_attempts())
    }
}

/// The document as read, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawConfig {
    operator_token: Option<String>,
    operator_id: Option<String>,
    guild: Option<String>,
    applicant_channel: Option<String>,
    member_channel: Option<String>,
    applicant_name: Option<String>,
    application_link: Option<String>,
    ping_role: Option<String>,
    accept_emoji: Option<String>,
    deny_emoji: Option<String>,
    thread_m1: Option<String>,
    thread_m2: Option<String>,
    member_m1: Option<String>,
    thread_mlock: Option<String>,
    member_mlock: Option<String>,
    member_mmeta: Option<String>,
    file_prefix: Option<String>,
    meta_path: Option<String>,
    #[serde(default = "default_api_version")]
    api_version: u8,
    #[serde(default = "default_api_base")]
    api_base: String,
    #[serde(default = "default_pause_ms")]
    pause_ms: u64,
    #[serde(default = "default_true")]
    vote_split_lines: bool,
    #[serde(default)]
    commands: CommandConfig,
    #[serde(default)]
    settle: SettleConfig,
    state_path: Option<PathBuf>,
    results_path: Option<PathBuf>,
}

/// Validated workflow configuration. Read-only for the whole run.
#[derive(Clone, PartialEq, Eq, Getters)]
pub struct WorkflowConfig {
    /// Authorization header value for the operator account
    operator_token: String,
    /// Operator account id; its messages are the ones cleaned up
    operator_id: String,
    /// Guild id, used in links
    guild: String,
    /// Channel where applicants post and threads are opened
    applicant_channel: String,
    /// Members-only voting channel
    member_channel: String,
    /// Display name of the applicant, also the thread name
    applicant_name: String,
    /// Link to the application message
    application_link: String,
    /// The link split into channel and message ids
    application: ApplicationLink,
    /// Role mention text substituted for `[PING_ROLE]`
    ping_role: String,
    accept_emoji: String,
    deny_emoji: String,
    /// First interview message posted in the thread
    thread_m1: String,
    /// Second interview message posted in the thread
    thread_m2: String,
    /// Vote initiator posted in the member channel
    member_m1: String,
    /// Posted into the thread before it is locked
    thread_mlock: String,
    /// Posted into the member channel after voting closes
    member_mlock: String,
    /// Posted with the metadata file attached
    member_mmeta: String,
    /// Prefix of metadata file names
    file_prefix: String,
    /// Directory metadata files are written to
    meta_path: PathBuf,
    api_version: u8,
    api_base: String,
    /// Fixed pause after steps that wait on the service or a bot
    pause_ms: u64,
    /// Put each word of the vote initiator on its own line
    vote_split_lines: bool,
    commands: CommandConfig,
    settle: SettleConfig,
    /// Where workflow state is persisted
    state_path: PathBuf,
    /// Where result templates are read from
    results_path: PathBuf,
}

impl std::fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("operator_token", &"<redacted>")
            .field("operator_id", &self.operator_id)
            .field("guild", &self.guild)
            .field("applicant_channel", &self.applicant_channel)
            .field("member_channel", &self.member_channel)
            .field("applicant_name", &self.applicant_name)
            .field("application_link", &self.application_link)
            .field("api_version", &self.api_version)
            .field("pause_ms", &self.pause_ms)
            .field("settle", &self.settle)
            .field("state_path", &self.state_path)
            .field("results_path", &self.results_path)
            .finish_non_exhaustive()
    }
}

impl WorkflowConfig {
    /// Load and validate the config at `path`, layering environment overrides.
    ///
    /// The file format follows the extension (`.toml`, `.ini`, `.json`).
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, or lists every missing and
    /// malformed field found during validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading workflow configuration");

        let raw: RawConfig = Config::builder()
            .add_source(File::from(path))
            .add_source(environment())
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        Self::validate(raw, Some(path))
    }

    /// Parse and validate TOML text. Defaults for paths resolve against the
    /// working directory.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to read configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        Self::validate(raw, None)
    }

    /// Check every field, collecting all problems before failing.
    fn validate(raw: RawConfig, origin: Option<&Path>) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        let mut required = |name: &str, value: Option<String>| -> String {
            match value.map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => v,
                _ => {
                    problems.push(format!("missing field `{}`", name));
                    String::new()
                }
            }
        };

        let operator_token = required("operator_token", raw.operator_token);
        let operator_id = required("operator_id", raw.operator_id);
        let guild = required("guild", raw.guild);
        let applicant_channel = required("applicant_channel", raw.applicant_channel);
        let member_channel = required("member_channel", raw.member_channel);
        let applicant_name = required("applicant_name", raw.applicant_name);
        let application_link = required("application_link", raw.application_link);
        let ping_role = required("ping_role", raw.ping_role);
        let accept_emoji = required("accept_emoji", raw.accept_emoji);
        let deny_emoji = required("deny_emoji", raw.deny_emoji);
        let thread_m1 = required("thread_m1", raw.thread_m1);
        let thread_m2 = required("thread_m2", raw.thread_m2);
        let member_m1 = required("member_m1", raw.member_m1);
        let thread_mlock = required("thread_mlock", raw.thread_mlock);
        let member_mlock = required("member_mlock", raw.member_mlock);
        let member_mmeta = required("member_mmeta", raw.member_mmeta);
        let file_prefix = required("file_prefix", raw.file_prefix);
        let meta_path = required("meta_path", raw.meta_path);

        for (name, value) in [
            ("operator_id", &operator_id),
            ("guild", &guild),
            ("applicant_channel", &applicant_channel),
            ("member_channel", &member_channel),
        ] {
            if !value.is_empty() && !is_snowflake(value) {
                problems.push(format!("`{}` must be a numeric id, got '{}'", name, value));
            }
        }

        let application = if application_link.is_empty() {
            None
        } else {
            match ApplicationLink::parse(&application_link) {
                Ok(link) => Some(link),
                Err(_) => {
                    problems.push(format!(
                        "`application_link` must end in /{{channel}}/{{message}}, got '{}'",
                        application_link
                    ));
                    None
                }
            }
        };

        if raw.api_version == 0 {
            problems.push("`api_version` must be positive".to_string());
        }
        if raw.settle.threshold == 0 {
            problems.push("`settle.threshold` must be at least 1".to_string());
        }

        let application = match application {
            Some(link) if problems.is_empty() => link,
            _ => return Err(ConfigError::invalid(problems)),
        };

        let state_path = raw.state_path.unwrap_or_else(|| match origin {
            Some(path) => path.with_extension("state.json"),
            None => PathBuf::from("tribune.state.json"),
        });
        let results_path = raw.results_path.unwrap_or_else(|| {
            origin
                .and_then(Path::parent)
                .map(|dir| dir.join(DEFAULT_RESULTS_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_FILE))
        });

        Ok(Self {
            operator_token,
            operator_id,
            guild,
            applicant_channel,
            member_channel,
            applicant_name,
            application_link,
            application,
            ping_role,
            accept_emoji,
            deny_emoji,
            thread_m1,
            thread_m2,
            member_m1,
            thread_mlock,
            member_mlock,
            member_mmeta,
            file_prefix,
            meta_path: PathBuf::from(meta_path),
            api_version: raw.api_version,
            api_base: raw.api_base,
            pause_ms: raw.pause_ms,
            vote_split_lines: raw.vote_split_lines,
            commands: raw.commands,
            settle: raw.settle,
            state_path,
            results_path,
        })
    }

    /// Replace the settle bounds.
    pub fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }

    /// Replace the pause between steps.
    pub fn with_pause_ms(mut self, pause_ms: u64) -> Self {
        self.pause_ms = pause_ms;
        self
    }

    /// Replace the metadata directory.
    pub fn with_meta_path(mut self, meta_path: impl Into<PathBuf>) -> Self {
        self.meta_path = meta_path.into();
        self
    }

    /// Replace the result template location.
    pub fn with_results_path(mut self, results_path: impl Into<PathBuf>) -> Self {
        self.results_path = results_path.into();
        self
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
operator_token = "Bot abc"
operator_id = "500"
guild = "1"
applicant_channel = "10"
member_channel = "20"
applicant_name = "Ada"
application_link = "https://discord.com/channels/1/10/1099"
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
meta_path = "meta"
"#;

    #[test]
    fn test_defaults_apply() {
        let config = WorkflowConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(*config.api_version(), 10);
        assert_eq!(config.api_base(), "https://discord.com/api");
        assert_eq!(*config.pause_ms(), 1000);
        assert!(*config.vote_split_lines());
        assert_eq!(config.commands().purge(), "2purge 1000");
        assert_eq!(config.commands().embed(), "2embed");
        assert_eq!(*config.settle(), SettleConfig::new(10, 120));
        assert_eq!(config.application().channel_id(), "10");
        assert_eq!(config.application().message_id(), "1099");
    }

    #[test]
    fn test_every_missing_field_is_reported() {
        let err = WorkflowConfig::from_toml("guild = \"1\"").unwrap_err();
        assert_eq!(err.problems.len(), 17);
        assert!(err.message.contains("operator_token"));
        assert!(err.message.contains("meta_path"));
        assert!(!err.message.contains("`guild`"));
    }

    #[test]
    fn test_malformed_ids_are_reported_together() {
        let text = MINIMAL
            .replace(r#"guild = "1""#, r#"guild = "main""#)
            .replace("channels/1/10/1099", "channels/1/general");
        let err = WorkflowConfig::from_toml(&text).unwrap_err();
        assert_eq!(err.problems.len(), 2);
        assert!(err.problems[0].contains("guild"));
        assert!(err.problems[1].contains("application_link"));
    }

    #[test]
    fn test_nested_tables_override_defaults() {
        let text = format!(
            "{}\n[commands]\nembed = \"!embed\"\n\n[settle]\nthreshold = 3\nmax_attempts = 0\n",
            MINIMAL
        );
        let config = WorkflowConfig::from_toml(&text).unwrap();
        assert_eq!(config.commands().embed(), "!embed");
        assert_eq!(config.commands().lock(), "1lock");
        assert_eq!(*config.settle(), SettleConfig::new(3, 0));
    }

    #[test]
    fn test_paths_resolve_beside_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tribune.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = WorkflowConfig::load(&path).unwrap();
        assert_eq!(config.state_path(), &dir.path().join("tribune.state.json"));
        assert_eq!(config.results_path(), &dir.path().join("result_options.toml"));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = WorkflowConfig::from_toml(MINIMAL).unwrap();
        assert!(!format!("{:?}", config).contains("Bot abc"));
    }
}
