//! Resource locators for the versioned Discord REST API.
//!
//! Every locator is a pure function of the API base path and the ids passed
//! in; nothing here touches the network.

use derive_getters::Getters;

/// Discord API host, without version suffix.
pub const DISCORD_API_BASE: &str = "https://discord.com/api";

/// API version this crate speaks by default.
pub const DEFAULT_API_VERSION: u8 = 10;

/// Builds URLs for guild, channel, message, thread, and user resources.
///
/// # Example
///
/// ```
/// use tribune_discord::Endpoint;
///
/// let endpoint = Endpoint::new(10);
/// assert_eq!(
///     endpoint.message("111", "222"),
///     "https://discord.com/api/v10/channels/111/messages/222"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Endpoint {
    /// Base URL including the version segment and a trailing slash
    base_url: String,
}

impl Endpoint {
    /// Locator for the public Discord API at the given version.
    pub fn new(api_version: u8) -> Self {
        Self::with_base(DISCORD_API_BASE, api_version)
    }

    /// Locator rooted at a custom API host (proxies, test servers).
    pub fn with_base(api_base: &str, api_version: u8) -> Self {
        Self {
            base_url: format!("{}/v{}/", api_base.trim_end_matches('/'), api_version),
        }
    }

    // Guild

    /// `guilds/{guild}`
    pub fn guild(&self, guild_id: &str) -> String {
        format!("{}guilds/{}", self.base_url, guild_id)
    }

    /// `guilds/{guild}/channels`
    pub fn guild_channels(&self, guild_id: &str) -> String {
        format!("{}guilds/{}/channels", self.base_url, guild_id)
    }

    /// `guilds/{guild}/messages/search?limit={limit}`
    pub fn guild_message_search(&self, guild_id: &str, limit: u8) -> String {
        format!(
            "{}guilds/{}/messages/search?limit={}",
            self.base_url, guild_id, limit
        )
    }

    // Channel

    /// `channels/{channel}/messages/{message}`
    pub fn message(&self, channel_id: &str, message_id: &str) -> String {
        format!(
            "{}channels/{}/messages/{}",
            self.base_url, channel_id, message_id
        )
    }

    /// `channels/{channel}/messages/{message}/reactions/`
    pub fn message_reactions(&self, channel_id: &str, message_id: &str) -> String {
        format!(
            "{}channels/{}/messages/{}/reactions/",
            self.base_url, channel_id, message_id
        )
    }

    /// `channels/{channel}/pins/{message}`
    pub fn pins(&self, channel_id: &str, message_id: &str) -> String {
        format!("{}channels/{}/pins/{}", self.base_url, channel_id, message_id)
    }

    /// The caller's own reaction: `.../reactions/{emoji}/%40me`
    pub fn own_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> String {
        format!(
            "{}/%40me",
            self.reaction_voters(channel_id, message_id, emoji)
        )
    }

    /// Everyone who reacted with `emoji`: `.../reactions/{emoji}`
    pub fn reaction_voters(&self, channel_id: &str, message_id: &str, emoji: &str) -> String {
        format!(
            "{}channels/{}/messages/{}/reactions/{}",
            self.base_url, channel_id, message_id, emoji
        )
    }

    /// `channels/{channel}/messages`, with `?limit=` when a nonzero limit is
    /// given. A zero limit is left off so the service applies its default.
    pub fn channel_messages(&self, channel_id: &str, limit: Option<u8>) -> String {
        match limit.filter(|limit| *limit > 0) {
            Some(limit) => format!(
                "{}channels/{}/messages?limit={}",
                self.base_url, channel_id, limit
            ),
            None => format!("{}channels/{}/messages", self.base_url, channel_id),
        }
    }

    /// `channels/{channel}/threads`
    pub fn threads(&self, channel_id: &str) -> String {
        format!("{}channels/{}/threads", self.base_url, channel_id)
    }

    /// Messages inside a thread. Threads are channels, so this shares the
    /// channel messages path.
    pub fn thread_contents(&self, thread_id: &str) -> String {
        self.channel_messages(thread_id, None)
    }

    /// `channels/{thread}`
    pub fn thread_info(&self, thread_id: &str) -> String {
        format!("{}channels/{}", self.base_url, thread_id)
    }

    // User

    /// `users/{user}`
    pub fn user(&self, user_id: &str) -> String {
        format!("{}users/{}", self.base_url, user_id)
    }

    /// `users/{user}/profile`
    pub fn user_profile(&self, user_id: &str) -> String {
        format!("{}users/{}/profile", self.base_url, user_id)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_includes_version() {
        assert_eq!(Endpoint::new(9).base_url(), "https://discord.com/api/v9/");
        assert_eq!(
            Endpoint::with_base("http://localhost:8080/", 10).base_url(),
            "http://localhost:8080/v10/"
        );
    }

    #[test]
    fn test_guild_family() {
        let e = Endpoint::default();
        assert_eq!(e.guild("1"), "https://discord.com/api/v10/guilds/1");
        assert_eq!(
            e.guild_channels("1"),
            "https://discord.com/api/v10/guilds/1/channels"
        );
        assert_eq!(
            e.guild_message_search("1", 25),
            "https://discord.com/api/v10/guilds/1/messages/search?limit=25"
        );
    }

    #[test]
    fn test_channel_messages_limit_is_optional() {
        let e = Endpoint::default();
        assert_eq!(
            e.channel_messages("5", None),
            "https://discord.com/api/v10/channels/5/messages"
        );
        assert_eq!(
            e.channel_messages("5", Some(100)),
            "https://discord.com/api/v10/channels/5/messages?limit=100"
        );
    }

    #[test]
    fn test_zero_limit_is_omitted() {
        let e = Endpoint::default();
        assert_eq!(
            e.channel_messages("5", Some(0)),
            "https://discord.com/api/v10/channels/5/messages"
        );
    }

    #[test]
    fn test_reaction_locators() {
        let e = Endpoint::default();
        assert_eq!(
            e.reaction_voters("5", "6", "yes:77"),
            "https://discord.com/api/v10/channels/5/messages/6/reactions/yes:77"
        );
        assert_eq!(
            e.own_reaction("5", "6", "yes:77"),
            "https://discord.com/api/v10/channels/5/messages/6/reactions/yes:77/%40me"
        );
        assert_eq!(
            e.message_reactions("5", "6"),
            "https://discord.com/api/v10/channels/5/messages/6/reactions/"
        );
    }

    #[test]
    fn test_thread_and_user_locators() {
        let e = Endpoint::default();
        assert_eq!(e.threads("5"), "https://discord.com/api/v10/channels/5/threads");
        assert_eq!(
            e.thread_contents("8"),
            "https://discord.com/api/v10/channels/8/messages"
        );
        assert_eq!(e.thread_info("8"), "https://discord.com/api/v10/channels/8");
        assert_eq!(e.pins("5", "6"), "https://discord.com/api/v10/channels/5/pins/6");
        assert_eq!(e.user("3"), "https://discord.com/api/v10/users/3");
        assert_eq!(
            e.user_profile("3"),
            "https://discord.com/api/v10/users/3/profile"
        );
    }
}
