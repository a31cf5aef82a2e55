//! HTTP implementation of [`ChatApi`] against the Discord REST API.

use crate::{
    Attachment, ChatApi, Channel, Endpoint, Message, MessageQuery, NewThread, PUBLIC_THREAD,
    ThreadUpdate, User,
};
use async_trait::async_trait;
use derive_getters::Getters;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tribune_error::{DiscordError, DiscordErrorKind, DiscordResult};
use tracing::{debug, error, instrument};

/// Service error code for "Unknown Message".
pub const UNKNOWN_MESSAGE_CODE: u64 = 10008;

const CLIENT_USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/crumplecup/tribune, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Whether `status` counts as success. Anything outside 200..=299 fails.
pub(crate) fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Whether a response body is the service's "Unknown Message" error.
///
/// Non-JSON bodies are not; callers fall through to the ordinary status check.
pub(crate) fn is_unknown_message(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("code").and_then(|code| code.as_u64()))
        == Some(UNKNOWN_MESSAGE_CODE)
}

/// Authenticated Discord REST client.
///
/// Two header sets are prepared up front: the JSON set (authorization plus
/// content type) and the upload set (authorization only), since multipart
/// requests must let the HTTP layer choose their own content type.
///
/// # Example
///
/// ```no_run
/// use tribune_discord::{ChatApi, DiscordClient, MessageQuery};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DiscordClient::new(std::env::var("TRIBUNE_OPERATOR_TOKEN")?, 10)?;
/// let latest = client.fetch_messages("1234567890", 10, &MessageQuery::latest()).await?;
/// println!("{} messages", latest.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Getters)]
pub struct DiscordClient {
    #[getter(skip)]
    client: Client,
    endpoint: Endpoint,
    #[getter(skip)]
    json_headers: HeaderMap,
    #[getter(skip)]
    upload_headers: HeaderMap,
}

impl DiscordClient {
    /// Client for the public API at `api_version`.
    ///
    /// # Errors
    ///
    /// Fails when the token cannot be used as a header value.
    pub fn new(token: impl AsRef<str>, api_version: u8) -> DiscordResult<Self> {
        Self::with_endpoint(token, Endpoint::new(api_version))
    }

    /// Client for a custom endpoint.
    #[instrument(skip(token), fields(token_len = token.as_ref().len(), base = %endpoint.base_url()))]
    pub fn with_endpoint(token: impl AsRef<str>, endpoint: Endpoint) -> DiscordResult<Self> {
        let authorization = HeaderValue::from_str(token.as_ref())
            .map_err(|_| DiscordError::new(DiscordErrorKind::InvalidToken))?;

        let mut upload_headers = HeaderMap::new();
        upload_headers.insert(AUTHORIZATION, authorization);
        upload_headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let mut json_headers = upload_headers.clone();
        json_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        debug!("Created Discord client");
        Ok(Self {
            client: Client::new(),
            endpoint,
            json_headers,
            upload_headers,
        })
    }

    /// Send a request, mapping transport failures.
    async fn dispatch(&self, request: RequestBuilder) -> DiscordResult<Response> {
        request.send().await.map_err(|e| {
            error!(error = %e, "Discord API request failed");
            DiscordError::new(DiscordErrorKind::Transport(e.to_string()))
        })
    }

    /// Fail unless the response status is in 200..=299.
    async fn check_status(response: Response) -> DiscordResult<Response> {
        let status = response.status().as_u16();
        if is_success(status) {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(status, body = %body, "Discord API returned error");
        Err(DiscordError::new(DiscordErrorKind::Status { status, body }))
    }

    /// Check status, then decode the JSON body.
    async fn decode<T: DeserializeOwned>(response: Response) -> DiscordResult<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to decode Discord response");
                DiscordError::new(DiscordErrorKind::Decode(e.to_string()))
            })
    }

    /// Build the multipart body. Every attachment is loaded first, so a bad
    /// descriptor fails before anything is sent.
    async fn upload_form(content: &str, attachments: &[Attachment]) -> DiscordResult<Form> {
        let mut form = Form::new().text("content", content.to_string());
        for (ix, attachment) in attachments.iter().enumerate() {
            form = form.part(format!("file{}", ix + 1), attachment.part().await?);
        }
        Ok(form)
    }
}

#[async_trait]
impl ChatApi for DiscordClient {
    #[instrument(skip(self, query))]
    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        query: &MessageQuery,
    ) -> DiscordResult<Vec<Message>> {
        let url = self.endpoint.channel_messages(channel_id, Some(limit));
        let request = self
            .client
            .get(url)
            .headers(self.json_headers.clone())
            .query(query);
        let messages: Vec<Message> = Self::decode(self.dispatch(request).await?).await?;
        debug!(count = messages.len(), "Fetched messages");
        Ok(messages)
    }

    #[instrument(skip(self, content, attachments), fields(attachments = attachments.len()))]
    async fn send_message(
        &self,
        destination_id: &str,
        content: &str,
        attachments: &[Attachment],
        is_thread: bool,
    ) -> DiscordResult<Message> {
        let url = if is_thread {
            self.endpoint.thread_contents(destination_id)
        } else {
            self.endpoint.channel_messages(destination_id, None)
        };

        let request = if attachments.is_empty() {
            self.client
                .post(url)
                .headers(self.json_headers.clone())
                .json(&serde_json::json!({ "content": content }))
        } else {
            let form = Self::upload_form(content, attachments).await?;
            self.client
                .post(url)
                .headers(self.upload_headers.clone())
                .multipart(form)
        };

        let message: Message = Self::decode(self.dispatch(request).await?).await?;
        debug!(message_id = %message.id(), "Sent message");
        Ok(message)
    }

    #[instrument(skip(self))]
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()> {
        let request = self
            .client
            .delete(self.endpoint.message(channel_id, message_id))
            .headers(self.json_headers.clone());
        let response = self.dispatch(request).await?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            DiscordError::new(DiscordErrorKind::Transport(e.to_string()))
        })?;

        if is_unknown_message(&body) {
            debug!("Message already deleted");
            return Ok(());
        }
        if !is_success(status) {
            error!(status, body = %body, "Discord API returned error");
            return Err(DiscordError::new(DiscordErrorKind::Status { status, body }));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> DiscordResult<()> {
        let request = self
            .client
            .put(self.endpoint.own_reaction(channel_id, message_id, emoji))
            .headers(self.json_headers.clone());
        Self::check_status(self.dispatch(request).await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_reaction_voters(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> DiscordResult<Vec<User>> {
        let request = self
            .client
            .get(self.endpoint.reaction_voters(channel_id, message_id, emoji))
            .headers(self.json_headers.clone());
        Self::decode(self.dispatch(request).await?).await
    }

    #[instrument(skip(self))]
    async fn pin_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()> {
        let request = self
            .client
            .put(self.endpoint.pins(channel_id, message_id))
            .headers(self.json_headers.clone());
        Self::check_status(self.dispatch(request).await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_thread(&self, channel_id: &str, name: &str) -> DiscordResult<Channel> {
        let request = self
            .client
            .post(self.endpoint.threads(channel_id))
            .headers(self.json_headers.clone())
            .json(&NewThread {
                name,
                kind: PUBLIC_THREAD,
            });
        let thread: Channel = Self::decode(self.dispatch(request).await?).await?;
        debug!(thread_id = %thread.id(), "Created thread");
        Ok(thread)
    }

    #[instrument(skip(self))]
    async fn update_thread(
        &self,
        thread_id: &str,
        update: &ThreadUpdate,
    ) -> DiscordResult<Channel> {
        let request = self
            .client
            .patch(self.endpoint.thread_info(thread_id))
            .headers(self.json_headers.clone())
            .json(update);
        Self::decode(self.dispatch(request).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_window_is_inclusive() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(is_success(299));
        assert!(!is_success(199));
        assert!(!is_success(300));
        assert!(!is_success(404));
    }

    #[test]
    fn test_unknown_message_body_is_detected() {
        assert!(is_unknown_message(
            r#"{"message": "Unknown Message", "code": 10008}"#
        ));
        assert!(!is_unknown_message(
            r#"{"message": "Missing Permissions", "code": 50013}"#
        ));
    }

    #[test]
    fn test_non_json_body_is_not_unknown_message() {
        assert!(!is_unknown_message(""));
        assert!(!is_unknown_message("<html>Bad Gateway</html>"));
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let err = DiscordClient::new("bad\ntoken", 10).unwrap_err();
        assert_eq!(err.kind(), &DiscordErrorKind::InvalidToken);
    }

    #[test]
    fn test_client_uses_requested_api_version() {
        let client = DiscordClient::new("token", 9).unwrap();
        assert_eq!(client.endpoint().base_url(), "https://discord.com/api/v9/");
    }

    #[tokio::test]
    async fn test_upload_form_rejects_bad_attachment_before_sending() {
        let attachments = [Attachment::path("meta.json", "/no/such/dir/meta.json")];
        let err = DiscordClient::upload_form("hi", &attachments)
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), DiscordErrorKind::InvalidAttachment(_)));
    }
}
