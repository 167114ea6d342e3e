//! Discord channel history over the REST API.

use std::time::Duration;

use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use chatblog_shared::{ChatBlogError, DiscordCredentials, Message, Result};

use crate::MessageSource;

/// Largest page the messages endpoint returns.
pub const MAX_FETCH_LIMIT: u32 = 100;

/// Channel type id for a guild text channel.
const GUILD_TEXT: u8 = 0;

/// Default timeout in seconds for Discord requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for Discord requests.
const USER_AGENT: &str = concat!("chatblog/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChannelPayload {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    content: String,
    timestamp: String,
    author: AuthorPayload,
}

#[derive(Debug, Deserialize)]
struct AuthorPayload {
    username: String,
}

// ---------------------------------------------------------------------------
// DiscordSource
// ---------------------------------------------------------------------------

/// Fetches the most recent messages of one text channel.
pub struct DiscordSource {
    client: Client,
    api_base: String,
    credentials: DiscordCredentials,
    limit: u32,
}

impl DiscordSource {
    /// Build a source for `credentials.channel_id`.
    ///
    /// `limit` is clamped to `1..=MAX_FETCH_LIMIT`.
    pub fn new(api_base: &str, credentials: DiscordCredentials, limit: u32) -> Result<Self> {
        Url::parse(api_base)
            .map_err(|e| ChatBlogError::config(format!("invalid Discord API base '{api_base}': {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChatBlogError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
            limit: limit.clamp(1, MAX_FETCH_LIMIT),
        })
    }

    /// Confirm the channel exists and is a guild text channel.
    async fn check_channel(&self) -> Result<()> {
        let url = format!("{}/channels/{}", self.api_base, self.credentials.channel_id);
        let channel: ChannelPayload = self.get_json(&url).await?;

        if channel.kind != GUILD_TEXT {
            return Err(ChatBlogError::Source(format!(
                "channel {} is not a text channel (type {})",
                self.credentials.channel_id, channel.kind
            )));
        }

        info!(
            channel = channel.name.as_deref().unwrap_or("?"),
            "fetching messages from channel"
        );
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bot {}", self.credentials.token))
            .send()
            .await
            .map_err(|e| ChatBlogError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ChatBlogError::Source(format!(
                "channel {} not found",
                self.credentials.channel_id
            )));
        }
        if !status.is_success() {
            return Err(ChatBlogError::Source(format!("{url}: HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| ChatBlogError::parse(format!("{url}: unexpected response body: {e}")))
    }
}

impl MessageSource for DiscordSource {
    #[instrument(skip_all, fields(channel_id = %self.credentials.channel_id, limit = self.limit))]
    async fn fetch(&self) -> Result<Vec<Message>> {
        self.check_channel().await?;

        let url = format!(
            "{}/channels/{}/messages?limit={}",
            self.api_base, self.credentials.channel_id, self.limit
        );
        let payloads: Vec<MessagePayload> = self.get_json(&url).await?;

        let total = payloads.len();
        let messages: Vec<Message> = payloads.into_iter().filter_map(into_message).collect();

        if messages.len() < total {
            debug!(dropped = total - messages.len(), "messages with bad timestamps dropped");
        }
        info!(count = messages.len(), "fetched messages");

        Ok(messages)
    }
}

fn into_message(payload: MessagePayload) -> Option<Message> {
    match DateTime::parse_from_rfc3339(&payload.timestamp) {
        Ok(ts) => Some(Message {
            author: payload.author.username,
            body: payload.content,
            timestamp: ts.timestamp_millis(),
        }),
        Err(e) => {
            warn!(timestamp = %payload.timestamp, error = %e, "skipping message with unparseable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn creds() -> DiscordCredentials {
        DiscordCredentials {
            token: "tkn".into(),
            channel_id: "42".into(),
        }
    }

    async fn mount_channel(server: &MockServer, kind: u8) {
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .and(header("authorization", "Bot tkn"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "42", "type": kind, "name": "general"})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn limit_is_clamped() {
        let source = DiscordSource::new("https://discord.com/api/v10", creds(), 500).unwrap();
        assert_eq!(source.limit, MAX_FETCH_LIMIT);
        let source = DiscordSource::new("https://discord.com/api/v10/", creds(), 0).unwrap();
        assert_eq!(source.limit, 1);
        assert_eq!(source.api_base, "https://discord.com/api/v10");
    }

    #[test]
    fn invalid_api_base_is_config_error() {
        let err = DiscordSource::new("not a url", creds(), 10).err().unwrap();
        assert!(matches!(err, ChatBlogError::Config { .. }));
    }

    #[tokio::test]
    async fn fetch_maps_messages() {
        let server = MockServer::start().await;
        mount_channel(&server, GUILD_TEXT).await;

        Mock::given(method("GET"))
            .and(path("/channels/42/messages"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "2",
                    "content": "second",
                    "timestamp": "2024-03-01T10:05:00.000000+00:00",
                    "author": {"id": "9", "username": "bo"}
                },
                {
                    "id": "1",
                    "content": "first #rust",
                    "timestamp": "2024-03-01T10:00:00.000000+00:00",
                    "author": {"id": "8", "username": "ana"}
                }
            ])))
            .mount(&server)
            .await;

        let source = DiscordSource::new(&server.uri(), creds(), 100).unwrap();
        let messages = source.fetch().await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].author, "ana");
        assert_eq!(messages[1].body, "first #rust");
        assert_eq!(messages[0].timestamp - messages[1].timestamp, 5 * 60 * 1000);
    }

    #[tokio::test]
    async fn fetch_skips_bad_timestamps() {
        let server = MockServer::start().await;
        mount_channel(&server, GUILD_TEXT).await;

        Mock::given(method("GET"))
            .and(path("/channels/42/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"content": "ok", "timestamp": "2024-03-01T10:00:00+00:00", "author": {"username": "a"}},
                {"content": "bad", "timestamp": "yesterday", "author": {"username": "b"}}
            ])))
            .mount(&server)
            .await;

        let source = DiscordSource::new(&server.uri(), creds(), 100).unwrap();
        let messages = source.fetch().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "ok");
    }

    #[tokio::test]
    async fn non_text_channel_is_rejected() {
        let server = MockServer::start().await;
        mount_channel(&server, 2).await;

        let source = DiscordSource::new(&server.uri(), creds(), 100).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("not a text channel"));
    }

    #[tokio::test]
    async fn missing_channel_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = DiscordSource::new(&server.uri(), creds(), 100).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ChatBlogError::Source(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn unauthorized_is_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let source = DiscordSource::new(&server.uri(), creds(), 100).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
