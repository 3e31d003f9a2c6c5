//! The chat-platform adapter interface (spec §4.7).
//!
//! The bridge engine depends on this trait only; swapping chat SDKs means
//! providing a different implementation, with the engine reused as-is.
//! [`SerenityAdapter`] is the only implementation, built on `serenity`
//! (the standard async Discord library in the Rust ecosystem).

use async_trait::async_trait;

use crate::error::BridgeError;

/// A chat-platform embed, independent of any specific SDK's builder type.
#[derive(Debug, Clone)]
pub struct EmbedSpec {
    /// The embed title.
    pub title: String,
    /// The embed body.
    pub description: String,
    /// RGB color, e.g. `0x00FF00` for green.
    pub color: u32,
    /// An optional footer line.
    pub footer: Option<String>,
    /// An optional `attachment://<name>` image reference paired with raw
    /// bytes to upload alongside the embed.
    pub image: Option<(String, Vec<u8>)>,
}

impl EmbedSpec {
    /// A bare embed with just a title and description.
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            footer: None,
            image: None,
        }
    }
}

/// An opaque handle to a channel webhook, sufficient to post through it
/// without re-resolving it on every send.
#[derive(Debug, Clone)]
pub struct WebhookHandle {
    /// The webhook's snowflake id.
    pub id: u64,
    /// The webhook's secret token.
    pub token: String,
}

/// The interface the bridge engine depends on (spec §4.7).
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Sends a plain-text message to `channel_id`.
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), BridgeError>;

    /// Sends an embed to `channel_id`.
    async fn send_embed(&self, channel_id: u64, embed: EmbedSpec) -> Result<(), BridgeError>;

    /// Edits a channel's topic.
    async fn edit_topic(&self, channel_id: u64, topic: &str) -> Result<(), BridgeError>;

    /// Finds (or creates) a webhook named `name` on `channel_id`.
    async fn get_or_create_webhook(&self, channel_id: u64, name: &str) -> Result<WebhookHandle, BridgeError>;

    /// Posts as a synthetic user through a resolved webhook.
    async fn send_via_webhook(
        &self,
        webhook: &WebhookHandle,
        content: &str,
        username: &str,
        avatar_url: &str,
    ) -> Result<(), BridgeError>;

    /// Posts as a synthetic user through a bare webhook URL (the
    /// `DISCORD_WEBHOOK_URL` configuration path).
    async fn post_webhook_url(
        &self,
        url: &str,
        content: &str,
        username: &str,
        avatar_url: &str,
    ) -> Result<(), BridgeError>;

    /// Fetches arbitrary bytes over HTTP (used for avatar downloads).
    async fn http_get_bytes(&self, url: &str) -> Result<Vec<u8>, BridgeError>;

    /// Sets the bot's presence to "watching `<text>`".
    async fn set_presence(&self, text: &str);
}
