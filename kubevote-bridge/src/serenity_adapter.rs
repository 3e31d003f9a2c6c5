//! The `serenity`-backed [`ChatPlatform`] implementation (spec §4.7).

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ChannelId, Colour, Context, CreateAttachment, CreateEmbed, CreateEmbedFooter, CreateMessage,
    CreateWebhook, EditChannel, ExecuteWebhook, Http, OnlineStatus, Webhook, WebhookId,
};
use tokio::sync::RwLock;

use crate::adapter::{ChatPlatform, EmbedSpec, WebhookHandle};
use crate::error::BridgeError;

/// Wraps a `serenity::http::Http` REST client plus a bare `reqwest`
/// client for webhook-URL posts and avatar downloads, and the latest
/// gateway [`Context`] (for presence updates, which require a live
/// shard connection rather than just REST).
pub struct SerenityAdapter {
    http: Arc<Http>,
    reqwest: reqwest::Client,
    context: RwLock<Option<Context>>,
}

impl SerenityAdapter {
    /// Wraps an existing `serenity` HTTP client.
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            reqwest: reqwest::Client::new(),
            context: RwLock::new(None),
        }
    }

    /// Called from the `ready` event handler so presence updates have a
    /// live gateway context to act on.
    pub async fn set_context(&self, ctx: Context) {
        *self.context.write().await = Some(ctx);
    }

    /// Converts a platform-agnostic [`EmbedSpec`] into a `serenity`
    /// `CreateEmbed` builder. Exposed to [`crate::handler`] so slash-command
    /// responses can reuse the same embed construction as regular sends.
    pub fn build_embed(spec: &EmbedSpec) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(&spec.title)
            .description(&spec.description)
            .colour(Colour::new(spec.color));

        if let Some(footer) = &spec.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        if let Some((name, _)) = &spec.image {
            embed = embed.image(format!("attachment://{name}"));
        }

        embed
    }
}

#[async_trait]
impl ChatPlatform for SerenityAdapter {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), BridgeError> {
        ChannelId::new(channel_id)
            .send_message(&self.http, CreateMessage::new().content(content))
            .await?;
        Ok(())
    }

    async fn send_embed(&self, channel_id: u64, embed: EmbedSpec) -> Result<(), BridgeError> {
        let mut message = CreateMessage::new().embed(Self::build_embed(&embed));

        if let Some((name, bytes)) = embed.image.clone() {
            message = message.add_file(CreateAttachment::bytes(bytes, name));
        }

        ChannelId::new(channel_id).send_message(&self.http, message).await?;
        Ok(())
    }

    async fn edit_topic(&self, channel_id: u64, topic: &str) -> Result<(), BridgeError> {
        ChannelId::new(channel_id)
            .edit(&self.http, EditChannel::new().topic(topic))
            .await?;
        Ok(())
    }

    async fn get_or_create_webhook(&self, channel_id: u64, name: &str) -> Result<WebhookHandle, BridgeError> {
        let channel = ChannelId::new(channel_id);

        let webhooks = channel.webhooks(&self.http).await?;
        if let Some(existing) = webhooks.into_iter().find(|w| w.name.as_deref() == Some(name)) {
            let token = existing.token.clone().unwrap_or_default();
            return Ok(WebhookHandle {
                id: existing.id.get(),
                token,
            });
        }

        let created = channel.create_webhook(&self.http, CreateWebhook::new(name)).await?;
        let token = created.token.clone().unwrap_or_default();
        Ok(WebhookHandle {
            id: created.id.get(),
            token,
        })
    }

    async fn send_via_webhook(
        &self,
        webhook: &WebhookHandle,
        content: &str,
        username: &str,
        avatar_url: &str,
    ) -> Result<(), BridgeError> {
        let resolved = Webhook::from_id_with_token(&self.http, WebhookId::new(webhook.id), &webhook.token).await?;

        let builder = ExecuteWebhook::new()
            .content(content)
            .username(username)
            .avatar_url(avatar_url);

        resolved.execute(&self.http, false, builder).await?;
        Ok(())
    }

    async fn post_webhook_url(
        &self,
        url: &str,
        content: &str,
        username: &str,
        avatar_url: &str,
    ) -> Result<(), BridgeError> {
        self.reqwest
            .post(url)
            .json(&serde_json::json!({
                "content": content,
                "username": username,
                "avatar_url": avatar_url,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn http_get_bytes(&self, url: &str) -> Result<Vec<u8>, BridgeError> {
        let bytes = self.reqwest.get(url).send().await?.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn set_presence(&self, text: &str) {
        if let Some(ctx) = self.context.read().await.as_ref() {
            ctx.set_presence(
                Some(serenity::gateway::ActivityData::watching(text)),
                OnlineStatus::Online,
            );
        }
    }
}
