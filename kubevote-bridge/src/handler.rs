//! `serenity::EventHandler` wiring: inbound chat relay, the `players`
//! slash command, and bot-status embeds (spec §4.6).

use std::sync::Arc;

use serenity::all::{
    Command, Context, CreateAttachment, CreateCommand, CreateInteractionResponse,
    CreateInteractionResponseMessage, EventHandler, GuildId, Interaction, Message, Ready,
};
use serenity::async_trait;

use crate::bridge::BridgeState;
use crate::players_command;
use crate::serenity_adapter::SerenityAdapter;

/// The bot's `serenity` event handler, holding shared bridge state and a
/// reference back to the adapter so it can record the gateway [`Context`]
/// for presence updates.
pub struct Handler {
    pub state: Arc<BridgeState>,
    pub adapter: Arc<SerenityAdapter>,
    pub guild_id: Option<u64>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, "discord bot connected");
        self.adapter.set_context(ctx.clone()).await;

        let command = CreateCommand::new("players").description("List players currently online");

        let registration = match self.guild_id {
            Some(guild_id) => {
                GuildId::new(guild_id)
                    .set_commands(&ctx.http, vec![command])
                    .await
            }
            None => Command::create_global_command(&ctx.http, command).await.map(|c| vec![c]),
        };

        if let Err(err) = registration {
            tracing::error!(%err, "failed to register the players slash command");
        }

        self.state.resolve_webhook().await;
        self.state.announce_startup().await;
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        if msg.channel_id.get() != self.state.config.discord_channel_id {
            return;
        }

        let content = if !msg.content.is_empty() {
            msg.content.clone()
        } else if !msg.attachments.is_empty() {
            "[attachment]".to_string()
        } else if !msg.sticker_items.is_empty() {
            "[sticker]".to_string()
        } else {
            return;
        };

        self.state.relay_chat_to_game(&msg.author.name, &content).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else { return };
        if command.data.name != "players" {
            return;
        }

        let players_command::PlayersResponse { embed, ephemeral } = players_command::build_embed(&self.state).await;

        let mut response = CreateInteractionResponseMessage::new().embed(SerenityAdapter::build_embed(&embed));
        if ephemeral {
            response = response.ephemeral(true);
        }
        if let Some((name, bytes)) = embed.image.clone() {
            response = response.add_file(CreateAttachment::bytes(bytes, name));
        }

        let builder = CreateInteractionResponse::Message(response);
        if let Err(err) = command.create_response(&ctx.http, builder).await {
            tracing::error!(%err, "failed to respond to the players slash command");
        }
    }
}
