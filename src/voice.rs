use async_trait::async_trait;
use serde_json::Value;
use serenity::model::id::{ChannelId, GuildId};
use std::time::Duration;
use crate::{
    error::{GatewayError, PlayerResult},
    model::gateway::VoiceStateUpdate,
};

/// What the player needs from the host client: asking the gateway to join, move or leave voice.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// `None` leaves the voice channel of the guild.
    async fn change_voice_state(&self, guild_id: GuildId, channel_id: Option<ChannelId>) -> Result<(), GatewayError>;
}

/// Voice connection callbacks the host invokes on the session bound to a guild.
#[async_trait]
pub trait VoiceSession: Send {
    /// Joins the bound voice channel, failing if the host didn't accept the request within `timeout`.
    async fn connect(&mut self, timeout: Duration) -> PlayerResult<()>;

    /// Leaves voice, cleanup happens even when the host request fails.
    async fn disconnect(&mut self, force: bool) -> PlayerResult<()>;

    async fn move_to(&mut self, channel: ChannelId) -> PlayerResult<()>;

    /// Raw voice server update, one of the two handshake halves.
    async fn on_voice_server_update(&mut self, event: Value) -> PlayerResult<()>;

    /// Voice state update of the bot user, the other handshake half.
    async fn on_voice_state_update(&mut self, update: VoiceStateUpdate) -> PlayerResult<()>;
}
