pub mod events;
pub mod filters;
pub mod track;
pub mod gateway;
pub mod play_parameters;
pub mod player;
pub mod half_update;

use events::*;
use filters::Filters;
use crate::node::ControlSocket;
use serenity::model::id::GuildId as DiscordGuildId;
use serde_json::{
    json,
    Value
};
use crate::error::PlayerResult;

/// Recursively merges `b` into `a`, objects are merged key by key and anything else is replaced.
pub fn merge(a: &mut Value, b: Value) {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            for (k, v) in b {
                merge(a.entry(k).or_insert(Value::Null), v);
            }
        }

        (a, b) => *a = b,
    }
}


#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Codes {
    //Destroy the player on the node
    Destroy,
    //Apply a set of filters at once
    Filters(Filters),
    //Pause the player
    Pause(Pause),
    //Play a track
    Play(Play),
    //Seek to a given position
    Seek(Seek),
    //Stop a player
    Stop,
    //Player connects to a given channel
    VoiceUpdate(VoiceUpdate),
    //Change the player's volume
    Volume(Volume)
}

impl Codes {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Destroy => "destroy",
            Self::Filters(_) => "filters",
            Self::Pause(_) => "pause",
            Self::Play(_) => "play",
            Self::Seek(_) => "seek",
            Self::Stop => "stop",
            Self::VoiceUpdate(_) => "voiceUpdate",
            Self::Volume(_) => "volume",
        }
    }

    /// Builds the flat `{op, guildId, ...}` message the node expects.
    pub fn payload(&self, guild_id: impl Into<DiscordGuildId>) -> PlayerResult<Value> {
        let mut x = json!({
            "op" : self.op(),
            "guildId" : guild_id.into().get().to_string(),
        });

        let data = match self {
            Self::Destroy | Self::Stop => return Ok(x),
            Self::Filters(data) => serde_json::to_value(data)?,
            Self::Pause(data) => serde_json::to_value(data)?,
            Self::Play(data) => serde_json::to_value(data)?,
            Self::Seek(data) => serde_json::to_value(data)?,
            Self::VoiceUpdate(data) => serde_json::to_value(data)?,
            Self::Volume(data) => serde_json::to_value(data)?,
        };

        merge(&mut x, data);

        Ok(x)
    }

    pub async fn send(&self, guild_id: impl Into<DiscordGuildId>, socket: &mut dyn ControlSocket) -> PlayerResult<()> {
        let payload = self.payload(guild_id)?;

        socket.send(payload).await
    }
}
