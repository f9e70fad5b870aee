use serde::{Serialize, Deserialize};
use serde_aux::prelude::*;
use serenity::model::id::ChannelId;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GatewayEvent {
    pub op: String,
    #[serde(rename = "type")]
    pub event_type: Option<String>
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cpu {
    pub cores: i64,
    #[serde(rename = "systemLoad")]
    pub system_load: f64,
    #[serde(rename = "lavalinkLoad")]
    pub lavalink_load: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FrameStats {
    pub sent: i64,
    pub deficit: i64,
    pub nulled: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Memory {
    pub reservable: i64,
    pub used: i64,
    pub free: i64,
    pub allocated: i64,
}

/// Snapshot of the player as the node saw it, both values in milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct State {
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Stats {
    #[serde(rename = "playingPlayers")]
    pub playing_players: i64,
    pub op: String,
    pub memory: Memory,
    #[serde(rename = "frameStats")]
    pub frame_stats: Option<FrameStats>,
    pub players: i64,
    pub cpu: Cpu,
    pub uptime: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerUpdate {
    #[serde(default)]
    pub op: String,
    pub state: State,
    #[serde(rename = "guildId")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrackStart {
    pub op: String,
    #[serde(rename = "type")]
    pub track_start_type: String,
    pub track: String,
    #[serde(rename = "guildId")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrackFinish {
    pub op: String,
    pub reason: String,
    #[serde(rename = "type")]
    pub track_finish_type: String,
    pub track: String,
    #[serde(rename = "guildId")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub guild_id: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WebSocketClosed {
    pub op: String,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    #[serde(rename = "guildId")]
    pub guild_id: Option<String>,
    pub code: u16,
    pub reason: String,
    #[serde(rename = "byRemote")]
    pub by_remote: bool
}

/// The host's voice state update for the bot user, only the fields the handshake needs.
///
/// An empty or missing `channel_id` means the bot left the voice channel.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VoiceStateUpdate {
    pub session_id: String,
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_option_number_from_string")]
    pub channel_id: Option<u64>,
}

impl VoiceStateUpdate {
    pub fn channel(&self) -> Option<ChannelId> {
        self.channel_id.filter(|id| *id != 0).map(ChannelId::new)
    }
}
