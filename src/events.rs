use async_trait::async_trait;

use crate::{
    node::Node,
    model::gateway::*,
};
use std::sync::Arc;

/// Callbacks for what the node reports, every method defaults to doing nothing.
///
/// `player_update` is where the host forwards the state to the guild's
/// [`Player::handle_player_update`](crate::player::Player::handle_player_update).
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Periodic event that returns the statistics of the server.
    async fn stats(&self, _node: Arc<Node>, _event: Stats) {}
    /// Event that triggers when a player updates.
    async fn player_update(&self, _node: Arc<Node>, _event: PlayerUpdate) {}
    /// Event that triggers when a track starts playing.
    async fn track_start(&self, _node: Arc<Node>, _event: TrackStart) {}
    /// Event that triggers when a track finishes playing.
    async fn track_finish(&self, _node: Arc<Node>, _event: TrackFinish) {}
    ///Event triggered when an audio web socket is disconnected from discord
    async fn socket_closed(&self, _node: Arc<Node>, _event: WebSocketClosed) {}
}

pub(crate) fn process(node: Arc<Node>, handler: Arc<dyn EventHandler>, event_type: EventType) {
    match event_type {
        EventType::Stats(e) => {
            tokio::spawn(async move {
                handler.stats(node, e).await;
            });
        },
        EventType::PlayerUpdate(e) => {
            tokio::spawn(async move {
                handler.player_update(node, e).await;
            });
        },
        EventType::TrackStart(e) => {
            tokio::spawn(async move {
                handler.track_start(node, e).await;
            });
        },
        EventType::TrackFinish(e) => {
            tokio::spawn(async move {
                handler.track_finish(node, e).await;
            });
        },
        EventType::WebSocketClosed(e) => {
            tokio::spawn(async move {
                handler.socket_closed(node, e).await;
            });
        }
    }
}

pub(crate) enum EventType {
    Stats(Stats),
    PlayerUpdate(PlayerUpdate),
    TrackStart(TrackStart),
    TrackFinish(TrackFinish),
    WebSocketClosed(WebSocketClosed)
}

impl EventType {
    /// Parses a text frame coming from the node, unknown or broken frames give `None`.
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let payload = serde_json::from_str::<GatewayEvent>(text).ok()?;

        match payload.op.as_str() {
            "stats" => serde_json::from_str(text).ok().map(EventType::Stats),
            "playerUpdate" => serde_json::from_str(text).ok().map(EventType::PlayerUpdate),
            "event" => match payload.event_type.as_deref()? {
                "TrackStartEvent" => serde_json::from_str(text).ok().map(EventType::TrackStart),
                "TrackEndEvent" => serde_json::from_str(text).ok().map(EventType::TrackFinish),
                "WebSocketClosedEvent" => serde_json::from_str(text).ok().map(EventType::WebSocketClosed),
                _ => None,
            },
            _ => None
        }
    }
}
