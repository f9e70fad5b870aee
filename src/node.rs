use async_trait::async_trait;
use serenity::model::id::GuildId as DiscordGuildId;
use crate::{
    builder::NodeBuilder,
    error::PlayerResult,
    error::PlayerError,
    events::{process, EventHandler, EventType},
    model::{gateway::Stats, Codes},
    types::{WebSocketConnection, WebSocketReader},
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use dashmap::DashSet;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

/// Write half of the control connection to the node.
#[async_trait]
pub trait ControlSocket: Send {
    async fn send(&mut self, payload: Value) -> PlayerResult<()>;
}

#[async_trait]
impl ControlSocket for WebSocketConnection {
    async fn send(&mut self, payload: Value) -> PlayerResult<()> {
        let payload = serde_json::to_string(&payload)?;

        if let Err(why) = SinkExt::send(self, TungsteniteMessage::text(payload)).await {
            return Err(PlayerError::ErrorSendingPayload(why));
        }

        Ok(())
    }
}

/// A connection to one audio node, shared by every player it serves.
pub struct Node {
    pub node_id: u8,
    socket: Mutex<Option<Box<dyn ControlSocket>>>,
    /// Guilds with a live player on this node.
    pub players: DashSet<DiscordGuildId>,
    stats: RwLock<Option<Stats>>,
}

impl Node {
    /// A node without a socket, sends fail with [`PlayerError::NoWebsocket`] until one is set.
    pub fn new(node_id: u8) -> Arc<Self> {
        Arc::new(Self {
            node_id,
            socket: Mutex::new(None),
            players: DashSet::new(),
            stats: RwLock::new(None),
        })
    }

    /// A node writing to the given socket, for transports not managed by this crate.
    pub fn with_socket(node_id: u8, socket: impl ControlSocket + 'static) -> Arc<Self> {
        Arc::new(Self {
            node_id,
            socket: Mutex::new(Some(Box::new(socket))),
            players: DashSet::new(),
            stats: RwLock::new(None),
        })
    }

    pub async fn set_socket(&self, socket: Option<Box<dyn ControlSocket>>) {
        *self.socket.lock().await = socket;
    }

    pub async fn is_connected(&self) -> bool {
        self.socket.lock().await.is_some()
    }

    /// Last statistics reported by the node.
    pub async fn stats(&self) -> Option<Stats> {
        self.stats.read().await.clone()
    }

    /// Sends a control message for the given guild.
    pub async fn send(&self, guild_id: impl Into<DiscordGuildId>, code: Codes) -> PlayerResult<()> {
        let mut socket = self.socket.lock().await;

        match socket.as_mut() {
            Some(socket) => code.send(guild_id, &mut **socket).await,
            None => Err(PlayerError::NoWebsocket),
        }
    }

    pub fn register(&self, guild_id: DiscordGuildId) {
        self.players.insert(guild_id);
    }

    pub fn deregister(&self, guild_id: DiscordGuildId) -> bool {
        self.players.remove(&guild_id).is_some()
    }

    /// Creates the node and spawns the task keeping its websocket alive.
    pub fn connect(builder: NodeBuilder, handler: Arc<dyn EventHandler>) -> PlayerResult<Arc<Self>> {
        builder.ws_request()?;

        let node = Self::new(builder.node_id);

        Self::run(Arc::clone(&node), builder, handler);

        Ok(node)
    }

    fn run(node: Arc<Self>, builder: NodeBuilder, handler: Arc<dyn EventHandler>) {
        tokio::spawn(async move {
            let node_id = node.node_id;
            let max_reconnect_attempts = builder.reconnect_attempts;
            let mut actual_reconnection_attempt = 1u8;

            while actual_reconnection_attempt <= max_reconnect_attempts {
                info!("Node id {} trying to connect to server, attempt {}", node_id, actual_reconnection_attempt);

                let request = match builder.ws_request() {
                    Ok(request) => request,
                    Err(why) => {
                        warn!("Node id {} can't build its connection request: {}", node_id, why);
                        break;
                    }
                };

                match tokio_tungstenite::connect_async(request).await {
                    Err(why) => {
                        actual_reconnection_attempt += 1;

                        warn!("Node id {} failed to connect to server (attempt {}/{}): {}, waiting 5s before reconnecting", node_id, actual_reconnection_attempt - 1, max_reconnect_attempts, why);
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    },
                    Ok((stream, _)) => {
                        let (write, read) = stream.split();

                        info!("Node id {} connected successfully to server", node_id);

                        actual_reconnection_attempt = 1;

                        node.set_socket(Some(Box::new(write))).await;

                        Self::read_loop(&node, &handler, read).await;

                        info!("Node id {} lost its connection, players can't send until it reconnects", node_id);

                        node.set_socket(None).await;
                    }
                }
            }

            info!("Node id {} reached max connection attempts, giving up", node_id);
        });
    }

    async fn read_loop(node: &Arc<Self>, handler: &Arc<dyn EventHandler>, mut read: WebSocketReader) {
        while let Some(Ok(msg)) = read.next().await {
            match msg {
                TungsteniteMessage::Text(t) => {
                    match EventType::parse(&t) {
                        Some(EventType::Stats(stats)) => {
                            // Set last stats
                            *node.stats.write().await = Some(stats.clone());

                            process(Arc::clone(node), Arc::clone(handler), EventType::Stats(stats));
                        },
                        Some(event) => process(Arc::clone(node), Arc::clone(handler), event),
                        None => debug!("Node id {} ignored payload: {}", node.node_id, t),
                    }
                },
                TungsteniteMessage::Close(_) => break,
                _ => ()
            }
        }
    }
}
