use std::sync::Arc;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest,
    error::Error as TungsteniteError,
    handshake::client::Request,
    http::HeaderValue,
};
use crate::{
    error::{PlayerError, PlayerResult},
    events::EventHandler,
    node::Node
};

#[derive(Clone, Debug)]
pub struct NodeBuilder {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) ssl: bool,
    pub(crate) pass: String,
    pub(crate) shards: u64,
    pub(crate) id: Option<u64>,
    pub(crate) node_id: u8,
    pub(crate) reconnect_attempts: u8
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2333,
            ssl: false,
            pass: "youshallnotpass".to_string(),
            shards: 1,
            id: None,
            node_id: 1,
            reconnect_attempts: 5
        }
    }
}

impl NodeBuilder {
    pub fn set_host(&mut self, host: impl ToString) -> &mut Self {
        self.host = host.to_string();
        self
    }

    pub fn set_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    pub fn set_password(&mut self, password: impl ToString) -> &mut Self {
        self.pass = password.to_string();
        self
    }

    pub fn set_shards(&mut self, shards: u64) -> &mut Self {
        self.shards = shards;
        self
    }

    pub fn set_user_id(&mut self, id: impl Into<u64>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    pub fn set_ssl(&mut self, ssl: bool) -> &mut Self {
        self.ssl = ssl;
        self
    }

    pub fn set_node_id(&mut self, node_id: u8) -> &mut Self {
        self.node_id = node_id;
        self
    }

    pub fn set_reconnect_attempts(&mut self, attempts: u8) -> &mut Self {
        self.reconnect_attempts = attempts;
        self
    }

    pub fn socket_url(&self) -> String {
        if self.ssl { format!("wss://{}:{}", self.host, self.port) } else { format!("ws://{}:{}", self.host, self.port) }
    }

    pub(crate) fn ws_request(&self) -> PlayerResult<Request> {
        let id = self.id.ok_or(PlayerError::MissingUserId)?;

        let mut request = self.socket_url().as_str().into_client_request()?;

        let headers = request.headers_mut();
        headers.insert("Authorization", header(&self.pass)?);
        headers.insert("Num-Shards", header(&self.shards.to_string())?);
        headers.insert("User-Id", header(&id.to_string())?);

        Ok(request)
    }

    /// Spawns the node connection loop.
    pub fn build(self, handler: Arc<dyn EventHandler>) -> PlayerResult<Arc<Node>> {
        Node::connect(self, handler)
    }
}

fn header(value: &str) -> PlayerResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|why| PlayerError::ErrorSendingPayload(TungsteniteError::HttpFormat(why.into())))
}
