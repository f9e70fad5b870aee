use serde_json::Value;
use tracing::debug;
use crate::model::events::VoiceUpdate;

/// One of the two pieces the node needs before it can join a voice channel.
#[derive(Debug, Clone, PartialEq)]
pub enum HalfVoiceUpdate {
    /// Raw voice server update event sent by the host gateway.
    Server(Value),
    /// Session id of the bot's voice state.
    State(String),
}

/// Collects both voice halves, which arrive in any order.
///
/// Halves stay stored once the update is built, so a new voice server event alone is enough to
/// build a fresh update with the known session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceHandshake {
    session_id: Option<String>,
    event: Option<Value>,
}

impl VoiceHandshake {
    /// Stores the half, overwriting the previous value of the same kind.
    pub fn store(&mut self, half: HalfVoiceUpdate) {
        match half {
            HalfVoiceUpdate::Server(event) => self.event = Some(event),
            HalfVoiceUpdate::State(session_id) => self.session_id = Some(session_id),
        }
    }

    /// Stores the half and returns the update to send if the other half is already here.
    pub fn merge(&mut self, half: HalfVoiceUpdate) -> Option<VoiceUpdate> {
        self.store(half);

        self.ready()
    }

    pub fn ready(&self) -> Option<VoiceUpdate> {
        match (&self.session_id, &self.event) {
            (Some(session_id), Some(event)) => Some(VoiceUpdate {
                session_id: session_id.clone(),
                event: event.clone(),
            }),
            _ => {
                debug!("waiting for the other voice half, session: {}, event: {}", self.session_id.is_some(), self.event.is_some());

                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.session_id = None;
        self.event = None;
    }

    pub fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.event.is_none()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn event(&self) -> Option<&Value> {
        self.event.as_ref()
    }
}
