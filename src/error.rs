use std::{
    error::Error,
    fmt::{
        Display,
        Formatter,
        Result,
    },
};
use tokio_tungstenite::tungstenite::error::Error as TungsteniteError;
use crate::model::filters::FilterKind;

pub type PlayerResult<T> = ::std::result::Result<T, PlayerError>;

/// Error returned by the host when a voice state change can't be requested.
pub type GatewayError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
pub enum PlayerError {
    NoWebsocket,
    MissingUserId,
    MalformedFilter {
        filter: FilterKind,
        reason: String,
    },
    TrackResolution(String),
    Gateway(GatewayError),
    Serialize(serde_json::Error),
    ErrorSendingPayload(TungsteniteError),
}

impl PlayerError {
    pub(crate) fn malformed(filter: FilterKind, reason: impl ToString) -> Self {
        Self::MalformedFilter {
            filter,
            reason: reason.to_string(),
        }
    }
}

impl Error for PlayerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PlayerError::Gateway(why) => Some(why.as_ref()),
            PlayerError::Serialize(why) => Some(why),
            PlayerError::ErrorSendingPayload(why) => Some(why),
            _ => None,
        }
    }
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            PlayerError::NoWebsocket => write!(f, "There is no initialized websocket."),
            PlayerError::MissingUserId => write!(f, "No `user id` was set on the node builder."),
            PlayerError::MalformedFilter { filter, reason } => write!(f, "Malformed `{}` filter payload: {}", filter, reason),
            PlayerError::TrackResolution(query) => write!(f, "Unable to resolve a track for `{}`", query),
            PlayerError::Gateway(why) => write!(f, "Voice gateway request failed: {}", why),
            PlayerError::Serialize(why) => write!(f, "Error while serializing payload: {}", why),
            PlayerError::ErrorSendingPayload(why) => write!(f, "Error while sending payload, json => {:?}", why),
        }
    }
}

impl From<TungsteniteError> for PlayerError {
    fn from(e: TungsteniteError) -> PlayerError {
        Self::ErrorSendingPayload(e)
    }
}

impl From<serde_json::Error> for PlayerError {
    fn from(e: serde_json::Error) -> PlayerError {
        Self::Serialize(e)
    }
}
