pub mod types;
pub mod error;
pub mod node;
pub mod model;
pub mod events;
pub mod builder;
pub mod voice;
pub mod player;

pub use error::{PlayerError, PlayerResult};
pub use node::{ControlSocket, Node};
pub use player::Player;
pub use voice::{VoiceGateway, VoiceSession};
