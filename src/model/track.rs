use async_trait::async_trait;
use serde::{
    Serialize,
    Deserialize
};
use std::sync::Arc;
use crate::error::{PlayerError, PlayerResult};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Track {
    pub track: String,
    pub info: Option<TrackInfo>
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    pub length: u64,
    pub is_stream: bool,
    pub position: u64,
    pub title: String,
    pub uri: String
}

impl Track {
    pub fn new(track: impl ToString) -> Self {
        Self {
            track: track.to_string(),
            info: None
        }
    }

    /// Length of the track in seconds, unbounded when the node sent no info.
    pub fn duration(&self) -> f64 {
        self.info.as_ref()
            .map(|info| info.length as f64 / 1000.0)
            .unwrap_or(f64::INFINITY)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.info {
            Some(info) => write!(f, "{} - {}", info.author, info.title),
            None => write!(f, "{}", self.track)
        }
    }
}

#[derive(Debug, Clone)]
pub enum TrackSearch {
    Youtube(String),
    Url(String)
}

impl std::fmt::Display for TrackSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Youtube(query) => write!(f, "ytsearch:{}", query),
            Self::Url(url) => write!(f, "{}", url)
        }
    }
}

/// Something able to turn a search into a playable track, usually the node's `loadtracks` route.
#[async_trait]
pub trait TrackLoader: Send + Sync {
    async fn load(&self, search: &TrackSearch) -> PlayerResult<Option<Track>>;
}

/// Anything the player can be told to play.
#[async_trait]
pub trait Playable: Send {
    async fn resolve(self) -> PlayerResult<Track>;
}

#[async_trait]
impl Playable for Track {
    async fn resolve(self) -> PlayerResult<Track> {
        Ok(self)
    }
}

/// A track that is only searched when it's about to be played.
#[derive(Clone)]
pub struct PartialTrack {
    pub search: TrackSearch,
    loader: Arc<dyn TrackLoader>
}

impl PartialTrack {
    pub fn new(search: TrackSearch, loader: Arc<dyn TrackLoader>) -> Self {
        Self {
            search,
            loader
        }
    }
}

impl std::fmt::Debug for PartialTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialTrack").field("search", &self.search).finish()
    }
}

#[async_trait]
impl Playable for PartialTrack {
    async fn resolve(self) -> PlayerResult<Track> {
        self.loader.load(&self.search)
            .await?
            .ok_or_else(|| PlayerError::TrackResolution(self.search.to_string()))
    }
}
