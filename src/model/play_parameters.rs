use super::track::{Playable, Track};
use crate::error::PlayerResult;
use crate::player::Player;
use std::time::Duration;

/// Builder returned by [`Player::play`].
pub struct PlayParameters<'a, S> {
    player: &'a mut Player,
    source: S,
    pub replace: bool,
    pub start: u64,
    pub finish: u64,
}

impl<'a, S: Playable> PlayParameters<'a, S> {
    pub(crate) fn new(player: &'a mut Player, source: S) -> Self {
        Self {
            player,
            source,
            replace: true,
            start: 0,
            finish: 0
        }
    }

    /// Starts playing the track.
    ///
    /// Returns `None` without doing anything when replacing is disabled and something is already playing.
    pub async fn start(self) -> PlayerResult<Option<Track>> {
        self.player.start_playing(self.source, self.replace, self.start, self.finish).await
    }

    /// Sets if the current playing track should be replaced with this new one.
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Sets the time the track will start at.
    pub fn start_time(mut self, start: Duration) -> Self {
        self.start = start.as_millis() as u64;
        self
    }

    /// Sets the time the track will finish at, zero lets the track play to its end.
    pub fn finish_time(mut self, finish: Duration) -> Self {
        self.finish = finish.as_millis() as u64;
        self
    }
}
