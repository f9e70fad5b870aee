use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use serenity::model::id::{ChannelId, GuildId};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use crate::{
    error::{PlayerError, PlayerResult},
    model::{
        Codes,
        events::{Pause, Play, Seek, Volume},
        filters::{FilterInput, FilterOptions},
        gateway::{PlayerUpdate, State, VoiceStateUpdate},
        half_update::{HalfVoiceUpdate, VoiceHandshake},
        play_parameters::PlayParameters,
        player::PlaybackState,
        track::{Playable, Track},
    },
    node::Node,
    voice::{VoiceGateway, VoiceSession},
};

pub const MAX_VOLUME: u16 = 1000;

/// Audio player bound to the voice channel of one guild.
///
/// Commands are sent to the node without waiting for it to act on them, `paused` and `volume` mirror
/// what was last sent.
pub struct Player {
    node: Arc<Node>,
    gateway: Arc<dyn VoiceGateway>,
    guild_id: GuildId,
    channel: ChannelId,
    connected: bool,
    paused: bool,
    volume: u16,
    current: Option<Track>,
    handshake: VoiceHandshake,
    state: PlaybackState,
}

impl Player {
    /// Creates the player and registers it on the node.
    pub fn new(gateway: Arc<dyn VoiceGateway>, node: Arc<Node>, guild_id: GuildId, channel: ChannelId) -> Self {
        node.register(guild_id);

        Self {
            node,
            gateway,
            guild_id,
            channel,
            connected: false,
            paused: false,
            volume: 100,
            current: None,
            handshake: VoiceHandshake::default(),
            state: PlaybackState::default(),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn volume(&self) -> u16 {
        self.volume
    }

    /// The track currently playing.
    pub fn track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn handshake(&self) -> &VoiceHandshake {
        &self.handshake
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_playing(&self) -> bool {
        self.connected && self.current.is_some()
    }

    /// Last pause value sent to the node.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Position of the current track in seconds, 0 when nothing is playing.
    pub fn position(&self) -> f64 {
        self.position_at(Utc::now())
    }

    pub fn position_at(&self, now: DateTime<Utc>) -> f64 {
        match &self.current {
            Some(track) if self.connected => self.state.position_at(now, self.paused, track.duration()),
            _ => 0.0,
        }
    }

    pub fn update_state(&mut self, state: &State) {
        self.state.update(state);
    }

    /// Applies a `playerUpdate` the node sent for this guild.
    pub fn handle_player_update(&mut self, update: &PlayerUpdate) {
        if update.guild_id != self.guild_id.get() {
            debug!("Ignoring player update for guild {} on player of guild {}", update.guild_id, self.guild_id);
            return;
        }

        self.update_state(&update.state);
    }

    /// Constructor for playing a track, replacing the current one by default.
    pub fn play<S: Playable>(&mut self, source: S) -> PlayParameters<'_, S> {
        PlayParameters::new(self, source)
    }

    pub(crate) async fn start_playing<S: Playable>(&mut self, source: S, replace: bool, start: u64, end: u64) -> PlayerResult<Option<Track>> {
        if !replace && self.is_playing() {
            return Ok(None);
        }

        self.update_state(&State::default());
        self.paused = false;

        let track = source.resolve().await?;
        self.current = Some(track.clone());

        let payload = Play {
            track: track.track.clone(),
            no_replace: !replace,
            start_time: start,
            end_time: if end > 0 { Some(end) } else { None },
        };

        self.node.send(self.guild_id, Codes::Play(payload)).await?;

        debug!("Started playing track:: {} ({})", track, self.channel);

        Ok(Some(track))
    }

    /// Stops the current track.
    pub async fn stop(&mut self) -> PlayerResult<()> {
        self.node.send(self.guild_id, Codes::Stop).await?;

        if let Some(track) = self.current.take() {
            debug!("Current track stopped:: {} ({})", track, self.channel);
        }

        Ok(())
    }

    /// Sets the pause status, stored without waiting for the node to confirm it.
    pub async fn set_pause(&mut self, pause: bool) -> PlayerResult<()> {
        self.node.send(self.guild_id, Codes::Pause(Pause { pause })).await?;

        self.paused = pause;
        info!("Set pause:: {} ({})", pause, self.channel);

        Ok(())
    }

    /// Sets pause status to `true`
    pub async fn pause(&mut self) -> PlayerResult<()> {
        self.set_pause(true).await
    }

    /// Sets pause status to `false`
    pub async fn resume(&mut self) -> PlayerResult<()> {
        self.set_pause(false).await
    }

    /// Jumps to a specific time in the currently playing track.
    ///
    /// The position read locally catches up on the next state update from the node.
    pub async fn seek(&mut self, position: Duration) -> PlayerResult<()> {
        let payload = Seek {
            position: position.as_millis() as u64,
        };

        self.node.send(self.guild_id, Codes::Seek(payload)).await
    }

    /// Sets the volume of the player, clamped between 0 and 1000.
    pub async fn set_volume(&mut self, volume: i64) -> PlayerResult<()> {
        self.volume = volume.clamp(0, MAX_VOLUME as i64) as u16;

        self.node.send(self.guild_id, Codes::Volume(Volume { volume: self.volume })).await?;

        debug!("Set volume:: {} ({})", self.volume, self.channel);

        Ok(())
    }

    /// Validates every bundle and sends them in a single `filters` message.
    ///
    /// Nothing is sent when any bundle is malformed.
    pub async fn set_filters(&mut self, options: FilterOptions) -> PlayerResult<()> {
        let filters = options.build()?;

        self.node.send(self.guild_id, Codes::Filters(filters)).await
    }

    /// Sets the equalizer, from `(band, gain)` pairs or bands.
    ///
    /// There are 15 bands (0-14), gains range from -0.25 to 1.0.
    pub async fn set_equalizer(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().equalizer(input)).await
    }

    pub async fn set_karaoke(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().karaoke(input)).await
    }

    pub async fn set_timescale(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().timescale(input)).await
    }

    pub async fn set_tremolo(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().tremolo(input)).await
    }

    pub async fn set_vibrato(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().vibrato(input)).await
    }

    /// Accepts the rotation frequency in Hz directly.
    pub async fn set_rotation(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().rotation(input)).await
    }

    pub async fn set_distortion(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().distortion(input)).await
    }

    pub async fn set_channel_mix(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().channel_mix(input)).await
    }

    /// Accepts the smoothing value directly.
    pub async fn set_low_pass(&mut self, input: impl Into<FilterInput>) -> PlayerResult<()> {
        self.set_filters(FilterOptions::new().low_pass(input)).await
    }

    /// Tells the node to drop its player for this guild.
    pub async fn destroy(&mut self) -> PlayerResult<()> {
        self.node.send(self.guild_id, Codes::Destroy).await?;
        self.current = None;

        Ok(())
    }

    async fn dispatch_voice_update(&mut self, half: HalfVoiceUpdate) -> PlayerResult<()> {
        if let Some(update) = self.handshake.merge(half) {
            debug!("Dispatching voice update:: {}", self.channel);

            self.node.send(self.guild_id, Codes::VoiceUpdate(update)).await?;
        }

        Ok(())
    }

    fn cleanup(&mut self) {
        self.connected = false;
        self.paused = false;
        self.current = None;
        self.handshake.clear();
        self.state = PlaybackState::default();
    }
}

/// Deregisters the player and resets its state when dropped, so a cancelled disconnect still
/// leaves the player clean.
struct DisconnectGuard<'a> {
    player: &'a mut Player,
}

impl Drop for DisconnectGuard<'_> {
    fn drop(&mut self) {
        self.player.node.deregister(self.player.guild_id);
        self.player.cleanup();

        debug!("Player cleaned up:: {}", self.player.guild_id);
    }
}

#[async_trait]
impl VoiceSession for Player {
    async fn connect(&mut self, timeout: Duration) -> PlayerResult<()> {
        let request = self.gateway.change_voice_state(self.guild_id, Some(self.channel));

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result.map_err(PlayerError::Gateway)?,
            Err(elapsed) => return Err(PlayerError::Gateway(Box::new(elapsed))),
        }

        self.connected = true;
        info!("Connected to voice channel:: {}", self.channel);

        Ok(())
    }

    async fn disconnect(&mut self, force: bool) -> PlayerResult<()> {
        info!("Disconnecting from voice channel:: {} (force: {})", self.channel, force);

        let gateway = self.gateway.clone();
        let guild_id = self.guild_id;
        let _guard = DisconnectGuard { player: self };

        gateway.change_voice_state(guild_id, None)
            .await
            .map_err(PlayerError::Gateway)
    }

    async fn move_to(&mut self, channel: ChannelId) -> PlayerResult<()> {
        self.gateway.change_voice_state(self.guild_id, Some(channel))
            .await
            .map_err(PlayerError::Gateway)?;

        info!("Moving to voice channel:: {}", channel);

        Ok(())
    }

    async fn on_voice_server_update(&mut self, event: Value) -> PlayerResult<()> {
        self.dispatch_voice_update(HalfVoiceUpdate::Server(event)).await
    }

    async fn on_voice_state_update(&mut self, update: VoiceStateUpdate) -> PlayerResult<()> {
        let channel = match update.channel() {
            Some(channel) => channel,
            None => {
                // We're disconnecting
                self.handshake.clear();
                return Ok(());
            }
        };

        self.channel = channel;

        self.dispatch_voice_update(HalfVoiceUpdate::State(update.session_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::GatewayError,
        model::{filters::FilterKind, track::{PartialTrack, TrackInfo, TrackLoader, TrackSearch}},
        node::tests::RecordingSocket,
    };
    use serde_json::json;
    use std::sync::Mutex;

    const GUILD: u64 = 41771983423143937;
    const CHANNEL: u64 = 381870553235193857;

    #[derive(Default)]
    struct ScriptedGateway {
        fail: bool,
        hang: bool,
        requests: Mutex<Vec<Option<ChannelId>>>,
    }

    #[async_trait]
    impl VoiceGateway for ScriptedGateway {
        async fn change_voice_state(&self, _guild_id: GuildId, channel_id: Option<ChannelId>) -> Result<(), GatewayError> {
            self.requests.lock().unwrap().push(channel_id);

            if self.hang {
                futures::future::pending::<()>().await;
            }

            if self.fail {
                return Err("gateway is closed".into());
            }

            Ok(())
        }
    }

    struct Fixture {
        player: Player,
        socket: RecordingSocket,
        gateway: Arc<ScriptedGateway>,
    }

    fn fixture_with(gateway: ScriptedGateway) -> Fixture {
        let socket = RecordingSocket::default();
        let node = Node::with_socket(1, socket.clone());
        let gateway = Arc::new(gateway);
        let player = Player::new(gateway.clone(), node, GuildId::new(GUILD), ChannelId::new(CHANNEL));

        Fixture { player, socket, gateway }
    }

    fn fixture() -> Fixture {
        fixture_with(ScriptedGateway::default())
    }

    async fn connected() -> Fixture {
        let mut fixture = fixture();
        fixture.player.connect(Duration::from_secs(1)).await.unwrap();
        fixture
    }

    fn track(id: &str, length: u64) -> Track {
        Track {
            track: id.to_string(),
            info: Some(TrackInfo { length, title: id.to_string(), ..Default::default() }),
        }
    }

    fn ops(socket: &RecordingSocket) -> Vec<String> {
        socket.sent().iter().map(|payload| payload["op"].as_str().unwrap_or_default().to_string()).collect()
    }

    #[tokio::test]
    async fn volume_is_always_clamped() {
        let mut fixture = fixture();

        for (input, expected) in [(-50i64, 0u16), (0, 0), (100, 100), (1000, 1000), (1001, 1000), (i64::MAX, 1000), (i64::MIN, 0)] {
            fixture.player.set_volume(input).await.unwrap();

            assert_eq!(fixture.player.volume(), expected);
            assert_eq!(fixture.socket.sent().last().unwrap()["volume"], json!(expected));
        }
    }

    #[tokio::test]
    async fn paused_position_follows_last_update() {
        let mut fixture = connected().await;

        fixture.player.play(track("a", 100_000)).start().await.unwrap();
        fixture.player.pause().await.unwrap();

        for (time, position, expected) in [(1_600_000_000_000i64, 12_345u64, 12.3), (1_600_000_005_000, 99_960, 100.0), (1_600_000_009_000, 150_000, 100.0), (1_600_000_010_000, 0, 0.0)] {
            fixture.player.update_state(&State { time, position });

            assert_eq!(fixture.player.position(), expected);
        }
    }

    #[tokio::test]
    async fn position_is_zero_when_idle() {
        let mut fixture = fixture();

        fixture.player.update_state(&State { time: 1_600_000_000_000, position: 30_000 });

        assert_eq!(fixture.player.position(), 0.0);
    }

    #[tokio::test]
    async fn playing_position_extrapolates() {
        let mut fixture = connected().await;

        fixture.player.play(track("a", 100_000)).start().await.unwrap();
        fixture.player.handle_player_update(&PlayerUpdate {
            op: "playerUpdate".to_string(),
            state: State { time: 1_600_000_000_000, position: 10_000 },
            guild_id: GUILD,
        });

        let now = fixture.player.state().last_update + chrono::Duration::milliseconds(4_000);

        assert_eq!(fixture.player.position_at(now), 14.0);
    }

    #[tokio::test]
    async fn voice_update_needs_both_halves() {
        let mut fixture = fixture();

        fixture.player.on_voice_server_update(json!({ "token": "abc", "endpoint": "us-east1.discord.media" })).await.unwrap();
        assert!(fixture.socket.sent().is_empty());

        fixture.player.on_voice_state_update(VoiceStateUpdate { session_id: "session".to_string(), channel_id: Some(CHANNEL) }).await.unwrap();

        assert_eq!(
            fixture.socket.sent(),
            vec![json!({
                "op": "voiceUpdate",
                "guildId": GUILD.to_string(),
                "sessionId": "session",
                "event": { "token": "abc", "endpoint": "us-east1.discord.media" }
            })]
        );
    }

    #[tokio::test]
    async fn voice_state_update_moves_the_channel() {
        let mut fixture = fixture();

        fixture.player.on_voice_state_update(VoiceStateUpdate { session_id: "session".to_string(), channel_id: Some(42) }).await.unwrap();

        assert_eq!(fixture.player.channel(), ChannelId::new(42));
        assert!(fixture.socket.sent().is_empty());
    }

    #[tokio::test]
    async fn leaving_voice_clears_the_handshake() {
        let mut fixture = fixture();

        fixture.player.on_voice_state_update(VoiceStateUpdate { session_id: "session".to_string(), channel_id: Some(CHANNEL) }).await.unwrap();
        fixture.player.on_voice_state_update(VoiceStateUpdate { session_id: "session".to_string(), channel_id: None }).await.unwrap();

        assert!(fixture.player.handshake().is_empty());

        fixture.player.on_voice_server_update(json!({ "token": "abc" })).await.unwrap();

        assert!(fixture.socket.sent().is_empty());
    }

    #[tokio::test]
    async fn equalizer_pairs_reach_the_node() {
        let mut fixture = fixture();

        fixture.player.set_filters(FilterOptions::new().equalizer(vec![(0u8, -0.25), (1u8, 0.1)])).await.unwrap();

        assert_eq!(
            fixture.socket.sent(),
            vec![json!({
                "op": "filters",
                "guildId": GUILD.to_string(),
                "equalizer": [{ "band": 0, "gain": -0.25 }, { "band": 1, "gain": 0.1 }]
            })]
        );
    }

    #[tokio::test]
    async fn malformed_karaoke_sends_nothing() {
        let mut fixture = fixture();

        let result = fixture.player
            .set_karaoke(json!({ "karaoke": { "level": 1, "monoLevel": 1.0, "filterBand": 220.0, "filterWidth": 100.0 } }))
            .await;

        assert!(matches!(result, Err(PlayerError::MalformedFilter { filter: FilterKind::Karaoke, .. })));
        assert!(fixture.socket.sent().is_empty());
    }

    #[tokio::test]
    async fn filters_are_merged_into_one_message() {
        let mut fixture = fixture();

        let options = FilterOptions::new()
            .rotation(0.2)
            .low_pass(20.0)
            .timescale(json!({ "timescale": { "speed": 1.2, "pitch": 1.0, "rate": 1.0 } }));

        fixture.player.set_filters(options).await.unwrap();

        let sent = fixture.socket.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["rotation"], json!({ "rotationHz": 0.2 }));
        assert_eq!(sent[0]["lowPass"], json!({ "smoothing": 20.0 }));
        assert_eq!(sent[0]["timescale"]["speed"], json!(1.2));
    }

    #[tokio::test]
    async fn play_without_replace_keeps_current_track() {
        let mut fixture = connected().await;

        let first = fixture.player.play(track("a", 60_000)).start().await.unwrap();
        let second = fixture.player.play(track("b", 60_000)).replace(false).start().await.unwrap();

        assert_eq!(first, Some(track("a", 60_000)));
        assert_eq!(second, None);
        assert_eq!(fixture.player.track(), Some(&track("a", 60_000)));
        assert_eq!(ops(&fixture.socket), vec!["play"]);
    }

    #[tokio::test]
    async fn play_payload() {
        let mut fixture = connected().await;

        fixture.player.pause().await.unwrap();
        fixture.player.play(track("a", 60_000))
            .start_time(Duration::from_secs(5))
            .start()
            .await
            .unwrap();
        fixture.player.play(track("b", 60_000))
            .finish_time(Duration::from_secs(30))
            .start()
            .await
            .unwrap();

        let sent = fixture.socket.sent();

        assert_eq!(sent[1], json!({ "op": "play", "guildId": GUILD.to_string(), "track": "a", "noReplace": false, "startTime": 5000 }));
        assert_eq!(sent[2]["endTime"], json!(30_000));
        assert!(!fixture.player.is_paused());
    }

    #[tokio::test]
    async fn play_resolves_partial_tracks() {
        struct Loader;

        #[async_trait]
        impl TrackLoader for Loader {
            async fn load(&self, search: &TrackSearch) -> PlayerResult<Option<Track>> {
                Ok(Some(Track::new(format!("resolved:{}", search))))
            }
        }

        let mut fixture = connected().await;
        let partial = PartialTrack::new(TrackSearch::Youtube("song".to_string()), Arc::new(Loader));

        let played = fixture.player.play(partial).start().await.unwrap().unwrap();

        assert_eq!(played.track, "resolved:ytsearch:song");
        assert_eq!(fixture.socket.sent()[0]["track"], "resolved:ytsearch:song");
    }

    #[tokio::test]
    async fn stop_clears_the_track() {
        let mut fixture = connected().await;

        fixture.player.play(track("a", 60_000)).start().await.unwrap();
        assert!(fixture.player.is_playing());

        fixture.player.stop().await.unwrap();

        assert_eq!(fixture.socket.sent().last().unwrap(), &json!({ "op": "stop", "guildId": GUILD.to_string() }));
        assert!(!fixture.player.is_playing());
    }

    #[tokio::test]
    async fn seek_only_sends() {
        let mut fixture = connected().await;

        fixture.player.play(track("a", 60_000)).start().await.unwrap();
        let before = fixture.player.state().clone();

        fixture.player.seek(Duration::from_millis(42_000)).await.unwrap();

        assert_eq!(fixture.socket.sent().last().unwrap()["position"], json!(42_000));
        assert_eq!(fixture.player.state(), &before);
    }

    #[tokio::test]
    async fn destroy_drops_the_node_player() {
        let mut fixture = connected().await;

        fixture.player.play(track("a", 60_000)).start().await.unwrap();
        fixture.player.destroy().await.unwrap();

        assert_eq!(fixture.socket.sent().last().unwrap(), &json!({ "op": "destroy", "guildId": GUILD.to_string() }));
        assert!(fixture.player.track().is_none());
    }

    #[tokio::test]
    async fn disconnect_cleans_up_even_when_leaving_fails() {
        let mut fixture = fixture_with(ScriptedGateway { fail: true, ..Default::default() });
        let guild = fixture.player.guild_id();

        fixture.player.on_voice_server_update(json!({ "token": "abc" })).await.unwrap();
        assert!(fixture.player.node().players.contains(&guild));

        let result = fixture.player.disconnect(true).await;

        assert!(matches!(result, Err(PlayerError::Gateway(_))));
        assert!(!fixture.player.node().players.contains(&guild));
        assert!(fixture.player.handshake().is_empty());
        assert!(!fixture.player.is_connected());
        assert_eq!(fixture.gateway.requests.lock().unwrap().clone(), vec![None]);
    }

    #[tokio::test]
    async fn cancelled_disconnect_still_cleans_up() {
        let mut fixture = fixture_with(ScriptedGateway { hang: true, ..Default::default() });
        let guild = fixture.player.guild_id();

        fixture.player.on_voice_server_update(json!({ "token": "abc" })).await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(50), fixture.player.disconnect(true)).await;

        assert!(result.is_err());
        assert!(!fixture.player.node().players.contains(&guild));
        assert!(fixture.player.handshake().is_empty());
        assert!(!fixture.player.is_connected());
    }

    #[tokio::test]
    async fn move_to_keeps_playback() {
        let mut fixture = connected().await;

        fixture.player.play(track("a", 60_000)).start().await.unwrap();
        fixture.player.move_to(ChannelId::new(42)).await.unwrap();

        assert!(fixture.player.is_playing());
        assert_eq!(
            fixture.gateway.requests.lock().unwrap().clone(),
            vec![Some(ChannelId::new(CHANNEL)), Some(ChannelId::new(42))]
        );
    }

    #[tokio::test]
    async fn connect_fails_when_gateway_fails() {
        let mut fixture = fixture_with(ScriptedGateway { fail: true, ..Default::default() });

        assert!(fixture.player.connect(Duration::from_secs(1)).await.is_err());
        assert!(!fixture.player.is_connected());
    }
}
