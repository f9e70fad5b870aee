use chrono::{DateTime, TimeZone, Utc};
use super::gateway::State;

/// Last position reported by the node and the instant it was reported at.
///
/// Reads extrapolate from this snapshot instead of asking the node.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub last_update: DateTime<Utc>,
    /// Seconds, rounded to one decimal.
    pub last_position: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            last_update: Utc::now(),
            last_position: 0.0,
        }
    }
}

/// Halves go to the even tenth, 12.25 becomes 12.2.
pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

impl PlaybackState {
    /// Records a node snapshot, a `time` of 0 resets the baseline to now.
    pub fn update(&mut self, state: &State) {
        self.last_update = match state.time {
            0 => Utc::now(),
            time => Utc.timestamp_millis_opt(time).single().unwrap_or_else(Utc::now),
        };

        self.last_position = round_tenths(state.position as f64 / 1000.0);
    }

    /// Position in seconds at `now`, clamped to `[0, duration]`.
    pub fn position_at(&self, now: DateTime<Utc>, paused: bool, duration: f64) -> f64 {
        if paused {
            return self.last_position.min(duration);
        }

        let delta = (now - self.last_update).num_milliseconds() as f64 / 1000.0;

        round_tenths(self.last_position + delta).clamp(0.0, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(time: i64, position: u64) -> PlaybackState {
        let mut state = PlaybackState::default();
        state.update(&State { position, time });
        state
    }

    #[test]
    fn position_is_rounded_to_tenths() {
        let state = at(1_600_000_000_000, 12_345);

        assert_eq!(state.last_position, 12.3);
        assert_eq!(state.last_update.timestamp_millis(), 1_600_000_000_000);
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(at(1_600_000_000_000, 12_250).last_position, 12.2);
        assert_eq!(at(1_600_000_000_000, 12_350).last_position, 12.4);
    }

    #[test]
    fn paused_position_is_pinned() {
        let state = at(1_600_000_000_000, 30_000);
        let later = state.last_update + Duration::seconds(20);

        assert_eq!(state.position_at(later, true, 200.0), 30.0);
        assert_eq!(state.position_at(later, true, 10.0), 10.0);
    }

    #[test]
    fn playing_position_extrapolates() {
        let state = at(1_600_000_000_000, 30_000);
        let later = state.last_update + Duration::milliseconds(2_540);

        assert_eq!(state.position_at(later, false, 200.0), 32.5);
    }

    #[test]
    fn extrapolation_is_clamped() {
        let state = at(1_600_000_000_000, 30_000);

        assert_eq!(state.position_at(state.last_update + Duration::seconds(600), false, 200.0), 200.0);
        assert_eq!(state.position_at(state.last_update - Duration::seconds(600), false, 200.0), 0.0);
    }

    #[test]
    fn zero_time_resets_to_now() {
        let before = Utc::now();
        let state = at(0, 0);

        assert!(state.last_update >= before);
        assert_eq!(state.last_position, 0.0);
    }
}
