//! Native state changes to media events.

use crate::native::PlayerState;
use crate::video::VideoShared;
use dom::{Event, EventType};
use tracing::{debug, warn};

impl VideoShared {
    /// Handle an `onStateChange` code from the native player.
    ///
    /// `playing` first pauses every other instance whose player reports
    /// playing, then dispatches `play` and `playing` here. Reports from a
    /// destroyed instance or a player of an earlier build are dropped.
    pub(crate) fn on_state_change(&self, attempt: u64, code: i32) {
        if !self.is_current(attempt) {
            debug!(instance = self.id, attempt, code, "Ignoring state change from a stale player");
            return;
        }
        let Some(state) = PlayerState::from_code(code) else {
            warn!(instance = self.id, code, "Ignoring unknown player state");
            return;
        };
        debug!(instance = self.id, state = state.as_str(), "Player state changed");

        let playing_class = &self.coordinator.config().playing_class;
        match state {
            PlayerState::Playing => {
                self.media.set_playback(false, false);
                for other in self.coordinator.registry.others(self.id) {
                    other.pause_if_playing();
                }
                self.set_container_class(playing_class, true);
                self.dispatch(Event::new(EventType::Play));
                self.dispatch(Event::new(EventType::Playing));
            }
            PlayerState::Paused => {
                self.media.set_playback(true, false);
                self.set_container_class(playing_class, false);
                self.dispatch(Event::new(EventType::Pause));
            }
            PlayerState::Ended => {
                self.media.set_playback(true, true);
                self.set_container_class(playing_class, false);
                self.dispatch(Event::new(EventType::Ended));
            }
            PlayerState::Unstarted | PlayerState::Buffering | PlayerState::Cued => {}
        }
    }
}
