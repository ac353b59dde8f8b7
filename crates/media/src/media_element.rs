//! HTMLMediaElement state mirrored by a video element.

use crate::error::PlayerError;
use parking_lot::RwLock;

#[derive(Clone, Debug)]
struct MediaState {
    current_src: String,
    network_state: MediaNetworkState,
    ready_state: MediaReadyState,
    paused: bool,
    ended: bool,
    error: Option<PlayerError>,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            current_src: String::new(),
            network_state: MediaNetworkState::Empty,
            ready_state: MediaReadyState::HaveNothing,
            paused: true,
            ended: false,
            error: None,
        }
    }
}

/// Media element state.
///
/// Only the event translator flips `paused`/`ended`; `play()` and `pause()`
/// merely ask the native player to act.
#[derive(Debug, Default)]
pub struct MediaElement {
    state: RwLock<MediaState>,
}

impl MediaElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source URL of the last load, after `<source>` fallback.
    pub fn current_src(&self) -> String {
        self.state.read().current_src.clone()
    }

    pub(crate) fn set_current_src(&self, src: &str) {
        self.state.write().current_src = src.to_string();
    }

    pub fn network_state(&self) -> MediaNetworkState {
        self.state.read().network_state
    }

    pub(crate) fn set_network_state(&self, network_state: MediaNetworkState) {
        self.state.write().network_state = network_state;
    }

    pub fn ready_state(&self) -> MediaReadyState {
        self.state.read().ready_state
    }

    pub(crate) fn set_ready_state(&self, ready_state: MediaReadyState) {
        self.state.write().ready_state = ready_state;
    }

    pub fn paused(&self) -> bool {
        self.state.read().paused
    }

    pub fn ended(&self) -> bool {
        self.state.read().ended
    }

    /// Record a native state transition.
    pub(crate) fn set_playback(&self, paused: bool, ended: bool) {
        let mut state = self.state.write();
        state.paused = paused;
        state.ended = ended;
    }

    /// The last error recorded, if any.
    pub fn error(&self) -> Option<PlayerError> {
        self.state.read().error.clone()
    }

    pub(crate) fn set_error(&self, error: PlayerError) {
        self.state.write().error = Some(error);
    }

    /// Back to an element with no player. The source and last error stay.
    pub(crate) fn reset(&self) {
        let mut state = self.state.write();
        state.network_state = MediaNetworkState::Empty;
        state.ready_state = MediaReadyState::HaveNothing;
        state.paused = true;
        state.ended = false;
    }

    pub fn can_play_type(&self, mime_type: &str) -> CanPlayType {
        match mime_type.split(';').next().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("video/youtube") => CanPlayType::Probably,
            _ => CanPlayType::Empty,
        }
    }
}

/// `HTMLMediaElement.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    /// Set once the native player reports ready.
    HaveEnoughData = 4,
}

/// `HTMLMediaElement.networkState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaNetworkState {
    Empty = 0,
    Idle = 1,
    Loading = 2,
    /// `play()` found no source.
    NoSource = 3,
}

/// Answer of `canPlayType()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanPlayType {
    Empty,
    Probably,
}

impl CanPlayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanPlayType::Empty => "",
            CanPlayType::Probably => "probably",
        }
    }
}
