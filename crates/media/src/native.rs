//! Seam to the provider's embedded player.
//!
//! The IFrame API constructs players and reports back through callbacks; a
//! [`PlayerFactory`] stands in for `new YT.Player(...)` and a
//! [`NativePlayer`] for the object it returns.

use dom::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Player state codes reported by `onStateChange`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Unstarted = -1,
    Ended = 0,
    Playing = 1,
    Paused = 2,
    Buffering = 3,
    Cued = 5,
}

impl PlayerState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Unstarted => "unstarted",
            PlayerState::Ended => "ended",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Buffering => "buffering",
            PlayerState::Cued => "cued",
        }
    }
}

/// A constructed provider player.
///
/// Implementations may report state changes synchronously from inside these
/// calls.
pub trait NativePlayer: Send + Sync {
    fn play_video(&self);
    fn pause_video(&self);
    fn stop_video(&self);
    /// Current state code, queried live.
    fn player_state(&self) -> i32;
    fn destroy(&self);
}

impl std::fmt::Debug for dyn NativePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePlayer").finish_non_exhaustive()
    }
}

pub type PlayerHandle = Arc<dyn NativePlayer>;

/// A value in the `playerVars` mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerVar {
    Int(i64),
    Text(String),
}

impl From<i64> for PlayerVar {
    fn from(value: i64) -> Self {
        PlayerVar::Int(value)
    }
}

impl From<bool> for PlayerVar {
    fn from(value: bool) -> Self {
        PlayerVar::Int(i64::from(value))
    }
}

impl From<String> for PlayerVar {
    fn from(value: String) -> Self {
        PlayerVar::Text(value)
    }
}

impl From<&str> for PlayerVar {
    fn from(value: &str) -> Self {
        PlayerVar::Text(value.to_string())
    }
}

pub type PlayerVars = IndexMap<String, PlayerVar>;

/// Callbacks handed to the provider at construction.
pub struct PlayerEvents {
    /// Fires once, when the player can accept commands.
    pub on_ready: Box<dyn FnOnce(PlayerHandle) + Send>,
    pub on_state_change: Arc<dyn Fn(i32) + Send + Sync>,
    pub on_error: Arc<dyn Fn(i32) + Send + Sync>,
}

impl fmt::Debug for PlayerEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerEvents").finish_non_exhaustive()
    }
}

/// Options for constructing a player, like `YT.PlayerOptions`.
#[derive(Debug)]
pub struct PlayerOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub video_id: String,
    pub player_vars: PlayerVars,
    pub events: PlayerEvents,
}

/// Constructs players into a mount node.
///
/// `on_ready` may be invoked synchronously, before `create` returns.
pub trait PlayerFactory: Send + Sync {
    fn create(&self, mount: NodeId, options: PlayerOptions) -> PlayerHandle;
}
