//! YouTube-backed video elements.
//!
//! This crate provides:
//! - A page-wide coordinator that loads the IFrame Player API script once
//! - The `<youtube-video>` element lifecycle (load, build, play, destroy)
//! - Translation of native player states into media events, pausing other
//!   videos when one starts playing
//! - Source URL parsing (video id, query parameters)

pub mod config;
pub mod coordinator;
pub mod error;
pub mod media_element;
pub mod native;
pub mod registry;
mod translator;
pub mod url;
pub mod video;

pub use config::PlayerConfig;
pub use coordinator::{PlayerCoordinator, ScriptReady};
pub use error::PlayerError;
pub use media_element::{CanPlayType, MediaElement, MediaNetworkState, MediaReadyState};
pub use native::{
    NativePlayer, PlayerEvents, PlayerFactory, PlayerHandle, PlayerOptions, PlayerState, PlayerVar, PlayerVars,
};
pub use registry::PlayerRegistry;
pub use url::{extract_video_id, is_video_id, parse_query_params};
pub use video::{LifecycleState, PlayerFuture, YoutubeVideo};
