//! Video element configuration.

use serde::Deserialize;

/// Configuration shared by every video element of a coordinator.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    /// URL of the IFrame Player API script.
    pub script_url: String,
    /// Name of the global function the script calls once it is ready.
    pub ready_callback: String,
    /// Class on the container while a video plays.
    pub playing_class: String,
    /// Class on the container while the player loads.
    pub loading_class: String,
    /// Class on the container itself.
    pub wrapper_class: String,
    /// Prefix of mount ids: `<prefix><id>` and `<prefix><id>-container`.
    pub mount_prefix: String,
    /// Pass `forceSSL=1` to every player.
    pub force_ssl: bool,
    /// Pass `playsinline=1` unless the element opts out.
    pub playsinline: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            script_url: "https://www.youtube.com/iframe_api".to_string(),
            ready_callback: "onYouTubeIframeAPIReady".to_string(),
            playing_class: "video-playing".to_string(),
            loading_class: "video-loading".to_string(),
            wrapper_class: "video-wrapper".to_string(),
            mount_prefix: "vplayer".to_string(),
            force_ssl: false,
            playsinline: true,
        }
    }
}

impl PlayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.script_url = url.into();
        self
    }

    pub fn with_ready_callback(mut self, name: impl Into<String>) -> Self {
        self.ready_callback = name.into();
        self
    }

    pub fn with_force_ssl(mut self, force_ssl: bool) -> Self {
        self.force_ssl = force_ssl;
        self
    }

    pub fn with_playsinline(mut self, playsinline: bool) -> Self {
        self.playsinline = playsinline;
        self
    }

    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    pub(crate) fn mount_id(&self, instance: u64) -> String {
        format!("{}{}", self.mount_prefix, instance)
    }

    pub(crate) fn container_id(&self, instance: u64) -> String {
        format!("{}{}-container", self.mount_prefix, instance)
    }
}
