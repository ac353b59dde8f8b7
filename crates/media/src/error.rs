//! Player errors.

use networking::LoadError;
use thiserror::Error;

/// Errors surfaced by a video element.
///
/// `Clone` because one failure is delivered to every waiter of a shared
/// load.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("cannot play a video element that has no YouTube source URL")]
    NoSource,
    #[error("player could not be built (code {code})")]
    PlayerBuild { code: i32 },
    #[error("player API script failed to load: {0}")]
    ScriptLoad(#[from] LoadError),
    #[error("global ready callback `{0}` is already owned by another script")]
    ReadyCallbackOccupied(String),
    #[error("player API script was released before it became ready")]
    ScriptReleased,
    #[error("video element was destroyed")]
    Destroyed,
    #[error("video element is not attached to a parent")]
    NotMounted,
}

impl PlayerError {
    /// Numeric code mirrored into `MediaError`-style reporting.
    pub fn code(&self) -> u16 {
        match self {
            PlayerError::NoSource => 4,
            PlayerError::PlayerBuild { .. } => 3,
            PlayerError::ScriptLoad(_) | PlayerError::ReadyCallbackOccupied(_) | PlayerError::ScriptReleased => 2,
            PlayerError::Destroyed | PlayerError::NotMounted => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_converts() {
        let err: PlayerError = LoadError::Timeout.into();
        assert_eq!(err, PlayerError::ScriptLoad(LoadError::Timeout));
        assert_eq!(err.code(), 2);
        assert!(PlayerError::NoSource.to_string().contains("no YouTube source"));
    }
}
