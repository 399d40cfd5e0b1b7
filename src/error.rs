//! Error taxonomy for catalog loading and playback sessions

use thiserror::Error;

use crate::models::MediaKind;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlayerError {
    #[error("catalog load failed: {0}")]
    Catalog(String),

    #[error("the selected channel has no valid stream URL")]
    ChannelInvalid,

    #[error("timed out while acquiring the {kind} stream")]
    AcquisitionTimeout { kind: MediaKind },

    #[error("stream error: {details}")]
    BackendFatal { details: String },

    #[error("playback was rejected: {reason}")]
    PlaybackRejected { reason: String },

    #[error("the fullscreen request was rejected")]
    FullscreenRejected,
}

impl PlayerError {
    /// Title shown in the error modal.
    pub fn title(&self) -> &'static str {
        match self {
            PlayerError::Catalog(_) => "Channel load error",
            PlayerError::ChannelInvalid => "Invalid channel",
            PlayerError::AcquisitionTimeout { .. } => "Channel timed out",
            PlayerError::BackendFatal { .. } => "Stream error",
            PlayerError::PlaybackRejected { .. } => "Playback error",
            PlayerError::FullscreenRejected => "Fullscreen error",
        }
    }
}
