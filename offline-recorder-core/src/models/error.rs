use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while acquiring, mixing, encoding or storing a recording.
///
/// Every variant is recoverable at the session level: the controller tears the
/// session down, returns to idle and hands the error back to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("no capture source selected")]
    NoSourceSelected,

    #[error("device not available")]
    DeviceUnavailable,

    #[error("no audio track in the shared capture")]
    NoAudioTrack,

    #[error("no concrete device matches the alias")]
    NoMatchingDevice,

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("session busy: cannot start while {0}")]
    SessionBusy(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl RecorderError {
    /// Short, user-actionable message for this error.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Allow screen and microphone access, then try again.",
            Self::NoSourceSelected => "Pick a screen, window or tab to record.",
            Self::DeviceUnavailable => "The selected microphone is unavailable. Choose another device.",
            Self::NoAudioTrack => {
                "Did you forget to enable audio sharing when picking the screen?"
            }
            Self::NoMatchingDevice => "The default microphone could not be matched; using it as-is.",
            Self::UnsupportedFormat(_) => "This platform cannot encode the recording format.",
            Self::SessionBusy(_) => "A recording is already in progress.",
            Self::ConfigurationFailed(_) => "The recorder settings are invalid.",
            Self::EncodingFailed(_) => "Recording failed while encoding. Please try again.",
            Self::StorageError(_) => "The recording could not be saved.",
        }
    }
}
