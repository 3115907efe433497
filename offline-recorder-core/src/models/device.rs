use serde::{Deserialize, Serialize};

/// Logical id the platform uses for the system default input.
pub const DEFAULT_ALIAS: &str = "default";

/// Logical id the platform uses for the default communications input.
pub const COMMUNICATIONS_ALIAS: &str = "communications";

pub fn is_alias_id(id: &str) -> bool {
    id == DEFAULT_ALIAS || id == COMMUNICATIONS_ALIAS
}

/// Kind of device reported by platform enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
}

/// Raw enumeration record as delivered by the platform.
///
/// Labels are empty strings until microphone permission has been granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    pub id: String,
    pub group_id: String,
    pub kind: MediaDeviceKind,
    pub label: String,
}

/// An audio input the user can record from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureDevice {
    pub id: String,
    pub label: String,
    /// True for `"default"` / `"communications"` entries, which stand in for
    /// another device in the same list and must be resolved before use.
    pub is_alias: bool,
}

impl CaptureDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            is_alias: is_alias_id(&id),
            id,
            label: label.into(),
        }
    }
}

impl From<MediaDeviceInfo> for CaptureDevice {
    fn from(info: MediaDeviceInfo) -> Self {
        Self::new(info.id, info.label)
    }
}
