use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → acquiring → mixing → recording → stopping → stopped
///            ↓          ↓         ↓
///          error ──────────────────→ idle
/// ```
///
/// `Error` is transient: the controller always continues to `Idle` once the
/// session has been torn down.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Acquiring,
    Mixing,
    Recording,
    Stopping,
    Stopped,
    Error(RecorderError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Whether `start()` is accepted in this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }

    /// Whether a session is mid-flight (between start and stopped).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Acquiring | Self::Mixing | Self::Recording | Self::Stopping
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Mixing => "mixing",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Error(_) => "error",
        }
    }
}
