use crate::models::artifact::{Chunk, RecordedArtifact};
use crate::models::error::RecorderError;
use crate::models::state::SessionState;

/// Event delegate for recording session notifications.
///
/// All methods are called from the thread driving the session controller.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &SessionState);

    /// Called for every segment appended to the recording.
    fn on_chunk(&self, _chunk: &Chunk) {}

    /// Called when a session fails, before it returns to idle.
    fn on_error(&self, error: &RecorderError);

    /// Called when a recording has been assembled and is ready for playback.
    fn on_artifact_ready(&self, artifact: &RecordedArtifact);
}
