use crate::models::artifact::RecordedArtifact;
use crate::models::device::CaptureDevice;
use crate::models::error::RecorderError;
use crate::models::state::SessionState;

/// Surface a UI binds to: three actions, one device selection, two observables.
pub trait Recorder {
    /// Request microphone access and refresh the device list.
    fn grant_permission(&mut self) -> Result<Vec<CaptureDevice>, RecorderError>;

    /// Choose the microphone for the next recording (`None` = platform default).
    fn select_device(&mut self, device_id: Option<String>);

    /// Start a recording. Transitions: idle/stopped → acquiring → mixing → recording.
    fn start(&mut self) -> Result<(), RecorderError>;

    /// Stop the recording. Transitions: recording → stopping → stopped.
    ///
    /// Returns `None` when there was nothing to stop.
    fn stop(&mut self) -> Result<Option<RecordedArtifact>, RecorderError>;

    /// Current session state.
    fn state(&self) -> SessionState;

    /// Playable result of the last completed recording.
    fn artifact(&self) -> Option<&RecordedArtifact>;
}
