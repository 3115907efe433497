use crate::models::artifact::{RecordedArtifact, RecordingMetadata};
use crate::models::error::RecorderError;

/// Offline persistence for finished recordings.
///
/// Records are keyed by auto-incrementing numeric ids. The session controller
/// never depends on a store; callers persist the artifact `stop()` returns.
pub trait ArtifactStore {
    /// Persist `artifact` under a fresh id.
    fn put(
        &mut self,
        artifact: &RecordedArtifact,
        duration_secs: f64,
    ) -> Result<RecordingMetadata, RecorderError>;

    /// Load a record, verifying its checksum.
    fn get(&self, id: u64) -> Result<(RecordingMetadata, Vec<u8>), RecorderError>;

    /// All stored records, by ascending id.
    fn list(&self) -> Result<Vec<RecordingMetadata>, RecorderError>;

    fn delete(&mut self, id: u64) -> Result<(), RecorderError>;
}
