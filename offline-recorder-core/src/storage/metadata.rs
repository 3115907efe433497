use std::fs;
use std::path::{Path, PathBuf};

use crate::models::artifact::RecordingMetadata;
use crate::models::error::RecorderError;

/// Sidecar path for a recording: `<stem>.metadata.json` next to it.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), RecorderError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| RecorderError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| RecorderError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, RecorderError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| RecorderError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: RecordingMetadata = serde_json::from_str(&json)
        .map_err(|e| RecorderError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_sits_next_to_recording() {
        assert_eq!(
            metadata_path(Path::new("/tmp/store/7.webm")),
            PathBuf::from("/tmp/store/7.metadata.json")
        );
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let dir = std::env::temp_dir().join(format!("offline_recorder_meta_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let recording = dir.join("1.webm");
        let metadata = RecordingMetadata {
            id: 1,
            mime_type: "video/webm; codecs=vp8,opus".into(),
            size_bytes: 370,
            checksum: "abc".into(),
            chunk_count: 3,
            duration_secs: 1.5,
            created_at: "2024-01-01T00:00:00+00:00".into(),
        };

        write_metadata(&metadata, &recording).unwrap();
        assert_eq!(read_metadata(&recording).unwrap(), metadata);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_sidecar_is_a_storage_error() {
        let err = read_metadata(Path::new("/nonexistent/offline-recorder/1.webm")).unwrap_err();
        assert!(matches!(err, RecorderError::StorageError(_)));
    }
}
