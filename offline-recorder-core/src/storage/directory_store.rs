use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::artifact::{sha256_hex, RecordedArtifact, RecordingMetadata};
use crate::models::config::OutputFormat;
use crate::models::error::RecorderError;
use crate::storage::metadata;
use crate::traits::artifact_store::ArtifactStore;

const METADATA_SUFFIX: &str = ".metadata.json";
const COUNTER_FILE: &str = "next_id";

/// Directory-backed offline store.
///
/// ## Layout
///
/// ```text
/// <dir>/
///   1.webm              recorded bytes, as assembled
///   1.metadata.json     RecordingMetadata sidecar
///   2.webm
///   2.metadata.json
///   next_id             id the next put will use
/// ```
///
/// Ids start at 1 and are never reused, even after the newest record is
/// deleted. The persisted counter wins unless records on disk are newer.
pub struct DirectoryStore {
    dir: PathBuf,
    next_id: u64,
}

impl DirectoryStore {
    /// Open `dir`, creating it if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RecorderError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| RecorderError::StorageError(format!("failed to create directory: {}", e)))?;

        let after_stored = stored_ids(&dir)?.into_iter().max().unwrap_or(0) + 1;
        let next_id = read_counter(&dir)?.unwrap_or(1).max(after_stored);
        log::info!("Opened recording store at {} (next id {})", dir.display(), next_id);
        Ok(Self { dir, next_id })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the recorded bytes for `id`.
    pub fn recording_path(&self, id: u64) -> PathBuf {
        self.dir
            .join(format!("{}.{}", id, OutputFormat::WEBM_VP8_OPUS.file_extension))
    }

    fn write_recording(&self, path: &Path, bytes: &[u8]) -> Result<(), RecorderError> {
        let mut file = File::create(path)
            .map_err(|e| RecorderError::StorageError(format!("failed to create file: {}", e)))?;
        file.write_all(bytes)
            .map_err(|e| RecorderError::StorageError(format!("write failed: {}", e)))?;
        file.flush()
            .map_err(|e| RecorderError::StorageError(e.to_string()))?;
        Ok(())
    }
}

impl ArtifactStore for DirectoryStore {
    fn put(
        &mut self,
        artifact: &RecordedArtifact,
        duration_secs: f64,
    ) -> Result<RecordingMetadata, RecorderError> {
        let bytes = artifact
            .bytes()
            .ok_or_else(|| RecorderError::StorageError("artifact has been revoked".into()))?;

        let id = self.next_id;
        let path = self.recording_path(id);
        let record = RecordingMetadata::for_artifact(id, artifact, duration_secs);

        self.write_recording(&path, bytes)?;
        metadata::write_metadata(&record, &path)?;
        self.next_id += 1;
        write_counter(&self.dir, self.next_id)?;

        log::info!("Stored recording {} ({} bytes)", id, record.size_bytes);
        Ok(record)
    }

    fn get(&self, id: u64) -> Result<(RecordingMetadata, Vec<u8>), RecorderError> {
        let path = self.recording_path(id);
        let record = metadata::read_metadata(&path)?;
        let bytes = fs::read(&path)
            .map_err(|e| RecorderError::StorageError(format!("failed to read recording {}: {}", id, e)))?;

        if sha256_hex(&bytes) != record.checksum {
            log::error!("Checksum mismatch for recording {}", id);
            return Err(RecorderError::StorageError(format!(
                "checksum mismatch for recording {}",
                id
            )));
        }
        Ok((record, bytes))
    }

    fn list(&self) -> Result<Vec<RecordingMetadata>, RecorderError> {
        let mut ids = stored_ids(&self.dir)?;
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| metadata::read_metadata(&self.recording_path(id)))
            .collect()
    }

    fn delete(&mut self, id: u64) -> Result<(), RecorderError> {
        let path = self.recording_path(id);
        let sidecar = metadata::metadata_path(&path);
        if !sidecar.exists() {
            return Err(RecorderError::StorageError(format!("no recording with id {}", id)));
        }

        fs::remove_file(&sidecar)
            .map_err(|e| RecorderError::StorageError(format!("failed to delete metadata: {}", e)))?;
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| RecorderError::StorageError(format!("failed to delete recording: {}", e)))?;
        }
        log::info!("Deleted recording {}", id);
        Ok(())
    }
}

fn read_counter(dir: &Path) -> Result<Option<u64>, RecorderError> {
    let path = dir.join(COUNTER_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)
        .map_err(|e| RecorderError::StorageError(format!("failed to read id counter: {}", e)))?;
    match text.trim().parse::<u64>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            log::warn!("Ignoring unreadable id counter in {}", dir.display());
            Ok(None)
        }
    }
}

fn write_counter(dir: &Path, next_id: u64) -> Result<(), RecorderError> {
    fs::write(dir.join(COUNTER_FILE), next_id.to_string())
        .map_err(|e| RecorderError::StorageError(format!("failed to write id counter: {}", e)))
}

/// Ids of every record with a metadata sidecar in `dir`.
fn stored_ids(dir: &Path) -> Result<Vec<u64>, RecorderError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| RecorderError::StorageError(format!("failed to list {}: {}", dir.display(), e)))?;

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RecorderError::StorageError(e.to_string()))?;
        let name = entry.file_name();
        let id = name
            .to_str()
            .and_then(|name| name.strip_suffix(METADATA_SUFFIX))
            .and_then(|stem| stem.parse::<u64>().ok());
        if let Some(id) = id {
            ids.push(id);
        }
    }
    Ok(ids)
}
