use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One encoder segment, immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in emission order, starting at 0.
    pub sequence: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(sequence: u64, data: Vec<u8>) -> Self {
        Self { sequence, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A finished recording, ready for playback.
///
/// Clones share the playable handle: once any clone is revoked, none of them
/// hand out bytes anymore.
#[derive(Clone)]
pub struct RecordedArtifact {
    bytes: Arc<[u8]>,
    mime_type: String,
    checksum: String,
    chunk_count: usize,
    url: String,
    revoked: Arc<AtomicBool>,
}

impl RecordedArtifact {
    pub(crate) fn new(bytes: Vec<u8>, mime_type: &str, chunk_count: usize) -> Self {
        let checksum = sha256_hex(&bytes);
        let url = format!("blob:offline-recorder/{}", &checksum[..16]);
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.to_string(),
            checksum,
            chunk_count,
            url,
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Recorded bytes, or `None` once the handle has been revoked.
    pub fn bytes(&self) -> Option<&[u8]> {
        if self.is_revoked() {
            return None;
        }
        Some(&self.bytes)
    }

    /// Size in bytes (still reported after revocation).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// SHA-256 hex digest of the recorded bytes.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Transient playable handle.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn revoke(&self) {
        if !self.revoked.swap(true, Ordering::SeqCst) {
            log::debug!("Revoked playback handle {}", self.url);
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl PartialEq for RecordedArtifact {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
            && self.mime_type == other.mime_type
            && self.chunk_count == other.chunk_count
            && self.url == other.url
    }
}

impl fmt::Debug for RecordedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedArtifact")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("chunk_count", &self.chunk_count)
            .field("url", &self.url)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}

/// Metadata stored alongside a persisted recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: u64,
    pub mime_type: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub chunk_count: usize,
    pub duration_secs: f64,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn for_artifact(id: u64, artifact: &RecordedArtifact, duration_secs: f64) -> Self {
        Self {
            id,
            mime_type: artifact.mime_type().to_string(),
            size_bytes: artifact.len() as u64,
            checksum: artifact.checksum().to_string(),
            chunk_count: artifact.chunk_count(),
            duration_secs,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
