use crate::models::artifact::{Chunk, RecordedArtifact};

/// Concatenate `chunks` in sequence order into one playable artifact.
///
/// Pure: the result depends only on the chunk bytes and `mime_type`, so the
/// same input always yields an equal artifact.
pub fn assemble(chunks: &[Chunk], mime_type: &str) -> RecordedArtifact {
    let total: usize = chunks.iter().map(Chunk::len).sum();
    let mut bytes = Vec::with_capacity(total);
    for chunk in chunks {
        bytes.extend_from_slice(&chunk.data);
    }
    log::debug!(
        "Assembled {} chunks into {} bytes ({})",
        chunks.len(),
        bytes.len(),
        mime_type
    );
    RecordedArtifact::new(bytes, mime_type, chunks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::OutputFormat;

    fn chunk(sequence: u64, len: usize, fill: u8) -> Chunk {
        Chunk::new(sequence, vec![fill; len])
    }

    #[test]
    fn concatenates_in_emission_order() {
        let chunks = [chunk(0, 100, 1), chunk(1, 150, 2), chunk(2, 120, 3)];
        let artifact = assemble(&chunks, OutputFormat::WEBM_VP8_OPUS.mime_type);

        let bytes = artifact.bytes().unwrap();
        assert_eq!(bytes.len(), 370);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[100], 2);
        assert_eq!(bytes[250], 3);
        assert_eq!(artifact.chunk_count(), 3);
        assert_eq!(artifact.mime_type(), "video/webm; codecs=vp8,opus");
    }

    #[test]
    fn same_input_same_artifact() {
        let chunks = vec![chunk(0, 10, 7), chunk(1, 5, 9)];
        let first = assemble(&chunks, "video/webm");
        let second = assemble(&chunks, "video/webm");

        assert_eq!(first, second);
        assert_eq!(first.checksum(), second.checksum());
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn order_changes_the_result() {
        let a = assemble(&[chunk(0, 4, 1), chunk(1, 4, 2)], "video/webm");
        let b = assemble(&[chunk(0, 4, 2), chunk(1, 4, 1)], "video/webm");
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn no_chunks_gives_empty_artifact() {
        let artifact = assemble(&[], "video/webm");
        assert!(artifact.is_empty());
        assert_eq!(artifact.chunk_count(), 0);
    }

    #[test]
    fn revoked_artifact_hides_bytes() {
        let artifact = assemble(&[chunk(0, 8, 0)], "video/webm");
        let shared = artifact.clone();

        shared.revoke();

        assert!(artifact.is_revoked());
        assert!(artifact.bytes().is_none());
        assert_eq!(artifact.len(), 8);
    }
}
