use std::time::{Duration, Instant};

use crate::models::artifact::Chunk;
use crate::models::config::OutputFormat;
use crate::models::error::RecorderError;
use crate::models::media::{AudioBuffer, VideoFrame};
use crate::traits::encoder::{EncoderFactory, MediaEncoder, TrackSet};

/// Receives each segment as it is emitted.
pub type ChunkCallback = Box<dyn FnMut(Chunk) + Send + 'static>;

/// Drives a platform encoder and hands its output over in timed segments.
///
/// Segments carry consecutive sequence numbers in emission order. Empty drains
/// are skipped. After `stop()` (or `abort()`) the callback never fires again.
pub struct EncoderSink {
    encoder: Option<Box<dyn MediaEncoder>>,
    on_chunk: ChunkCallback,
    interval: Duration,
    last_emit: Instant,
    next_sequence: u64,
    bytes_emitted: u64,
}

impl EncoderSink {
    /// Construct the encoder for `tracks` and start the segment clock at `now`.
    pub fn start(
        factory: &dyn EncoderFactory,
        tracks: &TrackSet,
        format: &OutputFormat,
        on_chunk: ChunkCallback,
        interval: Duration,
        now: Instant,
    ) -> Result<Self, RecorderError> {
        let encoder = factory.create(tracks, format)?;
        log::info!(
            "Encoder started: {} ({} + {}), timeslice {:?}",
            format.mime_type,
            tracks.video.label,
            tracks.audio.label,
            interval
        );
        Ok(Self {
            encoder: Some(encoder),
            on_chunk,
            interval,
            last_emit: now,
            next_sequence: 0,
            bytes_emitted: 0,
        })
    }

    pub fn push_video(&mut self, frame: &VideoFrame) -> Result<(), RecorderError> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.encode_video(frame),
            None => Ok(()),
        }
    }

    pub fn push_audio(&mut self, buffer: &AudioBuffer) -> Result<(), RecorderError> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.encode_audio(buffer),
            None => Ok(()),
        }
    }

    /// Emit the buffered segment if a full interval has passed since the last one.
    ///
    /// Returns whether a segment was emitted.
    pub fn tick(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_emit) < self.interval {
            return false;
        }
        let Some(encoder) = self.encoder.as_mut() else {
            return false;
        };
        let data = encoder.take_output();
        self.last_emit = now;
        self.emit(data)
    }

    /// Flush the final segment and finish. Idempotent.
    pub fn stop(&mut self) -> Result<(), RecorderError> {
        let Some(mut encoder) = self.encoder.take() else {
            return Ok(());
        };
        let tail = encoder.finish()?;
        self.emit(tail);
        log::info!(
            "Encoder stopped after {} segments ({} bytes)",
            self.next_sequence,
            self.bytes_emitted
        );
        Ok(())
    }

    /// Drop the encoder without flushing. Idempotent.
    pub fn abort(&mut self) {
        if self.encoder.take().is_some() {
            log::debug!("Encoder aborted after {} segments", self.next_sequence);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.encoder.is_none()
    }

    pub fn segments_emitted(&self) -> u64 {
        self.next_sequence
    }

    fn emit(&mut self, data: Vec<u8>) -> bool {
        if data.is_empty() {
            return false;
        }
        self.bytes_emitted += data.len() as u64;
        let chunk = Chunk::new(self.next_sequence, data);
        self.next_sequence += 1;
        (self.on_chunk)(chunk);
        true
    }
}

impl Drop for EncoderSink {
    fn drop(&mut self) {
        self.abort();
    }
}
