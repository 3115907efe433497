use crate::models::config::OutputFormat;
use crate::models::error::RecorderError;
use crate::models::media::{AudioBuffer, TrackInfo, VideoFrame};

/// Track combination handed to the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSet {
    pub video: TrackInfo,
    pub audio: TrackInfo,
}

/// Platform encoder producing the fixed output container.
///
/// Input arrives in capture order. Encoded bytes accumulate internally until
/// the sink drains them with `take_output`.
pub trait MediaEncoder: Send {
    fn encode_video(&mut self, frame: &VideoFrame) -> Result<(), RecorderError>;

    fn encode_audio(&mut self, buffer: &AudioBuffer) -> Result<(), RecorderError>;

    /// Drain the bytes encoded since the last call.
    fn take_output(&mut self) -> Vec<u8>;

    /// Flush and finalize; returns whatever was still buffered.
    fn finish(&mut self) -> Result<Vec<u8>, RecorderError>;
}

/// Builds encoders for a track combination.
pub trait EncoderFactory: Send {
    /// Fails with `UnsupportedFormat` when the combination cannot be encoded.
    fn create(
        &self,
        tracks: &TrackSet,
        format: &OutputFormat,
    ) -> Result<Box<dyn MediaEncoder>, RecorderError>;
}
