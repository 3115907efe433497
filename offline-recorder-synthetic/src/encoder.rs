//! Framed stand-in encoder.
//!
//! Produces a simple self-describing container instead of real VP8/Opus so
//! recordings can be made and inspected without codec libraries.
//!
//! ## Stream Format
//!
//! ```text
//! [header]  b"OFRC" | u8 version | u8 mime length | mime bytes
//! [record]  u8 tag (b'V' | b'A') | u64 LE timestamp (µs) | u32 LE payload length | payload
//! ...
//! [trailer] b'E' | u64 LE video records | u64 LE audio records
//! ```
//!
//! Video payload: `u32 LE width | u32 LE height | one RGBA pixel per 8×8 block`.
//! Audio payload: interleaved 16-bit little-endian PCM.

use std::time::Duration;

use offline_recorder_core::models::config::OutputFormat;
use offline_recorder_core::models::error::RecorderError;
use offline_recorder_core::models::media::{AudioBuffer, TrackKind, VideoFrame};
use offline_recorder_core::processing::dsp;
use offline_recorder_core::traits::encoder::{EncoderFactory, MediaEncoder, TrackSet};

pub const MAGIC: &[u8; 4] = b"OFRC";
pub const VERSION: u8 = 1;

const VIDEO_TAG: u8 = b'V';
const AUDIO_TAG: u8 = b'A';
const END_TAG: u8 = b'E';

/// Pixel stride of the video thumbnail.
const BLOCK: usize = 8;

pub struct FramedEncoder {
    buffer: Vec<u8>,
    audio_position: Duration,
    video_records: u64,
    audio_records: u64,
    finished: bool,
}

impl FramedEncoder {
    pub fn new(format: &OutputFormat) -> Self {
        let mime = format.mime_type.as_bytes();
        let mut buffer = Vec::with_capacity(6 + mime.len());
        buffer.extend_from_slice(MAGIC);
        buffer.push(VERSION);
        buffer.push(mime.len().min(u8::MAX as usize) as u8);
        buffer.extend_from_slice(&mime[..mime.len().min(u8::MAX as usize)]);
        Self {
            buffer,
            audio_position: Duration::ZERO,
            video_records: 0,
            audio_records: 0,
            finished: false,
        }
    }

    fn write_record(&mut self, tag: u8, timestamp: Duration, payload: &[u8]) {
        self.buffer.push(tag);
        self.buffer
            .extend_from_slice(&(timestamp.as_micros() as u64).to_le_bytes());
        self.buffer
            .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.buffer.extend_from_slice(payload);
    }

    fn ensure_open(&self) -> Result<(), RecorderError> {
        if self.finished {
            return Err(RecorderError::EncodingFailed("encoder already finished".into()));
        }
        Ok(())
    }
}

impl MediaEncoder for FramedEncoder {
    fn encode_video(&mut self, frame: &VideoFrame) -> Result<(), RecorderError> {
        self.ensure_open()?;
        let (width, height) = (frame.width as usize, frame.height as usize);
        if frame.data.len() < width * height * 4 {
            return Err(RecorderError::EncodingFailed(format!(
                "video frame too short: {} bytes for {}x{}",
                frame.data.len(),
                width,
                height
            )));
        }

        let mut payload = Vec::with_capacity(8 + (width / BLOCK + 1) * (height / BLOCK + 1) * 4);
        payload.extend_from_slice(&frame.width.to_le_bytes());
        payload.extend_from_slice(&frame.height.to_le_bytes());
        for y in (0..height).step_by(BLOCK) {
            for x in (0..width).step_by(BLOCK) {
                let offset = (y * width + x) * 4;
                payload.extend_from_slice(&frame.data[offset..offset + 4]);
            }
        }

        self.write_record(VIDEO_TAG, frame.timestamp, &payload);
        self.video_records += 1;
        Ok(())
    }

    fn encode_audio(&mut self, buffer: &AudioBuffer) -> Result<(), RecorderError> {
        self.ensure_open()?;
        let pcm = dsp::convert_to_int16_pcm(&buffer.samples);
        self.write_record(AUDIO_TAG, self.audio_position, &pcm);
        self.audio_position += buffer.duration();
        self.audio_records += 1;
        Ok(())
    }

    fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    fn finish(&mut self) -> Result<Vec<u8>, RecorderError> {
        self.ensure_open()?;
        self.buffer.push(END_TAG);
        self.buffer.extend_from_slice(&self.video_records.to_le_bytes());
        self.buffer.extend_from_slice(&self.audio_records.to_le_bytes());
        self.finished = true;
        log::debug!(
            "Framed encoder finished: {} video, {} audio records",
            self.video_records,
            self.audio_records
        );
        Ok(self.take_output())
    }
}

/// Builds `FramedEncoder`s for video + audio track sets in the recorder's format.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramedEncoderFactory;

impl EncoderFactory for FramedEncoderFactory {
    fn create(
        &self,
        tracks: &TrackSet,
        format: &OutputFormat,
    ) -> Result<Box<dyn MediaEncoder>, RecorderError> {
        if *format != OutputFormat::WEBM_VP8_OPUS {
            return Err(RecorderError::UnsupportedFormat(format.mime_type.to_string()));
        }
        if tracks.video.kind != TrackKind::Video || !tracks.audio.has_audio() {
            return Err(RecorderError::UnsupportedFormat(format!(
                "{} needs one video and one audio track",
                format.mime_type
            )));
        }
        Ok(Box::new(FramedEncoder::new(format)))
    }
}
