use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Which slot of a capture session a track occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Video,
    SystemAudio,
    Microphone,
}

/// Static description of a live track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    /// Audio channels carried by the track. Zero for video, and for audio
    /// tracks that were granted without any channel.
    pub channel_count: u16,
    /// Audio sample rate in Hz, zero for video.
    pub sample_rate: f64,
}

impl TrackInfo {
    pub fn video(label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: TrackKind::Video,
            label: label.into(),
            channel_count: 0,
            sample_rate: 0.0,
        }
    }

    pub fn audio(label: impl Into<String>, channel_count: u16, sample_rate: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: TrackKind::Audio,
            label: label.into(),
            channel_count,
            sample_rate,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.kind == TrackKind::Audio && self.channel_count > 0
    }
}

/// A block of interleaved `f32` audio samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: f64,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: f64, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate)
    }
}

/// One captured video frame (packed RGBA).
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Presentation time relative to the start of the track.
    pub timestamp: Duration,
    pub data: Vec<u8>,
}

/// Notification delivered by a started track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    Video(VideoFrame),
    Audio(AudioBuffer),
    /// The source went away (e.g. the user ended sharing from the OS chrome).
    Ended,
}

/// Real-time audio level metering (RMS and peak, 0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AudioLevels {
    pub mic_level: f32,
    pub system_level: f32,
    pub peak_mic_level: f32,
    pub peak_system_level: f32,
}
