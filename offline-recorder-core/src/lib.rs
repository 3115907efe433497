//! # offline-recorder-core
//!
//! Platform-agnostic screen recording core.
//!
//! Captures a display plus a mixed audio track (system audio and a chosen
//! microphone), encodes it into ordered segments and assembles a playable
//! artifact, all offline. Platform backends implement `MediaDevices`,
//! `MediaTrack` and `EncoderFactory` and plug into the generic
//! `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! offline-recorder-core (this crate)
//! ├── traits/      ← MediaDevices, MediaTrack, EncoderFactory, SessionDelegate, Recorder, ArtifactStore
//! ├── models/      ← RecorderError, SessionState, RecorderConfiguration, devices, media, artifacts
//! ├── capture/     ← device catalog + alias resolution, display/mic acquisition
//! ├── processing/  ← AudioMixer, EncoderSink, DSP helpers
//! ├── session/     ← SessionController (state machine), CaptureSession (owned resources)
//! ├── playback/    ← chunk assembly into RecordedArtifact
//! └── storage/     ← DirectoryStore, metadata sidecars
//! ```

pub mod capture;
pub mod models;
pub mod playback;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use capture::catalog::DeviceCatalog;
pub use models::artifact::{Chunk, RecordedArtifact, RecordingMetadata};
pub use models::config::{
    AudioConstraints, DisplayConstraints, MicrophoneConstraints, MixGains, OutputFormat,
    RecorderConfiguration,
};
pub use models::device::{CaptureDevice, MediaDeviceInfo, MediaDeviceKind};
pub use models::error::RecorderError;
pub use models::media::{
    AudioBuffer, AudioLevels, TrackEvent, TrackInfo, TrackKind, TrackRole, VideoFrame,
};
pub use models::state::SessionState;
pub use playback::assembler::assemble;
pub use processing::audio_mixer::AudioMixer;
pub use processing::encoder_sink::EncoderSink;
pub use session::capture_session::{CaptureSession, HeldResources};
pub use session::controller::{SessionController, StopHandle};
pub use storage::directory_store::DirectoryStore;
pub use traits::artifact_store::ArtifactStore;
pub use traits::encoder::{EncoderFactory, MediaEncoder, TrackSet};
pub use traits::media_devices::{DisplayStream, MediaDevices, MediaTrack, TrackSink};
pub use traits::recorder::Recorder;
pub use traits::session_delegate::SessionDelegate;
