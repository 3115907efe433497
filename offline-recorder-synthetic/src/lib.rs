//! # offline-recorder-synthetic
//!
//! Synthetic capture backend for offline-recorder.
//!
//! Provides:
//! - `SyntheticMediaDevices`: enumeration, display picker and microphone
//!   stand-ins with configurable user behaviour (cancel, deny, no audio)
//! - `TestPatternTrack` / `ToneTrack`: generated media on capture threads
//! - `FramedEncoderFactory`: a framed stand-in container for the recorder's
//!   output format
//!
//! ## Usage
//! ```ignore
//! use offline_recorder_core::{RecorderConfiguration, SessionController};
//! use offline_recorder_synthetic::{FramedEncoderFactory, SyntheticMediaDevices, SyntheticOptions};
//!
//! let media = SyntheticMediaDevices::new(SyntheticOptions::default());
//! let mut controller =
//!     SessionController::new(media, FramedEncoderFactory, RecorderConfiguration::default())?;
//! controller.start()?;
//! ```

pub mod devices;
pub mod encoder;
pub mod tracks;

pub use devices::{SyntheticMediaDevices, SyntheticOptions};
pub use encoder::{FramedEncoder, FramedEncoderFactory};
pub use tracks::{TestPatternTrack, ToneTrack};
