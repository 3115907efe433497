use std::sync::Arc;

use crate::models::config::{DisplayConstraints, MicrophoneConstraints};
use crate::models::device::MediaDeviceInfo;
use crate::models::error::RecorderError;
use crate::models::media::{TrackEvent, TrackInfo};

/// Callback invoked by a started track for every frame and for end-of-track.
///
/// May fire on a backend capture thread. Keep processing minimal: the
/// session controller only enqueues the event.
pub type TrackSink = Arc<dyn Fn(TrackEvent) + Send + Sync + 'static>;

/// A live capture track handed out by the platform.
///
/// Implementations own the underlying capture resource and must release it in
/// `stop()`. `stop()` must be safe to call more than once.
pub trait MediaTrack: Send {
    fn info(&self) -> &TrackInfo;

    /// Begin delivering frames to `sink`.
    fn start(&mut self, sink: TrackSink) -> Result<(), RecorderError>;

    /// Stop capturing and release the underlying resource.
    fn stop(&mut self);

    /// Whether the track is still producing media.
    fn is_live(&self) -> bool;
}

/// Tracks granted by a display capture request.
pub struct DisplayStream {
    pub video: Option<Box<dyn MediaTrack>>,
    /// Present only when the user chose to share system/tab audio.
    pub audio: Option<Box<dyn MediaTrack>>,
}

/// Platform capture surface (screen picker, microphones, enumeration).
///
/// Implemented by:
/// - `SyntheticMediaDevices` (generated test media)
/// - test fakes inside this crate
pub trait MediaDevices: Send {
    /// List every media device in platform order.
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, RecorderError>;

    /// Ask the user to pick a screen, window or tab.
    fn get_display_media(
        &mut self,
        constraints: &DisplayConstraints,
    ) -> Result<DisplayStream, RecorderError>;

    /// Open a microphone.
    fn get_user_media(
        &mut self,
        constraints: &MicrophoneConstraints,
    ) -> Result<Box<dyn MediaTrack>, RecorderError>;
}
