//! In-crate fakes for the platform traits.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{DisplayConstraints, MicrophoneConstraints, OutputFormat};
use crate::models::device::{MediaDeviceInfo, MediaDeviceKind};
use crate::models::error::RecorderError;
use crate::models::media::{AudioBuffer, TrackEvent, TrackInfo, VideoFrame};
use crate::traits::encoder::{EncoderFactory, MediaEncoder, TrackSet};
use crate::traits::media_devices::{DisplayStream, MediaDevices, MediaTrack, TrackSink};

#[derive(Default)]
struct ProbeState {
    stops: AtomicUsize,
    live: AtomicBool,
    sink: Mutex<Option<TrackSink>>,
}

/// Test-side view of a `FakeTrack` after it was handed to the code under test.
#[derive(Clone)]
pub(crate) struct TrackProbe {
    state: Arc<ProbeState>,
}

impl TrackProbe {
    pub fn stop_count(&self) -> usize {
        self.state.stops.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.state.sink.lock().is_some()
    }

    /// The sink the track was started with, kept alive past `stop()`.
    pub fn sink(&self) -> Option<TrackSink> {
        self.state.sink.lock().clone()
    }

    /// Deliver an event as the capture backend would.
    pub fn emit(&self, event: TrackEvent) {
        let sink = self.state.sink.lock().clone();
        if let Some(sink) = sink {
            sink(event);
        }
    }
}

pub(crate) struct FakeTrack {
    info: TrackInfo,
    state: Arc<ProbeState>,
}

impl FakeTrack {
    pub fn new(info: TrackInfo) -> (Self, TrackProbe) {
        let state = Arc::new(ProbeState::default());
        state.live.store(true, Ordering::SeqCst);
        let probe = TrackProbe {
            state: Arc::clone(&state),
        };
        (Self { info, state }, probe)
    }
}

impl MediaTrack for FakeTrack {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn start(&mut self, sink: TrackSink) -> Result<(), RecorderError> {
        *self.state.sink.lock() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        self.state.live.store(false, Ordering::SeqCst);
        self.state.sink.lock().take();
    }

    fn is_live(&self) -> bool {
        self.state.live.load(Ordering::SeqCst)
    }
}

/// How the fake display picker answers.
#[derive(Debug, Clone)]
pub(crate) enum DisplayOutcome {
    Share { system_audio_channels: Option<u16> },
    Fail(RecorderError),
}

/// Everything the fake platform handed out, for assertions.
#[derive(Default)]
pub(crate) struct Recorded {
    pub video: Vec<TrackProbe>,
    pub system_audio: Vec<TrackProbe>,
    pub mic: Vec<TrackProbe>,
    pub mic_requests: Vec<MicrophoneConstraints>,
}

impl Recorded {
    pub fn all_probes(&self) -> Vec<TrackProbe> {
        self.video
            .iter()
            .chain(&self.system_audio)
            .chain(&self.mic)
            .cloned()
            .collect()
    }
}

pub(crate) struct FakeMediaDevices {
    pub devices: Vec<MediaDeviceInfo>,
    pub permission_granted: bool,
    pub display: DisplayOutcome,
    pub mic_error: Option<RecorderError>,
    pub recorded: Arc<Mutex<Recorded>>,
    /// Runs while the display picker is "open".
    pub on_display_request: Option<Box<dyn FnMut() + Send>>,
}

pub(crate) fn audio_input(id: &str, label: &str) -> MediaDeviceInfo {
    MediaDeviceInfo {
        id: id.to_string(),
        group_id: "group-1".to_string(),
        kind: MediaDeviceKind::AudioInput,
        label: label.to_string(),
    }
}

impl FakeMediaDevices {
    /// Permission granted, display shared with stereo tab audio.
    pub fn granted() -> Self {
        Self {
            devices: vec![
                audio_input("default", "Default - Headset"),
                audio_input("communications", "Communications - Headset"),
                audio_input("dev2", "Built-in Microphone"),
                audio_input("dev1", "Headset"),
                MediaDeviceInfo {
                    id: "out1".into(),
                    group_id: "group-1".into(),
                    kind: MediaDeviceKind::AudioOutput,
                    label: "Headset".into(),
                },
            ],
            permission_granted: true,
            display: DisplayOutcome::Share {
                system_audio_channels: Some(2),
            },
            mic_error: None,
            recorded: Arc::new(Mutex::new(Recorded::default())),
            on_display_request: None,
        }
    }

    pub fn without_permission() -> Self {
        Self {
            permission_granted: false,
            ..Self::granted()
        }
    }

    pub fn without_system_audio() -> Self {
        Self {
            display: DisplayOutcome::Share {
                system_audio_channels: None,
            },
            ..Self::granted()
        }
    }
}

impl MediaDevices for FakeMediaDevices {
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, RecorderError> {
        let granted = self.permission_granted;
        Ok(self
            .devices
            .iter()
            .cloned()
            .map(|mut device| {
                if !granted {
                    device.label.clear();
                }
                device
            })
            .collect())
    }

    fn get_display_media(
        &mut self,
        _constraints: &DisplayConstraints,
    ) -> Result<DisplayStream, RecorderError> {
        if let Some(hook) = self.on_display_request.as_mut() {
            hook();
        }
        let system_audio_channels = match &self.display {
            DisplayOutcome::Share {
                system_audio_channels,
            } => *system_audio_channels,
            DisplayOutcome::Fail(err) => return Err(err.clone()),
        };

        let mut recorded = self.recorded.lock();
        let (video, probe) = FakeTrack::new(TrackInfo::video("Entire screen"));
        recorded.video.push(probe);

        let audio = system_audio_channels.map(|channels| {
            let (track, probe) = FakeTrack::new(TrackInfo::audio("Tab audio", channels, 48_000.0));
            recorded.system_audio.push(probe);
            Box::new(track) as Box<dyn MediaTrack>
        });

        Ok(DisplayStream {
            video: Some(Box::new(video)),
            audio,
        })
    }

    fn get_user_media(
        &mut self,
        constraints: &MicrophoneConstraints,
    ) -> Result<Box<dyn MediaTrack>, RecorderError> {
        let mut recorded = self.recorded.lock();
        recorded.mic_requests.push(constraints.clone());
        if let Some(err) = &self.mic_error {
            return Err(err.clone());
        }
        self.permission_granted = true;

        let (track, probe) = FakeTrack::new(TrackInfo::audio(
            "Headset",
            1,
            constraints.audio.sample_rate,
        ));
        recorded.mic.push(probe);
        Ok(Box::new(track))
    }
}

/// Bytes the fake encoder will hand out on its next drain.
#[derive(Clone, Default)]
pub(crate) struct ScriptedOutput {
    pending: Arc<Mutex<Vec<u8>>>,
    video_frames: Arc<AtomicUsize>,
    audio_frames: Arc<AtomicUsize>,
    mixed_frames: Arc<AtomicUsize>,
    encoders_created: Arc<AtomicUsize>,
    encoders_dropped: Arc<AtomicUsize>,
}

impl ScriptedOutput {
    /// Queue `len` encoded bytes.
    pub fn produce(&self, len: usize) {
        let mut pending = self.pending.lock();
        let fill = (pending.len() % 251) as u8;
        pending.extend(std::iter::repeat(fill).take(len));
    }

    pub fn video_frames(&self) -> usize {
        self.video_frames.load(Ordering::SeqCst)
    }

    pub fn audio_frames(&self) -> usize {
        self.audio_frames.load(Ordering::SeqCst)
    }

    /// Total audio frames handed to the encoder.
    pub fn mixed_frames(&self) -> usize {
        self.mixed_frames.load(Ordering::SeqCst)
    }

    pub fn encoders_alive(&self) -> usize {
        self.encoders_created.load(Ordering::SeqCst) - self.encoders_dropped.load(Ordering::SeqCst)
    }
}

struct FakeEncoder {
    output: ScriptedOutput,
}

impl MediaEncoder for FakeEncoder {
    fn encode_video(&mut self, _frame: &VideoFrame) -> Result<(), RecorderError> {
        self.output.video_frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn encode_audio(&mut self, buffer: &AudioBuffer) -> Result<(), RecorderError> {
        self.output.audio_frames.fetch_add(1, Ordering::SeqCst);
        self.output
            .mixed_frames
            .fetch_add(buffer.frame_count(), Ordering::SeqCst);
        Ok(())
    }

    fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut *self.output.pending.lock())
    }

    fn finish(&mut self) -> Result<Vec<u8>, RecorderError> {
        Ok(self.take_output())
    }
}

impl Drop for FakeEncoder {
    fn drop(&mut self) {
        self.output.encoders_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakeEncoderFactory {
    output: Option<ScriptedOutput>,
}

impl FakeEncoderFactory {
    pub fn with_output(output: ScriptedOutput) -> Self {
        Self {
            output: Some(output),
        }
    }

    pub fn unsupported() -> Self {
        Self { output: None }
    }
}

impl EncoderFactory for FakeEncoderFactory {
    fn create(
        &self,
        _tracks: &TrackSet,
        format: &OutputFormat,
    ) -> Result<Box<dyn MediaEncoder>, RecorderError> {
        let Some(output) = &self.output else {
            return Err(RecorderError::UnsupportedFormat(format.mime_type.to_string()));
        };
        output.encoders_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEncoder {
            output: output.clone(),
        }))
    }
}
