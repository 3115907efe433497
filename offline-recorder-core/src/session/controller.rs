use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::acquirer;
use crate::capture::catalog::DeviceCatalog;
use crate::models::artifact::{Chunk, RecordedArtifact};
use crate::models::config::{MixGains, RecorderConfiguration};
use crate::models::device::CaptureDevice;
use crate::models::error::RecorderError;
use crate::models::media::{AudioLevels, TrackEvent, TrackRole};
use crate::models::state::SessionState;
use crate::playback::assembler;
use crate::processing::audio_mixer::AudioMixer;
use crate::processing::encoder_sink::{ChunkCallback, EncoderSink};
use crate::session::capture_session::{CaptureSession, HeldResources};
use crate::traits::encoder::{EncoderFactory, TrackSet};
use crate::traits::media_devices::{MediaDevices, TrackSink};
use crate::traits::recorder::Recorder;
use crate::traits::session_delegate::SessionDelegate;

/// Message posted into the controller's queue by capture backends and stop
/// handles.
enum SessionEvent {
    Track {
        generation: u64,
        role: TrackRole,
        event: TrackEvent,
    },
    StopRequested,
}

/// Cloneable handle that asks the controller to stop from any thread.
///
/// The request is honoured on the controller's next `poll()`, or right after
/// acquisition settles when posted during `start()`.
#[derive(Clone)]
pub struct StopHandle {
    tx: Sender<SessionEvent>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        if self.tx.send(SessionEvent::StopRequested).is_err() {
            log::debug!("Stop requested after the controller was dropped");
        }
    }
}

/// Recording session lifecycle.
///
/// Drives `idle → acquiring → mixing → recording → stopping → stopped` and
/// guarantees that every resource a session acquired is released exactly
/// once, whichever path ends it (user stop, video track ended, failure).
///
/// All state changes happen on the caller's thread inside `start`, `stop`
/// and `poll`. Backends only enqueue events.
///
/// ```text
/// [display video] ──────────────────────────────┐
/// [system audio] → [gain 0.8] ─┐                ├→ [EncoderSink] → chunks → assemble
/// [microphone]   → [gain 1.0] ─┴→ [mixed audio] ┘
/// ```
pub struct SessionController<P: MediaDevices, F: EncoderFactory> {
    media: P,
    encoders: F,
    config: RecorderConfiguration,
    catalog: DeviceCatalog,
    selected_device_id: Option<String>,
    state: SessionState,
    session: Option<CaptureSession>,
    artifact: Option<RecordedArtifact>,
    last_error: Option<RecorderError>,
    last_duration: Option<Duration>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    generation: u64,
}

impl<P: MediaDevices, F: EncoderFactory> SessionController<P, F> {
    pub fn new(media: P, encoders: F, config: RecorderConfiguration) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::ConfigurationFailed)?;
        let (events_tx, events_rx) = mpsc::channel();
        Ok(Self {
            media,
            encoders,
            config,
            catalog: DeviceCatalog::new(),
            selected_device_id: None,
            state: SessionState::Idle,
            session: None,
            artifact: None,
            last_error: None,
            last_duration: None,
            delegate: None,
            events_tx,
            events_rx,
            generation: 0,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    pub fn media_mut(&mut self) -> &mut P {
        &mut self.media
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.events_tx.clone(),
        }
    }

    // ---- Devices ----

    /// Re-enumerate audio inputs.
    pub fn refresh_devices(&mut self) -> Result<Vec<CaptureDevice>, RecorderError> {
        self.catalog.refresh(&mut self.media).map(|devices| devices.to_vec())
    }

    /// Prompt for microphone access, then refresh the device list.
    pub fn grant_permission(&mut self) -> Result<Vec<CaptureDevice>, RecorderError> {
        acquirer::request_permission(&mut self.media, &self.config.microphone)?;
        self.refresh_devices()
    }

    pub fn devices(&self) -> &[CaptureDevice] {
        self.catalog.devices()
    }

    /// Whether the device list is hidden until permission is granted.
    pub fn needs_permission(&self) -> bool {
        self.catalog.needs_permission()
    }

    pub fn select_device(&mut self, device_id: Option<String>) {
        if let Some(id) = device_id.as_deref() {
            if self.catalog.find(id).is_none() {
                log::warn!("Selected device '{}' is not in the current device list", id);
            }
        }
        log::info!("Selected microphone: {}", device_id.as_deref().unwrap_or("platform default"));
        self.selected_device_id = device_id;
    }

    pub fn selected_device(&self) -> Option<&str> {
        self.selected_device_id.as_deref()
    }

    // ---- Observables ----

    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    pub fn artifact(&self) -> Option<&RecordedArtifact> {
        self.artifact.as_ref()
    }

    pub fn last_error(&self) -> Option<&RecorderError> {
        self.last_error.as_ref()
    }

    pub fn levels(&self) -> AudioLevels {
        self.session
            .as_ref()
            .map(CaptureSession::levels)
            .unwrap_or_default()
    }

    pub fn held_resources(&self) -> HeldResources {
        self.session
            .as_ref()
            .map(CaptureSession::held_resources)
            .unwrap_or_default()
    }

    /// Duration of the last completed recording.
    pub fn last_recording_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    // ---- Lifecycle ----

    pub fn start(&mut self) -> Result<(), RecorderError> {
        self.start_at(Instant::now())
    }

    /// Start a recording with `now` as the segment clock origin.
    ///
    /// Transitions: idle/stopped → acquiring → mixing → recording. Any failure
    /// releases what was acquired and returns to idle.
    pub fn start_at(&mut self, now: Instant) -> Result<(), RecorderError> {
        if !self.state.can_start() {
            log::warn!("Rejected start while {}", self.state.name());
            return Err(RecorderError::SessionBusy(self.state.name().to_string()));
        }

        if let Some(previous) = self.artifact.take() {
            previous.revoke();
        }
        self.discard_queued_events();
        self.last_error = None;
        self.generation += 1;

        let mut session = CaptureSession::new(self.generation, self.selected_device_id.clone());
        log::info!("Starting session {} (generation {})", session.id(), self.generation);
        self.set_state(SessionState::Acquiring);

        if let Err(err) = self.bring_up(&mut session, now) {
            session.teardown();
            self.fail(err.clone());
            return Err(err);
        }

        session.mark_recording(now);
        self.session = Some(session);
        self.set_state(SessionState::Recording);

        match self.process_events() {
            Ok(true) => {
                log::info!("Honouring stop requested during acquisition");
                self.stop_at(now).map(|_| ())
            }
            Ok(false) => Ok(()),
            Err(err) => {
                self.abort_session(err.clone());
                Err(err)
            }
        }
    }

    pub fn stop(&mut self) -> Result<Option<RecordedArtifact>, RecorderError> {
        self.stop_at(Instant::now())
    }

    /// Stop the recording and assemble the artifact.
    ///
    /// A no-op returning `Ok(None)` unless recording.
    pub fn stop_at(&mut self, now: Instant) -> Result<Option<RecordedArtifact>, RecorderError> {
        if !self.state.is_recording() {
            log::debug!("Ignoring stop while {}", self.state.name());
            return Ok(None);
        }

        if let Err(err) = self.process_events() {
            self.abort_session(err.clone());
            return Err(err);
        }
        self.set_state(SessionState::Stopping);

        let Some(mut session) = self.session.take() else {
            self.set_state(SessionState::Idle);
            return Ok(None);
        };
        if let Err(err) = session.finish_encoding() {
            session.teardown();
            self.fail(err.clone());
            return Err(err);
        }
        let duration = session.elapsed(now);
        session.teardown();

        let chunks = session.take_chunks();
        let artifact = assembler::assemble(&chunks, self.config.output_format().mime_type);
        log::info!(
            "Recording {} finished: {} chunks, {} bytes, {:.1}s",
            session.id(),
            chunks.len(),
            artifact.len(),
            duration.as_secs_f64()
        );

        self.last_duration = Some(duration);
        self.artifact = Some(artifact.clone());
        self.set_state(SessionState::Stopped);
        if let Some(delegate) = &self.delegate {
            delegate.on_artifact_ready(&artifact);
        }
        Ok(Some(artifact))
    }

    pub fn poll(&mut self) -> Result<Option<RecordedArtifact>, RecorderError> {
        self.poll_at(Instant::now())
    }

    /// Consume queued events, feed the mixer and encoder, emit due segments.
    ///
    /// Returns the artifact when the session stopped during this poll (video
    /// track ended or a stop was requested).
    pub fn poll_at(&mut self, now: Instant) -> Result<Option<RecordedArtifact>, RecorderError> {
        let pumped = self.process_events().and_then(|stop_wanted| {
            if let Some(session) = self.session.as_mut() {
                session.pump(now)?;
            }
            Ok(stop_wanted)
        });

        match pumped {
            Ok(true) => self.stop_at(now),
            Ok(false) => Ok(None),
            Err(err) => {
                self.abort_session(err.clone());
                Err(err)
            }
        }
    }

    // ---- Internals ----

    fn bring_up(&mut self, session: &mut CaptureSession, now: Instant) -> Result<(), RecorderError> {
        let display = acquirer::acquire_display(&mut self.media, &self.config.display)?;
        session.attach_display(display);

        let device_id = self
            .selected_device_id
            .as_deref()
            .map(|id| self.catalog.resolve(id));
        let mic = acquirer::acquire_microphone(
            &mut self.media,
            device_id.as_deref(),
            &self.config.microphone,
        )?;
        session.attach_microphone(mic, device_id);

        self.set_state(SessionState::Mixing);
        let mixer = {
            let mic = session.mic_info().ok_or(RecorderError::DeviceUnavailable)?;
            AudioMixer::mix(
                session.system_audio_info(),
                mic,
                MixGains::POLICY,
                self.config.output_sample_rate,
            )?
        };
        let video = session
            .video_info()
            .cloned()
            .ok_or(RecorderError::NoSourceSelected)?;
        let tracks = TrackSet {
            video,
            audio: mixer.output_track().clone(),
        };
        session.install_mixer(mixer);

        let chunks = session.chunk_buffer();
        let delegate = self.delegate.clone();
        let on_chunk: ChunkCallback = Box::new(move |chunk: Chunk| {
            if let Some(delegate) = &delegate {
                delegate.on_chunk(&chunk);
            }
            chunks.lock().push(chunk);
        });
        let encoder = EncoderSink::start(
            &self.encoders,
            &tracks,
            &self.config.output_format(),
            on_chunk,
            self.config.timeslice,
            now,
        )?;
        session.install_encoder(encoder);

        let generation = self.generation;
        let tx = self.events_tx.clone();
        session.start_tracks(|role| {
            let tx = tx.clone();
            let sink: TrackSink = Arc::new(move |event: TrackEvent| {
                let _ = tx.send(SessionEvent::Track {
                    generation,
                    role,
                    event,
                });
            });
            sink
        })
    }

    /// Drain the queue into the current session. Returns whether a stop is due.
    fn process_events(&mut self) -> Result<bool, RecorderError> {
        let mut stop_wanted = false;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                SessionEvent::StopRequested => stop_wanted = true,
                SessionEvent::Track {
                    generation,
                    role,
                    event,
                } => {
                    if generation != self.generation {
                        log::debug!("Dropping {:?} event from stale generation {}", role, generation);
                        continue;
                    }
                    let Some(session) = self.session.as_mut() else {
                        continue;
                    };
                    match event {
                        TrackEvent::Video(frame) => session.feed_video(&frame)?,
                        TrackEvent::Audio(buffer) => session.feed_audio(role, &buffer)?,
                        TrackEvent::Ended if role == TrackRole::Video => {
                            log::info!("Video track ended; stopping session {}", session.id());
                            stop_wanted = true;
                        }
                        TrackEvent::Ended => session.mark_ended(role),
                    }
                }
            }
        }
        Ok(stop_wanted)
    }

    fn discard_queued_events(&mut self) {
        let mut discarded = 0usize;
        while self.events_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            log::debug!("Discarded {} queued events from a previous session", discarded);
        }
    }

    fn abort_session(&mut self, err: RecorderError) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        self.fail(err);
    }

    /// Report `err` and settle in idle. The session must already be released.
    fn fail(&mut self, err: RecorderError) {
        log::error!("Recording failed: {} ({})", err, err.hint());
        self.set_state(SessionState::Error(err.clone()));
        if let Some(delegate) = &self.delegate {
            delegate.on_error(&err);
        }
        self.last_error = Some(err);
        self.set_state(SessionState::Idle);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        log::debug!("Session state: {} → {}", self.state.name(), state.name());
        self.state = state;
        if let Some(delegate) = &self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }
}

impl<P: MediaDevices, F: EncoderFactory> Recorder for SessionController<P, F> {
    fn grant_permission(&mut self) -> Result<Vec<CaptureDevice>, RecorderError> {
        SessionController::grant_permission(self)
    }

    fn select_device(&mut self, device_id: Option<String>) {
        SessionController::select_device(self, device_id)
    }

    fn start(&mut self) -> Result<(), RecorderError> {
        SessionController::start(self)
    }

    fn stop(&mut self) -> Result<Option<RecordedArtifact>, RecorderError> {
        SessionController::stop(self)
    }

    fn state(&self) -> SessionState {
        SessionController::state(self)
    }

    fn artifact(&self) -> Option<&RecordedArtifact> {
        SessionController::artifact(self)
    }
}

impl<P: MediaDevices, F: EncoderFactory> Drop for SessionController<P, F> {
    fn drop(&mut self) {
        if self.state.is_active() {
            log::warn!("Recorder dropped while {}; releasing capture", self.state.name());
        }
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        if let Some(artifact) = self.artifact.take() {
            artifact.revoke();
        }
    }
}
