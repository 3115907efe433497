use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::capture::acquirer::DisplayCapture;
use crate::models::artifact::Chunk;
use crate::models::error::RecorderError;
use crate::models::media::{AudioBuffer, AudioLevels, TrackInfo, TrackRole, VideoFrame};
use crate::processing::audio_mixer::AudioMixer;
use crate::processing::encoder_sink::EncoderSink;
use crate::traits::media_devices::{MediaTrack, TrackSink};

/// Counts of resources a session still owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldResources {
    pub tracks: usize,
    pub graph: bool,
    pub encoder: bool,
}

impl HeldResources {
    pub fn is_empty(&self) -> bool {
        self.tracks == 0 && !self.graph && !self.encoder
    }
}

/// Everything one recording attempt acquired.
///
/// Built fresh by the controller for each `start()` and never reused. Every
/// handle is optional so a partially acquired session can be torn down the
/// same way as a complete one.
pub struct CaptureSession {
    id: String,
    generation: u64,
    video: Option<Box<dyn MediaTrack>>,
    system_audio: Option<Box<dyn MediaTrack>>,
    mic: Option<Box<dyn MediaTrack>>,
    mixer: Option<AudioMixer>,
    encoder: Option<EncoderSink>,
    chunks: Arc<Mutex<Vec<Chunk>>>,
    selected_device_id: Option<String>,
    resolved_device_id: Option<String>,
    started_at: Option<Instant>,
}

impl CaptureSession {
    pub fn new(generation: u64, selected_device_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generation,
            video: None,
            system_audio: None,
            mic: None,
            mixer: None,
            encoder: None,
            chunks: Arc::new(Mutex::new(Vec::new())),
            selected_device_id,
            resolved_device_id: None,
            started_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device_id.as_deref()
    }

    /// Device id actually requested from the platform, after alias resolution.
    pub fn resolved_device_id(&self) -> Option<&str> {
        self.resolved_device_id.as_deref()
    }

    pub fn attach_display(&mut self, display: DisplayCapture) {
        self.video = Some(display.video);
        self.system_audio = display.system_audio;
    }

    pub fn attach_microphone(&mut self, track: Box<dyn MediaTrack>, resolved_device_id: Option<String>) {
        self.mic = Some(track);
        self.resolved_device_id = resolved_device_id;
    }

    pub fn install_mixer(&mut self, mixer: AudioMixer) {
        self.mixer = Some(mixer);
    }

    pub fn install_encoder(&mut self, encoder: EncoderSink) {
        self.encoder = Some(encoder);
    }

    pub fn video_info(&self) -> Option<&TrackInfo> {
        self.video.as_ref().map(|track| track.info())
    }

    pub fn system_audio_info(&self) -> Option<&TrackInfo> {
        self.system_audio.as_ref().map(|track| track.info())
    }

    pub fn mic_info(&self) -> Option<&TrackInfo> {
        self.mic.as_ref().map(|track| track.info())
    }

    /// The merged audio track, present while the mixer graph is alive.
    pub fn mixed_track(&self) -> Option<&TrackInfo> {
        self.mixer.as_ref().map(AudioMixer::output_track)
    }

    /// Shared buffer the encoder callback appends to.
    pub fn chunk_buffer(&self) -> Arc<Mutex<Vec<Chunk>>> {
        Arc::clone(&self.chunks)
    }

    /// Start every acquired track, giving each a sink for its role.
    pub fn start_tracks<S>(&mut self, mut sink_for: S) -> Result<(), RecorderError>
    where
        S: FnMut(TrackRole) -> TrackSink,
    {
        let slots = [
            (TrackRole::Video, self.video.as_mut()),
            (TrackRole::SystemAudio, self.system_audio.as_mut()),
            (TrackRole::Microphone, self.mic.as_mut()),
        ];
        for (role, track) in slots {
            if let Some(track) = track {
                track.start(sink_for(role))?;
            }
        }
        Ok(())
    }

    pub fn mark_recording(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }

    pub fn feed_video(&mut self, frame: &VideoFrame) -> Result<(), RecorderError> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.push_video(frame),
            None => Ok(()),
        }
    }

    /// Push captured audio into the graph and render what it can straight
    /// into the encoder. Input queues only ever hold the lagging source.
    pub fn feed_audio(&mut self, role: TrackRole, buffer: &AudioBuffer) -> Result<(), RecorderError> {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.push(role, buffer);
        }
        self.flush_mixer()
    }

    pub fn mark_ended(&mut self, role: TrackRole) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.mark_ended(role);
        }
    }

    pub fn levels(&self) -> AudioLevels {
        self.mixer.as_ref().map(AudioMixer::levels).unwrap_or_default()
    }

    /// Move mixed audio into the encoder and emit a segment if one is due.
    pub fn pump(&mut self, now: Instant) -> Result<(), RecorderError> {
        self.flush_mixer()?;
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.tick(now);
        }
        Ok(())
    }

    /// Flush the mixer and the encoder tail into the chunk buffer.
    pub fn finish_encoding(&mut self) -> Result<(), RecorderError> {
        self.flush_mixer()?;
        match self.encoder.as_mut() {
            Some(encoder) => encoder.stop(),
            None => Ok(()),
        }
    }

    pub fn take_chunks(&self) -> Vec<Chunk> {
        std::mem::take(&mut *self.chunks.lock())
    }

    pub fn held_resources(&self) -> HeldResources {
        let tracks = [&self.video, &self.system_audio, &self.mic]
            .iter()
            .filter(|slot| slot.is_some())
            .count();
        HeldResources {
            tracks,
            graph: self.mixer.is_some(),
            encoder: self.encoder.is_some(),
        }
    }

    /// Release everything this session holds. Safe to call repeatedly.
    ///
    /// Order: mixer graph, audio tracks, video track, encoder.
    pub fn teardown(&mut self) {
        let held = self.held_resources();
        if held.is_empty() {
            return;
        }

        if let Some(mut mixer) = self.mixer.take() {
            if mixer.dropped_samples() > 0 {
                log::warn!(
                    "Session {} lost {} audio samples to mixer overflow",
                    self.id,
                    mixer.dropped_samples()
                );
            }
            mixer.close();
        }
        if let Some(mut track) = self.system_audio.take() {
            track.stop();
        }
        if let Some(mut track) = self.mic.take() {
            track.stop();
        }
        if let Some(mut track) = self.video.take() {
            track.stop();
        }
        if let Some(mut encoder) = self.encoder.take() {
            encoder.abort();
        }

        log::info!(
            "Session {} released {} tracks (graph: {}, encoder: {})",
            self.id,
            held.tracks,
            held.graph,
            held.encoder
        );
    }

    fn flush_mixer(&mut self) -> Result<(), RecorderError> {
        let (Some(mixer), Some(encoder)) = (self.mixer.as_mut(), self.encoder.as_mut()) else {
            return Ok(());
        };
        while let Some(mixed) = mixer.render() {
            encoder.push_audio(&mixed)?;
        }
        Ok(())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{MixGains, OutputFormat};
    use crate::models::media::TrackEvent;
    use crate::test_support::{FakeEncoderFactory, FakeTrack, ScriptedOutput, TrackProbe};
    use crate::traits::encoder::TrackSet;

    struct Fixture {
        session: CaptureSession,
        probes: Vec<TrackProbe>,
        output: ScriptedOutput,
    }

    fn recording_session(now: Instant) -> Fixture {
        let (video, video_probe) = FakeTrack::new(TrackInfo::video("Screen"));
        let (system, system_probe) = FakeTrack::new(TrackInfo::audio("Tab audio", 2, 44_100.0));
        let (mic, mic_probe) = FakeTrack::new(TrackInfo::audio("Headset", 1, 44_100.0));

        let mut session = CaptureSession::new(1, Some("default".into()));
        session.attach_display(DisplayCapture {
            video: Box::new(video),
            system_audio: Some(Box::new(system)),
        });
        session.attach_microphone(Box::new(mic), Some("dev1".into()));

        let mixer = AudioMixer::mix(
            session.system_audio_info(),
            session.mic_info().unwrap(),
            MixGains::POLICY,
            44_100.0,
        )
        .unwrap();
        let tracks = TrackSet {
            video: session.video_info().unwrap().clone(),
            audio: mixer.output_track().clone(),
        };
        session.install_mixer(mixer);

        let output = ScriptedOutput::default();
        let factory = FakeEncoderFactory::with_output(output.clone());
        let chunks = session.chunk_buffer();
        let encoder = EncoderSink::start(
            &factory,
            &tracks,
            &OutputFormat::WEBM_VP8_OPUS,
            Box::new(move |chunk: Chunk| chunks.lock().push(chunk)),
            Duration::from_millis(500),
            now,
        )
        .unwrap();
        session.install_encoder(encoder);
        session.mark_recording(now);

        Fixture {
            session,
            probes: vec![video_probe, system_probe, mic_probe],
            output,
        }
    }

    #[test]
    fn empty_session_holds_nothing() {
        let mut session = CaptureSession::new(3, None);
        assert!(session.held_resources().is_empty());
        assert!(session.mixed_track().is_none());
        session.teardown();
        assert_eq!(session.generation(), 3);
    }

    #[test]
    fn teardown_releases_each_track_once() {
        let Fixture {
            mut session,
            probes,
            output,
        } = recording_session(Instant::now());
        assert_eq!(
            session.held_resources(),
            HeldResources {
                tracks: 3,
                graph: true,
                encoder: true
            }
        );
        assert_eq!(output.encoders_alive(), 1);

        session.teardown();
        session.teardown();
        drop(session);

        for probe in &probes {
            assert_eq!(probe.stop_count(), 1);
        }
        assert_eq!(output.encoders_alive(), 0);
    }

    #[test]
    fn partial_session_tears_down() {
        let (video, probe) = FakeTrack::new(TrackInfo::video("Screen"));
        let mut session = CaptureSession::new(1, None);
        session.attach_display(DisplayCapture {
            video: Box::new(video),
            system_audio: None,
        });

        drop(session);
        assert_eq!(probe.stop_count(), 1);
    }

    #[test]
    fn started_tracks_deliver_to_role_sinks() {
        let Fixture {
            mut session,
            probes,
            ..
        } = recording_session(Instant::now());
        let seen = Arc::new(Mutex::new(Vec::new()));

        session
            .start_tracks(|role| {
                let seen = Arc::clone(&seen);
                let sink: TrackSink = Arc::new(move |_event: TrackEvent| seen.lock().push(role));
                sink
            })
            .unwrap();
        for probe in &probes {
            probe.emit(TrackEvent::Ended);
        }

        assert_eq!(
            *seen.lock(),
            [TrackRole::Video, TrackRole::SystemAudio, TrackRole::Microphone]
        );
    }

    #[test]
    fn pump_routes_mixed_audio_and_emits_segments() {
        let t0 = Instant::now();
        let Fixture {
            mut session,
            output,
            ..
        } = recording_session(t0);

        session
            .feed_audio(TrackRole::Microphone, &AudioBuffer::new(vec![0.25; 441], 44_100.0, 1))
            .unwrap();
        session
            .feed_audio(TrackRole::SystemAudio, &AudioBuffer::new(vec![0.5; 882], 44_100.0, 2))
            .unwrap();
        output.produce(64);
        session.pump(t0 + Duration::from_millis(500)).unwrap();

        assert_eq!(output.audio_frames(), 1);
        assert_eq!(session.take_chunks().len(), 1);
        assert!(session.levels().system_level > 0.0);
    }

    #[test]
    fn finish_encoding_flushes_tail() {
        let t0 = Instant::now();
        let Fixture {
            mut session,
            output,
            ..
        } = recording_session(t0);

        output.produce(32);
        session.finish_encoding().unwrap();

        let chunks = session.take_chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 32);
        assert_eq!(session.elapsed(t0 + Duration::from_secs(2)), Duration::from_secs(2));
    }
}
