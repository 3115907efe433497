use std::collections::VecDeque;

use crate::models::config::MixGains;
use crate::models::error::RecorderError;
use crate::models::media::{AudioBuffer, AudioLevels, TrackInfo, TrackRole};
use crate::processing::dsp::{self, Resampler};

/// Seconds of audio each input node can hold before dropping the oldest.
const NODE_BUFFER_SECS: f64 = 5.0;

/// Channel layout of the mixed output track.
const OUTPUT_CHANNELS: u16 = 2;

/// One gain-controlled input of the graph.
///
/// Conditions incoming buffers to the graph rate (mono for the microphone,
/// interleaved stereo for system audio) and queues them until rendered. The
/// queue is bounded; overflow drops the oldest whole frames and is counted.
#[derive(Debug)]
struct GainNode {
    source_track_id: String,
    gain: f32,
    resampler: Resampler,
    queue: VecDeque<f32>,
    capacity: usize,
    dropped: u64,
    live: bool,
}

impl GainNode {
    fn new(source: &TrackInfo, gain: f32, channels: usize, sample_rate: f64) -> Self {
        let capacity = ((sample_rate * NODE_BUFFER_SECS) as usize).max(1) * channels;
        Self {
            source_track_id: source.id.clone(),
            gain,
            resampler: Resampler::new(channels, sample_rate),
            queue: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            live: true,
        }
    }

    fn channels(&self) -> usize {
        self.resampler.channels()
    }

    fn frames_available(&self) -> usize {
        self.queue.len() / self.channels()
    }

    /// Resample `samples` and queue them. Returns the samples dropped to make room.
    fn enqueue(&mut self, samples: &[f32], source_rate: f64) -> Vec<f32> {
        let conditioned = self.resampler.process(samples, source_rate);
        self.queue.extend(&conditioned);

        let overflow = self.queue.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.queue.drain(..overflow);
            self.dropped += overflow as u64;
            log::warn!(
                "Mixer input {} overflowed; dropped {} samples ({} total)",
                self.source_track_id,
                overflow,
                self.dropped
            );
        }
        conditioned
    }

    /// Dequeue exactly `frames` frames, padding with silence when short.
    fn dequeue_padded(&mut self, frames: usize) -> Vec<f32> {
        let count = frames * self.channels();
        let available = count.min(self.queue.len());
        let mut samples: Vec<f32> = self.queue.drain(..available).collect();
        samples.resize(count, 0.0);
        samples
    }

    fn disconnect(&mut self) {
        self.queue.clear();
        self.resampler.reset();
        self.live = false;
    }
}

/// Real-time signal graph summing system audio and microphone into one track.
///
/// ```text
/// [system track] → [gain 0.8] ─┐
///                              ├→ [destination] → mixed audio track (stereo)
/// [mic track]    → [gain 1.0] ─┘
/// ```
///
/// System audio drives timing while it is live; once it ends the microphone
/// takes over. The source that lags is padded with silence.
#[derive(Debug)]
pub struct AudioMixer {
    sample_rate: f64,
    system: GainNode,
    mic: GainNode,
    output: TrackInfo,
    levels: AudioLevels,
    rendered_frames: u64,
    closed: bool,
}

impl AudioMixer {
    /// Build the graph for `system` + `mic` and return it with its output track.
    ///
    /// Fails with `NoAudioTrack` when the display capture carries no audio
    /// channel (the user did not enable audio sharing), and with
    /// `DeviceUnavailable` when the microphone track carries none.
    pub fn mix(
        system: Option<&TrackInfo>,
        mic: &TrackInfo,
        gains: MixGains,
        sample_rate: f64,
    ) -> Result<Self, RecorderError> {
        let system = match system {
            Some(track) if track.has_audio() => track,
            _ => return Err(RecorderError::NoAudioTrack),
        };
        if !mic.has_audio() {
            return Err(RecorderError::DeviceUnavailable);
        }
        if sample_rate <= 0.0 {
            return Err(RecorderError::ConfigurationFailed(
                "mixer sample rate must be positive".into(),
            ));
        }

        let output = TrackInfo::audio("Mixed audio", OUTPUT_CHANNELS, sample_rate);
        log::info!(
            "Mixing '{}' (gain {}) with '{}' (gain {}) at {} Hz",
            system.label,
            gains.system,
            mic.label,
            gains.mic,
            sample_rate
        );

        Ok(Self {
            sample_rate,
            system: GainNode::new(system, gains.system, 2, sample_rate),
            mic: GainNode::new(mic, gains.mic, 1, sample_rate),
            output,
            levels: AudioLevels::default(),
            rendered_frames: 0,
            closed: false,
        })
    }

    /// The mixed audio track produced by the destination node.
    pub fn output_track(&self) -> &TrackInfo {
        &self.output
    }

    pub fn levels(&self) -> AudioLevels {
        self.levels
    }

    pub fn rendered_frames(&self) -> u64 {
        self.rendered_frames
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Feed a buffer captured by the source in `role`.
    pub fn push(&mut self, role: TrackRole, buffer: &AudioBuffer) {
        if self.closed || buffer.channels == 0 {
            return;
        }
        let channels = buffer.channels as usize;
        match role {
            TrackRole::SystemAudio => {
                let stereo = dsp::to_stereo(&buffer.samples, channels);
                let conditioned = self.system.enqueue(&stereo, buffer.sample_rate);
                let left: Vec<f32> = conditioned.iter().step_by(2).copied().collect();
                self.levels.system_level = dsp::rms_level(&left);
                self.levels.peak_system_level = dsp::peak_level(&left);
            }
            TrackRole::Microphone => {
                let mono = dsp::downmix_to_mono(&buffer.samples, channels);
                let conditioned = self.mic.enqueue(&mono, buffer.sample_rate);
                self.levels.mic_level = dsp::rms_level(&conditioned);
                self.levels.peak_mic_level = dsp::peak_level(&conditioned);
            }
            TrackRole::Video => {}
        }
    }

    /// Samples discarded across both inputs because they were not rendered in time.
    pub fn dropped_samples(&self) -> u64 {
        self.system.dropped + self.mic.dropped
    }

    /// Mark a source as ended; the graph keeps mixing the remaining one.
    pub fn mark_ended(&mut self, role: TrackRole) {
        let node = match role {
            TrackRole::SystemAudio => &mut self.system,
            TrackRole::Microphone => &mut self.mic,
            TrackRole::Video => return,
        };
        if node.live {
            log::info!("Mixer input {} ended", node.source_track_id);
            node.live = false;
        }
    }

    /// Render every frame the clock source has buffered.
    ///
    /// Output: `L = gs·sysL + gm·mic`, `R = gs·sysR + gm·mic`.
    pub fn render(&mut self) -> Option<AudioBuffer> {
        if self.closed {
            return None;
        }

        let frames = if self.system.live {
            self.system.frames_available()
        } else {
            self.mic.frames_available()
        };
        if frames == 0 {
            return None;
        }

        let system = self.system.dequeue_padded(frames);
        let mic = self.mic.dequeue_padded(frames);
        let (gs, gm) = (self.system.gain, self.mic.gain);

        let mut mixed = vec![0.0f32; frames * 2];
        for i in 0..frames {
            let voice = mic[i] * gm;
            mixed[i * 2] = system[i * 2] * gs + voice;
            mixed[i * 2 + 1] = system[i * 2 + 1] * gs + voice;
        }
        self.rendered_frames += frames as u64;

        Some(AudioBuffer::new(mixed, self.sample_rate, OUTPUT_CHANNELS))
    }

    /// Disconnect every node and close the graph. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.system.disconnect();
        self.mic.disconnect();
        self.closed = true;
        log::debug!(
            "Closed mixer graph for {} after {} frames ({} samples dropped)",
            self.output.id,
            self.rendered_frames,
            self.dropped_samples()
        );
    }
}

impl Drop for AudioMixer {
    fn drop(&mut self) {
        self.close();
    }
}
