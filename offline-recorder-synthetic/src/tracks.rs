//! Generated capture tracks.
//!
//! Each track produces media on a dedicated thread and delivers it through the
//! `TrackSink` it was started with.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use offline_recorder_core::models::error::RecorderError;
use offline_recorder_core::models::media::{AudioBuffer, TrackEvent, TrackInfo, VideoFrame};
use offline_recorder_core::traits::media_devices::{MediaTrack, TrackSink};

/// Audio block length delivered per callback.
const AUDIO_BLOCK: Duration = Duration::from_millis(20);

/// Capture thread plus its control flags.
struct CaptureWorker {
    running: Arc<AtomicBool>,
    ended: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CaptureWorker {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            ended: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    fn spawn<B>(&self, name: &str, body: B) -> Result<(), RecorderError>
    where
        B: FnOnce(&AtomicBool) + Send + 'static,
    {
        if self.ended.load(Ordering::SeqCst) {
            return Err(RecorderError::DeviceUnavailable);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RecorderError::ConfigurationFailed(format!(
                "{} already running",
                name
            )));
        }

        let running = Arc::clone(&self.running);
        let ended = Arc::clone(&self.ended);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body(&running);
                running.store(false, Ordering::SeqCst);
                ended.store(true, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                log::error!("Failed to spawn {}: {}", name, e);
                RecorderError::DeviceUnavailable
            })?;

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.ended.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
    }

    fn is_live(&self) -> bool {
        !self.ended.load(Ordering::SeqCst)
    }
}

/// Sleep in short steps so `stop()` is honoured promptly.
fn pace(running: &AtomicBool, interval: Duration) {
    let step = Duration::from_millis(5);
    let mut remaining = interval;
    while !remaining.is_zero() && running.load(Ordering::SeqCst) {
        let nap = remaining.min(step);
        thread::sleep(nap);
        remaining -= nap;
    }
}

/// Moving colour-bar video, standing in for a shared screen.
pub struct TestPatternTrack {
    info: TrackInfo,
    width: u32,
    height: u32,
    frame_interval: Duration,
    frame_limit: Option<u64>,
    worker: CaptureWorker,
}

impl TestPatternTrack {
    pub fn new(label: &str, width: u32, height: u32, frame_rate: u32, frame_limit: Option<u64>) -> Self {
        Self {
            info: TrackInfo::video(label),
            width,
            height,
            frame_interval: Duration::from_secs(1) / frame_rate.max(1),
            frame_limit,
            worker: CaptureWorker::new(),
        }
    }
}

impl MediaTrack for TestPatternTrack {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn start(&mut self, sink: TrackSink) -> Result<(), RecorderError> {
        let (width, height) = (self.width, self.height);
        let interval = self.frame_interval;
        let limit = self.frame_limit;

        self.worker.spawn("synthetic-video-capture", move |running| {
            let mut index = 0u64;
            while running.load(Ordering::SeqCst) {
                if limit.is_some_and(|limit| index >= limit) {
                    log::info!("Test pattern ended after {} frames", index);
                    sink(TrackEvent::Ended);
                    return;
                }
                sink(TrackEvent::Video(pattern_frame(width, height, index, interval)));
                index += 1;
                pace(running, interval);
            }
        })?;
        log::info!("Test pattern started ({}x{})", self.width, self.height);
        Ok(())
    }

    fn stop(&mut self) {
        self.worker.stop();
    }

    fn is_live(&self) -> bool {
        self.worker.is_live()
    }
}

fn pattern_frame(width: u32, height: u32, index: u64, interval: Duration) -> VideoFrame {
    let (w, h) = (width as usize, height as usize);
    let bar = (index as usize * 4) % w.max(1);
    let mut data = vec![0u8; w * h * 4];
    for (i, pixel) in data.chunks_exact_mut(4).enumerate() {
        let x = i % w;
        let shade = if x.abs_diff(bar) < 8 { 255 } else { (x * 255 / w.max(1)) as u8 };
        pixel.copy_from_slice(&[shade, (index % 256) as u8, 255 - shade, 255]);
    }
    VideoFrame {
        width,
        height,
        timestamp: interval * index as u32,
        data,
    }
}

/// Sine tone, standing in for system audio or a microphone.
pub struct ToneTrack {
    info: TrackInfo,
    frequency: f32,
    amplitude: f32,
    worker: CaptureWorker,
}

impl ToneTrack {
    pub fn new(label: &str, channels: u16, sample_rate: f64, frequency: f32, amplitude: f32) -> Self {
        Self {
            info: TrackInfo::audio(label, channels, sample_rate),
            frequency,
            amplitude,
            worker: CaptureWorker::new(),
        }
    }
}

impl MediaTrack for ToneTrack {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn start(&mut self, sink: TrackSink) -> Result<(), RecorderError> {
        let channels = self.info.channel_count;
        let sample_rate = self.info.sample_rate;
        let (frequency, amplitude) = (self.frequency, self.amplitude);

        self.worker.spawn("synthetic-audio-capture", move |running| {
            let mut generator = ToneGenerator::new(frequency, amplitude, sample_rate);
            let frames = (sample_rate * AUDIO_BLOCK.as_secs_f64()).round() as usize;
            while running.load(Ordering::SeqCst) {
                let samples = generator.block(frames, channels as usize);
                sink(TrackEvent::Audio(AudioBuffer::new(samples, sample_rate, channels)));
                pace(running, AUDIO_BLOCK);
            }
        })?;
        log::info!(
            "Tone '{}' started ({} Hz, {} ch @ {} Hz)",
            self.info.label,
            self.frequency,
            channels,
            sample_rate
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.worker.stop();
    }

    fn is_live(&self) -> bool {
        self.worker.is_live()
    }
}

/// Phase-continuous sine generator.
struct ToneGenerator {
    step: f32,
    amplitude: f32,
    phase: f32,
}

impl ToneGenerator {
    fn new(frequency: f32, amplitude: f32, sample_rate: f64) -> Self {
        Self {
            step: TAU * frequency / sample_rate as f32,
            amplitude,
            phase: 0.0,
        }
    }

    /// `frames` frames of interleaved audio, the same signal on every channel.
    fn block(&mut self, frames: usize, channels: usize) -> Vec<f32> {
        let mut samples = Vec::with_capacity(frames * channels);
        for _ in 0..frames {
            let value = self.phase.sin() * self.amplitude;
            samples.extend(std::iter::repeat(value).take(channels));
            self.phase = (self.phase + self.step) % TAU;
        }
        samples
    }
}
