//! Pure-math sample conditioning used by the mixer graph and encoders.
//!
//! All functions work on interleaved `&[f32]` buffers with no platform
//! dependencies.

/// Average interleaved multi-channel audio down to mono.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Reduce interleaved audio with any channel count to interleaved stereo.
///
/// Mono is duplicated to both sides; surround layouts keep front left/right.
pub fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => interleave(samples, samples),
        2 => samples.to_vec(),
        n => samples
            .chunks_exact(n)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

/// Interleave two mono channels into stereo `[L0, R0, L1, R1, ...]`.
///
/// The shorter side is padded with silence.
pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
    let frame_count = left.len().max(right.len());
    let mut stereo = vec![0.0f32; frame_count * 2];
    for i in 0..frame_count {
        stereo[i * 2] = left.get(i).copied().unwrap_or(0.0);
        stereo[i * 2 + 1] = right.get(i).copied().unwrap_or(0.0);
    }
    stereo
}

/// Streaming linear-interpolation resampler for interleaved audio.
///
/// Carries the fractional read position and the last input frame across
/// calls, so consecutive buffers resample as one continuous signal with no
/// truncated frames or seams at buffer boundaries. Output lags the input by
/// one source frame.
#[derive(Debug, Clone)]
pub struct Resampler {
    channels: usize,
    target_rate: f64,
    source_rate: f64,
    position: f64,
    last_frame: Option<Vec<f32>>,
}

impl Resampler {
    pub fn new(channels: usize, target_rate: f64) -> Self {
        Self {
            channels: channels.max(1),
            target_rate,
            source_rate: target_rate,
            position: 0.0,
            last_frame: None,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Resample the next buffer of the stream.
    ///
    /// Matching rates pass through unchanged. A source rate change restarts
    /// the interpolation.
    pub fn process(&mut self, samples: &[f32], source_rate: f64) -> Vec<f32> {
        if source_rate <= 0.0 || (source_rate - self.target_rate).abs() < 0.01 {
            self.reset();
            self.source_rate = source_rate;
            return samples.to_vec();
        }
        if (source_rate - self.source_rate).abs() >= 0.01 {
            self.reset();
            self.source_rate = source_rate;
        }

        let channels = self.channels;
        let frames = samples.len() / channels;
        if frames == 0 {
            return Vec::new();
        }

        let previous = self.last_frame.take();
        let offset = usize::from(previous.is_some());
        let total = frames + offset;
        let at = |index: usize, ch: usize| -> f32 {
            match (&previous, index.checked_sub(offset)) {
                (Some(frame), None) => frame[ch],
                (_, Some(i)) => samples[i * channels + ch],
                (None, None) => 0.0,
            }
        };

        let step = self.source_rate / self.target_rate;
        let mut output = Vec::with_capacity(((total as f64 / step) as usize + 1) * channels);
        while (self.position as usize) + 1 < total {
            let index = self.position as usize;
            let fraction = (self.position - index as f64) as f32;
            for ch in 0..channels {
                let a = at(index, ch);
                let b = at(index + 1, ch);
                output.push(a + (b - a) * fraction);
            }
            self.position += step;
        }

        self.position -= (total - 1) as f64;
        self.last_frame = Some(samples[(frames - 1) * channels..frames * channels].to_vec());
        output
    }

    pub fn reset(&mut self) {
        self.position = 0.0;
        self.last_frame = None;
    }
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit little-endian PCM bytes.
///
/// Out-of-range values are clamped.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// RMS level of samples (0.0–1.0 for normalized audio).
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak absolute level of samples.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}
