use std::time::Duration;

/// Include/exclude preference passed through to the display picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Include,
    Exclude,
}

/// Surface the display picker should offer first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySurface {
    Monitor,
    Window,
    Browser,
}

/// Constraints for the screen/window/tab capture request.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub frame_rate: u32,
    pub display_surface: DisplaySurface,
    /// Whether the picker should offer sharing system/tab audio.
    pub system_audio: Preference,
    pub self_browser_surface: Preference,
    pub surface_switching: Preference,
    pub monitor_type_surfaces: Preference,
    pub prefer_current_tab: bool,
    /// Constraints applied to the system audio track, if one is shared.
    pub audio: AudioConstraints,
}

impl Default for DisplayConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1980,
            ideal_height: 1080,
            frame_rate: 30,
            display_surface: DisplaySurface::Monitor,
            system_audio: Preference::Include,
            self_browser_surface: Preference::Exclude,
            surface_switching: Preference::Include,
            monitor_type_surfaces: Preference::Include,
            prefer_current_tab: false,
            audio: AudioConstraints::default(),
        }
    }
}

/// Processing constraints shared by every audio capture request.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub sample_rate: f64,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            sample_rate: 44_100.0,
        }
    }
}

/// Constraints for the microphone capture request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MicrophoneConstraints {
    /// Device id after alias resolution, or `None` for the platform default.
    pub device_id: Option<String>,
    pub audio: AudioConstraints,
}

/// Container/codec pairing of the recorded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub mime_type: &'static str,
    pub file_extension: &'static str,
}

impl OutputFormat {
    /// The only encoding this recorder produces.
    pub const WEBM_VP8_OPUS: OutputFormat = OutputFormat {
        mime_type: "video/webm; codecs=vp8,opus",
        file_extension: "webm",
    };

    /// Mime type without codec parameters (e.g. `video/webm`).
    pub fn container(&self) -> &'static str {
        match self.mime_type.split_once(';') {
            Some((container, _)) => container.trim(),
            None => self.mime_type,
        }
    }
}

/// Per-source gains applied by the audio mixer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixGains {
    pub system: f32,
    pub mic: f32,
}

impl MixGains {
    /// Keeps system audio from drowning out the voice.
    pub const POLICY: MixGains = MixGains {
        system: 0.8,
        mic: 1.0,
    };
}

impl Default for MixGains {
    fn default() -> Self {
        Self::POLICY
    }
}

/// Configuration for a recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfiguration {
    pub display: DisplayConstraints,

    /// Microphone processing constraints; the device comes from the selection.
    pub microphone: AudioConstraints,

    /// How often the encoder hands over a segment (default: 500 ms).
    pub timeslice: Duration,

    /// Sample rate of the mixed audio track (default: 44100).
    pub output_sample_rate: f64,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.display.ideal_width == 0 || self.display.ideal_height == 0 {
            return Err("display dimensions must be positive".into());
        }
        if self.display.frame_rate == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.microphone.sample_rate <= 0.0 || self.display.audio.sample_rate <= 0.0 {
            return Err("capture sample rate must be positive".into());
        }
        if self.output_sample_rate <= 0.0 {
            return Err("output sample rate must be positive".into());
        }
        if self.timeslice < Duration::from_millis(10) || self.timeslice > Duration::from_secs(60) {
            return Err(format!("unsupported timeslice: {:?}", self.timeslice));
        }
        Ok(())
    }

    /// Output format of every recording.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::WEBM_VP8_OPUS
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            display: DisplayConstraints::default(),
            microphone: AudioConstraints::default(),
            timeslice: Duration::from_millis(500),
            output_sample_rate: 44_100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_capture_policy() {
        let config = RecorderConfiguration::default();
        assert_eq!(config.display.ideal_width, 1980);
        assert_eq!(config.display.ideal_height, 1080);
        assert_eq!(config.display.frame_rate, 30);
        assert_eq!(config.display.system_audio, Preference::Include);
        assert!(config.microphone.echo_cancellation);
        assert_eq!(config.microphone.sample_rate, 44_100.0);
        assert_eq!(config.timeslice, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_frame_rate() {
        let mut config = RecorderConfiguration::default();
        config.display.frame_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_tiny_timeslice() {
        let config = RecorderConfiguration {
            timeslice: Duration::from_millis(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_format_is_fixed() {
        let format = RecorderConfiguration::default().output_format();
        assert_eq!(format.mime_type, "video/webm; codecs=vp8,opus");
        assert_eq!(format.container(), "video/webm");
    }

    #[test]
    fn policy_gains() {
        assert_eq!(MixGains::default(), MixGains { system: 0.8, mic: 1.0 });
    }
}
