use offline_recorder_core::models::config::{DisplayConstraints, MicrophoneConstraints};
use offline_recorder_core::models::device::{is_alias_id, MediaDeviceInfo, MediaDeviceKind};
use offline_recorder_core::models::error::RecorderError;
use offline_recorder_core::traits::media_devices::{DisplayStream, MediaDevices, MediaTrack};

use crate::tracks::{TestPatternTrack, ToneTrack};

/// How the synthetic platform behaves.
#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    /// Enumerated devices, in platform order.
    pub devices: Vec<MediaDeviceInfo>,
    /// Whether the display picker shares system audio.
    pub share_system_audio: bool,
    /// Simulate the user dismissing the display picker.
    pub cancel_picker: bool,
    /// Simulate the user refusing microphone access.
    pub deny_microphone: bool,
    /// Native size of the synthetic screen.
    pub frame_size: (u32, u32),
    /// End the video track after this many frames (the user stopping sharing).
    pub video_frame_limit: Option<u64>,
    pub system_sample_rate: f64,
    pub system_tone_hz: f32,
    pub mic_tone_hz: f32,
}

fn device(id: &str, kind: MediaDeviceKind, label: &str) -> MediaDeviceInfo {
    MediaDeviceInfo {
        id: id.to_string(),
        group_id: "synthetic".to_string(),
        kind,
        label: label.to_string(),
    }
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            devices: vec![
                device("default", MediaDeviceKind::AudioInput, "Default - Synthetic Headset"),
                device(
                    "communications",
                    MediaDeviceKind::AudioInput,
                    "Communications - Synthetic Headset",
                ),
                device("synthetic-builtin", MediaDeviceKind::AudioInput, "Built-in Microphone"),
                device("synthetic-headset", MediaDeviceKind::AudioInput, "Synthetic Headset"),
                device("synthetic-speakers", MediaDeviceKind::AudioOutput, "Synthetic Speakers"),
            ],
            share_system_audio: true,
            cancel_picker: false,
            deny_microphone: false,
            frame_size: (320, 180),
            video_frame_limit: None,
            system_sample_rate: 48_000.0,
            system_tone_hz: 220.0,
            mic_tone_hz: 440.0,
        }
    }
}

/// Platform stand-in generating test-pattern video and tone audio.
///
/// Device labels stay hidden until a microphone has been opened once, as on
/// platforms that gate enumeration behind permission.
pub struct SyntheticMediaDevices {
    options: SyntheticOptions,
    permission_granted: bool,
}

impl SyntheticMediaDevices {
    pub fn new(options: SyntheticOptions) -> Self {
        Self {
            options,
            permission_granted: false,
        }
    }

    pub fn options(&self) -> &SyntheticOptions {
        &self.options
    }

    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    fn microphone_label(&self, device_id: Option<&str>) -> Result<String, RecorderError> {
        let inputs = || {
            self.options
                .devices
                .iter()
                .filter(|d| d.kind == MediaDeviceKind::AudioInput)
        };
        let found = match device_id {
            Some(id) => inputs().find(|d| d.id == id),
            None => inputs().find(|d| !is_alias_id(&d.id)),
        };
        found
            .map(|d| d.label.clone())
            .ok_or(RecorderError::DeviceUnavailable)
    }
}

impl MediaDevices for SyntheticMediaDevices {
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, RecorderError> {
        let granted = self.permission_granted;
        Ok(self
            .options
            .devices
            .iter()
            .cloned()
            .map(|mut d| {
                if !granted {
                    d.label.clear();
                }
                d
            })
            .collect())
    }

    fn get_display_media(
        &mut self,
        constraints: &DisplayConstraints,
    ) -> Result<DisplayStream, RecorderError> {
        if self.options.cancel_picker {
            log::info!("Synthetic display picker dismissed");
            return Err(RecorderError::NoSourceSelected);
        }

        let (width, height) = self.options.frame_size;
        let video = TestPatternTrack::new(
            "Synthetic screen",
            width,
            height,
            constraints.frame_rate,
            self.options.video_frame_limit,
        );

        let audio = self.options.share_system_audio.then(|| {
            Box::new(ToneTrack::new(
                "Synthetic system audio",
                2,
                self.options.system_sample_rate,
                self.options.system_tone_hz,
                0.4,
            )) as Box<dyn MediaTrack>
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
        if self.options.deny_microphone {
            return Err(RecorderError::PermissionDenied);
        }
        let label = self.microphone_label(constraints.device_id.as_deref())?;
        self.permission_granted = true;

        Ok(Box::new(ToneTrack::new(
            &label,
            1,
            constraints.audio.sample_rate,
            self.options.mic_tone_hz,
            0.6,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offline_recorder_core::models::config::AudioConstraints;
    use offline_recorder_core::models::media::TrackKind;

    fn mic_request(device_id: Option<&str>) -> MicrophoneConstraints {
        MicrophoneConstraints {
            device_id: device_id.map(str::to_string),
            audio: AudioConstraints::default(),
        }
    }

    #[test]
    fn labels_hidden_until_microphone_opened() {
        let mut media = SyntheticMediaDevices::new(SyntheticOptions::default());
        assert!(media.enumerate_devices().unwrap().iter().all(|d| d.label.is_empty()));

        media.get_user_media(&mic_request(None)).unwrap();

        assert!(media.permission_granted());
        let labels: Vec<String> = media
            .enumerate_devices()
            .unwrap()
            .into_iter()
            .map(|d| d.label)
            .collect();
        assert_eq!(labels[3], "Synthetic Headset");
    }

    #[test]
    fn default_microphone_is_first_concrete_input() {
        let mut media = SyntheticMediaDevices::new(SyntheticOptions::default());
        let mic = media.get_user_media(&mic_request(None)).unwrap();

        assert_eq!(mic.info().label, "Built-in Microphone");
        assert_eq!(mic.info().channel_count, 1);
        assert_eq!(mic.info().sample_rate, 44_100.0);
    }

    #[test]
    fn unknown_microphone_is_unavailable() {
        let mut media = SyntheticMediaDevices::new(SyntheticOptions::default());
        assert_eq!(
            media.get_user_media(&mic_request(Some("usb-42"))).err(),
            Some(RecorderError::DeviceUnavailable)
        );
    }

    #[test]
    fn denied_microphone() {
        let mut media = SyntheticMediaDevices::new(SyntheticOptions {
            deny_microphone: true,
            ..Default::default()
        });
        assert_eq!(
            media.get_user_media(&mic_request(None)).err(),
            Some(RecorderError::PermissionDenied)
        );
        assert!(!media.permission_granted());
    }

    #[test]
    fn display_shares_video_and_optional_audio() {
        let mut media = SyntheticMediaDevices::new(SyntheticOptions::default());
        let stream = media.get_display_media(&DisplayConstraints::default()).unwrap();
        assert_eq!(stream.video.as_ref().map(|t| t.info().kind), Some(TrackKind::Video));
        assert_eq!(stream.audio.as_ref().map(|t| t.info().channel_count), Some(2));

        let mut muted = SyntheticMediaDevices::new(SyntheticOptions {
            share_system_audio: false,
            ..Default::default()
        });
        let stream = muted.get_display_media(&DisplayConstraints::default()).unwrap();
        assert!(stream.audio.is_none());
    }

    #[test]
    fn cancelled_picker() {
        let mut media = SyntheticMediaDevices::new(SyntheticOptions {
            cancel_picker: true,
            ..Default::default()
        });
        assert_eq!(
            media.get_display_media(&DisplayConstraints::default()).err().map(|e| e.to_string()),
            Some("no capture source selected".to_string())
        );
    }
}
