use crate::models::config::{AudioConstraints, DisplayConstraints, MicrophoneConstraints};
use crate::models::device::is_alias_id;
use crate::models::error::RecorderError;
use crate::models::media::TrackKind;
use crate::traits::media_devices::{MediaDevices, MediaTrack};

/// Tracks obtained from the display picker.
pub struct DisplayCapture {
    pub video: Box<dyn MediaTrack>,
    /// `None` when the user did not share system/tab audio.
    pub system_audio: Option<Box<dyn MediaTrack>>,
}

/// Ask the user for a screen, window or tab (plus optional system audio).
///
/// A stream without a video track counts as a cancelled picker. Missing system
/// audio is not an error here; the mixer reports it.
pub fn acquire_display<P: MediaDevices + ?Sized>(
    media: &mut P,
    constraints: &DisplayConstraints,
) -> Result<DisplayCapture, RecorderError> {
    log::debug!(
        "Requesting display capture {}x{} @ {} fps",
        constraints.ideal_width,
        constraints.ideal_height,
        constraints.frame_rate
    );
    let stream = media.get_display_media(constraints)?;

    let mut audio = stream.audio;
    let Some(video) = stream.video else {
        if let Some(track) = audio.as_mut() {
            track.stop();
        }
        log::info!("Display capture returned no video track");
        return Err(RecorderError::NoSourceSelected);
    };

    let system_audio = match audio {
        Some(mut track) if track.info().kind != TrackKind::Audio => {
            log::warn!("Ignoring non-audio track '{}' in display audio slot", track.info().label);
            track.stop();
            None
        }
        other => other,
    };

    log::info!(
        "Display capture granted: '{}' (system audio: {})",
        video.info().label,
        system_audio
            .as_ref()
            .map(|t| t.info().label.as_str())
            .unwrap_or("none")
    );
    Ok(DisplayCapture {
        video,
        system_audio,
    })
}

/// Open the microphone identified by `device_id` (`None` = platform default).
///
/// Aliases must be resolved by the caller before this point.
pub fn acquire_microphone<P: MediaDevices + ?Sized>(
    media: &mut P,
    device_id: Option<&str>,
    audio: &AudioConstraints,
) -> Result<Box<dyn MediaTrack>, RecorderError> {
    if let Some(id) = device_id.filter(|id| is_alias_id(id)) {
        log::warn!("Opening microphone by unresolved alias '{}'", id);
    }
    let constraints = MicrophoneConstraints {
        device_id: device_id.map(str::to_string),
        audio: audio.clone(),
    };
    let track = media.get_user_media(&constraints)?;
    log::info!(
        "Microphone granted: '{}' ({} ch @ {} Hz)",
        track.info().label,
        track.info().channel_count,
        track.info().sample_rate
    );
    Ok(track)
}

/// Prompt for microphone access, releasing the probe track right away.
pub fn request_permission<P: MediaDevices + ?Sized>(
    media: &mut P,
    audio: &AudioConstraints,
) -> Result<(), RecorderError> {
    let mut probe = media.get_user_media(&MicrophoneConstraints {
        device_id: None,
        audio: audio.clone(),
    })?;
    probe.stop();
    log::info!("Microphone permission granted");
    Ok(())
}
