use crate::models::device::{is_alias_id, CaptureDevice, MediaDeviceKind};
use crate::models::error::RecorderError;
use crate::traits::media_devices::MediaDevices;

/// Enumerate audio inputs in platform order.
///
/// Fails with `PermissionDenied` when the platform hides labels, which it does
/// until microphone access has been granted.
pub fn list_audio_inputs<P: MediaDevices + ?Sized>(
    media: &mut P,
) -> Result<Vec<CaptureDevice>, RecorderError> {
    let inputs: Vec<CaptureDevice> = media
        .enumerate_devices()?
        .into_iter()
        .filter(|device| device.kind == MediaDeviceKind::AudioInput)
        .map(CaptureDevice::from)
        .collect();

    if !inputs.is_empty() && inputs.iter().all(|device| device.label.is_empty()) {
        log::info!("Audio inputs are unlabeled; microphone permission not granted yet");
        return Err(RecorderError::PermissionDenied);
    }
    Ok(inputs)
}

/// Resolve an alias entry to the concrete device it stands for.
///
/// Takes the alias entry's label and returns the first other entry, in
/// catalog order, whose label is contained in it and which is not itself an
/// alias.
pub fn resolve_alias(alias_id: &str, catalog: &[CaptureDevice]) -> Result<String, RecorderError> {
    let alias = catalog
        .iter()
        .find(|device| device.id == alias_id)
        .ok_or(RecorderError::NoMatchingDevice)?;

    catalog
        .iter()
        .find(|device| {
            device.id != alias_id && !is_alias_id(&device.id) && alias.label.contains(&device.label)
        })
        .map(|device| device.id.clone())
        .ok_or(RecorderError::NoMatchingDevice)
}

/// Resolve `device_id` if it is an alias, falling back to the alias itself.
///
/// The fallback can record from a different physical device than the user
/// expects; it is kept because the platform still accepts the alias id.
pub fn resolve_or_fallback(device_id: &str, catalog: &[CaptureDevice]) -> String {
    if !is_alias_id(device_id) {
        return device_id.to_string();
    }
    match resolve_alias(device_id, catalog) {
        Ok(resolved) => {
            log::debug!("Resolved alias '{}' to device '{}'", device_id, resolved);
            resolved
        }
        Err(_) => {
            log::warn!(
                "No concrete device matches alias '{}'; using the alias as-is",
                device_id
            );
            device_id.to_string()
        }
    }
}

/// Snapshot of the audio inputs, refreshed on demand.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<CaptureDevice>,
    needs_permission: bool,
}

impl DeviceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_devices(devices: Vec<CaptureDevice>) -> Self {
        Self {
            devices,
            needs_permission: false,
        }
    }

    /// Re-enumerate and replace the snapshot.
    pub fn refresh<P: MediaDevices + ?Sized>(
        &mut self,
        media: &mut P,
    ) -> Result<&[CaptureDevice], RecorderError> {
        match list_audio_inputs(media) {
            Ok(devices) => {
                log::info!("Found {} audio inputs", devices.len());
                self.devices = devices;
                self.needs_permission = false;
                Ok(&self.devices)
            }
            Err(RecorderError::PermissionDenied) => {
                self.devices.clear();
                self.needs_permission = true;
                Err(RecorderError::PermissionDenied)
            }
            Err(err) => Err(err),
        }
    }

    pub fn devices(&self) -> &[CaptureDevice] {
        &self.devices
    }

    /// Whether the last refresh saw unlabeled devices.
    pub fn needs_permission(&self) -> bool {
        self.needs_permission
    }

    pub fn find(&self, id: &str) -> Option<&CaptureDevice> {
        self.devices.iter().find(|device| device.id == id)
    }

    /// Concrete device id to request for `device_id`.
    pub fn resolve(&self, device_id: &str) -> String {
        resolve_or_fallback(device_id, &self.devices)
    }
}
