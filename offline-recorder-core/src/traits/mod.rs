pub mod artifact_store;
pub mod encoder;
pub mod media_devices;
pub mod recorder;
pub mod session_delegate;
