//! Record a few seconds of synthetic screen + audio and store it offline.
//!
//! ```text
//! record-demo [seconds] [output-dir]
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to follow the session.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use offline_recorder_core::{
    ArtifactStore, Chunk, DirectoryStore, RecordedArtifact, RecorderConfiguration, RecorderError,
    SessionController, SessionDelegate, SessionState,
};
use offline_recorder_synthetic::{FramedEncoderFactory, SyntheticMediaDevices, SyntheticOptions};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const DEFAULT_LENGTH: Duration = Duration::from_secs(3);

/// Logs session notifications.
struct LogDelegate;

impl SessionDelegate for LogDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        log::info!("state: {}", state.name());
    }

    fn on_chunk(&self, chunk: &Chunk) {
        log::debug!("chunk #{} ({} bytes)", chunk.sequence, chunk.len());
    }

    fn on_error(&self, error: &RecorderError) {
        log::error!("{} ({})", error, error.hint());
    }

    fn on_artifact_ready(&self, artifact: &RecordedArtifact) {
        log::info!("artifact ready: {} ({} bytes)", artifact.url(), artifact.len());
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let length = recording_length(args.next().as_deref());
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("recordings"));

    if let Err(err) = run(length, output_dir) {
        eprintln!("recording failed: {}\n{}", err, err.hint());
        std::process::exit(1);
    }
}

/// Parse the recording length in seconds, falling back to the default for
/// anything that is not a positive, representable duration.
fn recording_length(arg: Option<&str>) -> Duration {
    arg.and_then(|arg| arg.parse::<f64>().ok())
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(DEFAULT_LENGTH)
}

fn run(length: Duration, output_dir: PathBuf) -> Result<(), RecorderError> {
    let media = SyntheticMediaDevices::new(SyntheticOptions::default());
    let mut controller =
        SessionController::new(media, FramedEncoderFactory, RecorderConfiguration::default())?;
    controller.set_delegate(Arc::new(LogDelegate));

    let devices = controller.grant_permission()?;
    for device in &devices {
        log::info!(
            "input: {} '{}'{}",
            device.id,
            device.label,
            if device.is_alias { " (alias)" } else { "" }
        );
    }
    controller.select_device(Some("default".into()));

    controller.start()?;
    let deadline = Instant::now().checked_add(length);
    let mut artifact = None;
    while artifact.is_none() && deadline.map_or(true, |deadline| Instant::now() < deadline) {
        artifact = controller.poll()?;
        thread::sleep(POLL_INTERVAL);
    }
    let artifact = match artifact {
        Some(artifact) => artifact,
        None => controller
            .stop()?
            .ok_or_else(|| RecorderError::EncodingFailed("recording produced no artifact".into()))?,
    };

    let duration = controller
        .last_recording_duration()
        .unwrap_or_default()
        .as_secs_f64();
    let mut store = DirectoryStore::open(&output_dir)?;
    let record = store.put(&artifact, duration)?;

    println!(
        "Saved recording {} to {} ({} bytes, {} chunks, {:.1}s, sha256 {})",
        record.id,
        store.recording_path(record.id).display(),
        record.size_bytes,
        record.chunk_count,
        record.duration_secs,
        record.checksum
    );
    Ok(())
}
