//! Replay Demo
//!
//! Opens a recording produced by the mock_capture demo and replays one
//! member through the live sensor contract.
//!
//! Run with: cargo run --bin replay_session [recording.trec] [sensor_name]

use contracts::{SensorKind, SensorSpec, TouchSensor};
use recording::RecordingReader;
use sensor_factory::ReplaySensor;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "datasets/demo.trec".to_string());

    let reader = RecordingReader::open(&path)?;
    let manifest = reader.manifest();
    tracing::info!(
        group = %manifest.group_name,
        created_at = %manifest.created_at,
        members = manifest.sensors.len(),
        "Recording opened"
    );

    let sensor_name = std::env::args().nth(2).unwrap_or_else(|| {
        manifest
            .sensors
            .first()
            .map(|s| s.name.as_str().to_string())
            .unwrap_or_default()
    });

    let mut spec = SensorSpec::new(sensor_name.as_str(), SensorKind::Replay);
    spec.source = Some(path.clone().into());
    spec.speed = Some(2.0); // replay at double speed

    let mut sensor = ReplaySensor::load(&spec)?;
    sensor.connect()?;
    tracing::info!(sensor = %sensor_name, frames = sensor.remaining(), "Replay starting");

    let mut replayed = 0u64;
    while let Ok(frame) = sensor.acquire() {
        replayed += 1;
        tracing::info!(
            timestamp = format!("{:.3}", frame.timestamp),
            kind = frame.payload_kind(),
            "frame"
        );
    }
    sensor.release();

    tracing::info!(replayed, "Replay finished");
    Ok(())
}
