//! Mock Capture Demo
//!
//! Assembles a two-sensor group backed by synthetic device links,
//! records a couple of seconds into ./datasets/demo.trec, and prints a
//! capture summary. No hardware required.
//!
//! Run with: cargo run --bin mock_capture [config.toml]

use std::time::Duration;

use capture_engine::SensorGroup;
use config_loader::ConfigLoader;
use contracts::{GroupBlueprint, PayloadValue, SensorKind, SensorSpec, WidgetSpec};
use observability::CaptureMetricsAggregator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Capture Demo");

    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading group config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        demo_blueprint()
    };

    let destination = blueprint.destination.clone();
    let group = SensorGroup::assemble(blueprint)?;

    tracing::info!(group = group.group_name(), "Group assembled, starting capture");
    let running = group.start().await?;

    // Simulate an operator annotating mid-capture. Configs without
    // these widgets just log the rejection.
    tokio::time::sleep(Duration::from_millis(800)).await;
    for (label, value) in [
        ("force", PayloadValue::Number(4.5)),
        ("contact", PayloadValue::Flag(true)),
    ] {
        match running.set_annotation(label, value) {
            Ok(()) => tracing::info!(label, "annotation updated"),
            Err(e) => tracing::warn!(label, error = %e, "annotation rejected"),
        }
    }

    tokio::time::sleep(Duration::from_millis(1200)).await;

    for (sensor, state) in running.sensor_states() {
        tracing::info!(sensor = %sensor, state = %state, "member state");
    }

    let stats = running.stop().await?;
    tracing::info!("{stats}");

    if let Some(path) = destination {
        let mut aggregator = CaptureMetricsAggregator::new();
        for record in capture_engine::replay(&path)? {
            aggregator.update(&record?);
        }
        println!("{}", aggregator.summary());
        println!("Recording written to {}", path.display());
    }

    Ok(())
}

fn demo_blueprint() -> GroupBlueprint {
    GroupBlueprint {
        group_name: "demo".into(),
        destination: Some("datasets/demo.trec".into()),
        group_frequency: None,
        sensors: vec![
            SensorSpec::new("thumb", SensorKind::Digit)
                .with_frequencies(60.0, 30.0)
                .with_serial("D20501"),
            SensorSpec::new("index", SensorKind::GelsightMini).with_frequencies(30.0, 30.0),
        ],
        payload: vec![
            WidgetSpec::Slider {
                label: "force".into(),
                min_value: 0.0,
                max_value: 10.0,
                step: 0.5,
                default: 0.0,
            },
            WidgetSpec::Checkbox {
                label: "contact".into(),
                default: false,
            },
        ],
    }
}
