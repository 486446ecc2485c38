//! # Integration Tests
//!
//! Cross-crate and end-to-end tests. Everything runs against synthetic
//! device links; no hardware required.
//!
//! Covers:
//! - deterministic capture scenarios (decimator + assembler + store)
//! - live group capture → store → replay round trips
//! - mid-session sensor failure degradation
//! - annotation payload flow into records

#[cfg(test)]
mod scenario_tests {
    use bytes::Bytes;
    use capture_engine::{RateDecimator, RecordAssembler};
    use contracts::{
        Frame, FramePayload, GroupBlueprint, ImageData, ImageFormat, PayloadSnapshot, SensorKind,
        SensorSpec,
    };
    use recording::{Manifest, RecordingReader, RecordingWriter};
    use tempfile::tempdir;

    fn frame(sensor: &str, ts: f64) -> Frame {
        Frame {
            sensor: sensor.into(),
            timestamp: ts,
            payload: FramePayload::Image(ImageData {
                width: 2,
                height: 2,
                format: ImageFormat::Gray8,
                data: Bytes::from(vec![0, 1, 2, 3]),
            }),
        }
    }

    /// Group {A: fs=60, fr=30} + {B: fs=30, fr=30} driven through two
    /// seconds of simulated native sampling at a 30 Hz group rate must
    /// persist exactly 60 records, each carrying both members.
    #[test]
    fn hand_group_two_seconds_yields_sixty_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hand.trec");

        let blueprint = GroupBlueprint {
            group_name: "hand".into(),
            destination: Some(path.clone()),
            group_frequency: None,
            sensors: vec![
                SensorSpec::new("A", SensorKind::Digit)
                    .with_frequencies(60.0, 30.0)
                    .with_serial("D-A"),
                SensorSpec::new("B", SensorKind::GelsightMini).with_frequencies(30.0, 30.0),
            ],
            payload: vec![],
        };
        assert_eq!(blueprint.effective_frequency(), 30.0);

        let mut writer =
            RecordingWriter::create(&path, &Manifest::from_blueprint(&blueprint)).unwrap();
        let mut dec_a = RateDecimator::new(60.0, 30.0).unwrap();
        let mut dec_b = RateDecimator::new(30.0, 30.0).unwrap();
        let mut assembler = RecordAssembler::new(["A".into(), "B".into()]);

        let group_rate = 30.0;
        for tick in 1..=60u64 {
            let tick_time = tick as f64 / group_rate;
            // Between group ticks, A produces two native samples and B one.
            for sub in 0..2 {
                if dec_a.admit() {
                    assembler.offer(frame("A", tick_time - 0.033 + sub as f64 * 0.016));
                }
            }
            if dec_b.admit() {
                assembler.offer(frame("B", tick_time - 0.033));
            }
            let record = assembler.assemble(tick_time, PayloadSnapshot::default());
            writer.append(&record).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 60);

        let reader = RecordingReader::open(&path).unwrap();
        let records: Vec<_> = reader.records().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 60);
        let mut aggregator = observability::CaptureMetricsAggregator::new();
        for record in &records {
            assert!(record.frames["A"].frame().is_some(), "A missing");
            assert!(record.frames["B"].frame().is_some(), "B missing");
            aggregator.update(record);
        }
        let summary = aggregator.summary();
        assert_eq!(summary.total_records, 60);
        assert_eq!(summary.records_with_absent, 0);
        // Timestamps strictly non-decreasing.
        for pair in records.windows(2) {
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }
}

#[cfg(test)]
mod config_tests {
    use capture_engine::SensorGroup;
    use config_loader::{ConfigFormat, ConfigLoader};

    /// Duplicate member names fail at validation, before any hardware
    /// session exists.
    #[test]
    fn duplicate_names_from_document_never_connect() {
        let content = r#"
group_name = "hand"

[[sensors]]
sensor_type = "gelsight_mini"
sensor_name = "X"

[[sensors]]
sensor_type = "gelsight_mini"
sensor_name = "X"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn document_to_assembled_group() {
        let content = r#"
group_name = "hand"

[[sensors]]
sensor_type = "digit"
sensor_name = "thumb"
serial_id = "D20501"
sampling_frequency = 60.0
recording_frequency = 30.0

[[payload]]
type = "slider"
label = "force"
min_value = 0.0
max_value = 10.0
"#;
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let group = SensorGroup::assemble(blueprint).unwrap();
        assert_eq!(group.group_name(), "hand");
        assert_eq!(group.sensor_states().len(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use capture_engine::SensorGroup;
    use contracts::{
        FrameEntry, GroupBlueprint, ImageFormat, PayloadValue, RigError, SensorId, SensorKind,
        SensorSpec, TouchSensor, WidgetSpec,
    };
    use recording::RecordingReader;
    use sensor_factory::{DigitSensor, ReplaySensor, SensorRegistry, SyntheticLink};
    use tempfile::tempdir;

    fn capture_blueprint(path: &std::path::Path) -> GroupBlueprint {
        GroupBlueprint {
            group_name: "hand".into(),
            destination: Some(path.to_path_buf()),
            group_frequency: None,
            sensors: vec![
                SensorSpec::new("left", SensorKind::GelsightMini).with_frequencies(60.0, 30.0),
                SensorSpec::new("right", SensorKind::GelsightMini).with_frequencies(30.0, 30.0),
            ],
            payload: vec![WidgetSpec::Slider {
                label: "force".into(),
                min_value: 0.0,
                max_value: 10.0,
                step: 0.5,
                default: 1.0,
            }],
        }
    }

    /// Capture → store → replay: the recorded sequence is deterministic
    /// and the replay variant re-emits timestamps that are a subset, in
    /// order, of the recorded tick timestamps.
    #[tokio::test]
    async fn capture_store_replay_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hand.trec");

        let group = SensorGroup::assemble(capture_blueprint(&path)).unwrap();
        let running = group.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        let stats = running.stop().await.unwrap();

        assert!(stats.records_written >= 5, "too few records: {stats}");
        assert!(stats.failed_sensors.is_empty());

        // Deterministic iteration across two passes.
        let reader = RecordingReader::open(&path).unwrap();
        assert_eq!(reader.manifest().group_name, "hand");
        let first: Vec<f64> = reader
            .records()
            .unwrap()
            .map(|r| r.unwrap().timestamp)
            .collect();
        let second: Vec<f64> = reader
            .records()
            .unwrap()
            .map(|r| r.unwrap().timestamp)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len() as u64, stats.records_written);

        // Replay a member through the sensor contract.
        let mut spec = SensorSpec::new("left", SensorKind::Replay).with_source(&path);
        spec.speed = Some(1000.0);
        let mut replay = ReplaySensor::load(&spec).unwrap();
        replay.connect().unwrap();

        let mut emitted = Vec::new();
        while let Ok(frame) = replay.acquire() {
            emitted.push(frame.timestamp);
        }
        assert!(!emitted.is_empty());
        let mut sorted = emitted.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(emitted, sorted, "replay out of order");
        for ts in &emitted {
            assert!(first.contains(ts), "timestamp {ts} not in recorded ticks");
        }
    }

    /// Constructor used to inject a failing link: the serial carries
    /// the number of frames after which the channel drops.
    fn failing_digit(spec: &SensorSpec) -> Result<Box<dyn TouchSensor>, RigError> {
        let fail_after: u64 = spec
            .serial_id
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(u64::MAX);
        let link = SyntheticLink::image(8, 8, ImageFormat::Gray8, spec.sampling_frequency)
            .fail_after(fail_after);
        Ok(Box::new(DigitSensor::with_link(spec, Box::new(link))?))
    }

    /// A member failing mid-session degrades to absent entries while
    /// the sibling keeps recording.
    #[tokio::test]
    async fn failed_sensor_marks_absent_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("degraded.trec");

        let blueprint = GroupBlueprint {
            group_name: "degraded".into(),
            destination: Some(path.clone()),
            group_frequency: None,
            sensors: vec![
                // fails after 6 frames (~200 ms at 30 Hz)
                SensorSpec::new("A", SensorKind::Digit)
                    .with_frequencies(30.0, 30.0)
                    .with_serial("6"),
                SensorSpec::new("B", SensorKind::GelsightMini).with_frequencies(30.0, 30.0),
            ],
            payload: vec![],
        };

        let mut registry = SensorRegistry::builtin();
        registry.register(SensorKind::Digit, failing_digit);

        let group = SensorGroup::assemble_with(blueprint, &registry).unwrap();
        let running = group.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(900)).await;

        let states = running.sensor_states();
        assert_eq!(states["A"], contracts::ConnectionState::Failed);

        let stats = running.stop().await.unwrap();
        assert_eq!(stats.failed_sensors, vec![SensorId::from("A")]);

        let reader = RecordingReader::open(&path).unwrap();
        let records: Vec<_> = reader.records().unwrap().map(|r| r.unwrap()).collect();
        assert!(records.len() >= 5);

        // A produced data before failing...
        assert!(
            records
                .iter()
                .any(|r| matches!(r.frames["A"], FrameEntry::Sampled(_))),
            "A never sampled"
        );
        // ...and is absent afterwards, never zero-filled.
        let last = records.last().unwrap();
        assert!(matches!(last.frames["A"], FrameEntry::Absent));
        assert!(last.frames["B"].frame().is_some(), "B should keep flowing");
    }

    /// Annotation values set mid-session appear in subsequent records;
    /// earlier records carry the declared default.
    #[tokio::test]
    async fn annotation_values_flow_into_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotated.trec");

        let group = SensorGroup::assemble(capture_blueprint(&path)).unwrap();
        let running = group.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        running
            .set_annotation("force", PayloadValue::Number(7.5))
            .unwrap();
        // Out-of-constraint values are rejected without disturbing state.
        assert!(running
            .set_annotation("force", PayloadValue::Number(99.0))
            .is_err());
        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = running.stop().await.unwrap();
        assert!(stats.records_written >= 4);

        let reader = RecordingReader::open(&path).unwrap();
        let records: Vec<_> = reader.records().unwrap().map(|r| r.unwrap()).collect();

        let first = records.first().unwrap();
        assert_eq!(
            first.payload.get("force"),
            Some(&PayloadValue::Number(1.0)),
            "first record should carry the default"
        );
        let last = records.last().unwrap();
        assert_eq!(last.payload.get("force"), Some(&PayloadValue::Number(7.5)));
    }

    /// A recorded session re-opens as an all-replay group via its
    /// manifest.
    #[tokio::test]
    async fn recording_reopens_as_replay_group() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hand.trec");

        let group = SensorGroup::assemble(capture_blueprint(&path)).unwrap();
        let running = group.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        running.stop().await.unwrap();

        let replay_group = SensorGroup::from_recording(&path).unwrap();
        assert_eq!(replay_group.group_name(), "hand");
        let states = replay_group.sensor_states();
        assert_eq!(states.len(), 2);
        assert!(states.contains_key("left"));
        assert!(states.contains_key("right"));
    }

    /// Concurrent writers to the same destination fail fast.
    #[tokio::test]
    async fn second_group_on_same_destination_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contended.trec");

        let first = SensorGroup::assemble(capture_blueprint(&path))
            .unwrap()
            .start()
            .await
            .unwrap();

        let second = SensorGroup::assemble(capture_blueprint(&path))
            .unwrap()
            .start()
            .await;
        assert!(second.is_err());
        assert!(matches!(second.unwrap_err(), RigError::Storage { .. }));

        first.stop().await.unwrap();
    }

    /// replay() yields the recorded sequence lazily.
    #[tokio::test]
    async fn replay_facade_iterates_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hand.trec");

        let group = SensorGroup::assemble(capture_blueprint(&path)).unwrap();
        let running = group.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        let stats = running.stop().await.unwrap();

        let count = capture_engine::replay(&path)
            .unwrap()
            .map(|r| r.unwrap())
            .count() as u64;
        assert_eq!(count, stats.records_written);
    }
}
