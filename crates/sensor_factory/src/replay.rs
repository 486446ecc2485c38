//! Replay sensor - re-emits a recorded stream through the live contract
//!
//! Reads one member's frames back from a recording and serves them
//! through the identical `acquire()` contract, preserving the original
//! inter-record deltas (scaled by playback speed) or a configured fixed
//! cadence. Downstream consumers cannot tell replay from live capture.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use contracts::{
    ConnectionState, Frame, FrameEntry, RigError, SensorId, SensorKind, SensorOption, SensorSpec,
    TouchSensor,
};
use recording::RecordingReader;

/// Playback pacing mode.
#[derive(Debug, Clone, Copy)]
enum Pacing {
    /// Preserve original record deltas, divided by the speed multiplier
    Original { speed: f64 },
    /// Emit at a fixed rate regardless of original timing
    Fixed { interval: Duration },
}

/// A synthetic sensor backed by a recording.
pub struct ReplaySensor {
    name: SensorId,
    sampling_frequency: f64,
    recording_frequency: f64,
    /// Frames stamped with their originating record timestamp
    frames: Vec<Frame>,
    cursor: usize,
    pacing: Pacing,
    state: ConnectionState,
    playback_started: Option<Instant>,
}

impl ReplaySensor {
    /// Load this member's frames from the spec's `source` recording.
    ///
    /// Only `Sampled` entries are kept: repeated entries would re-emit
    /// the same frame twice and absent entries carry nothing.
    pub fn load(spec: &SensorSpec) -> Result<Self, RigError> {
        let source = spec.source.as_ref().ok_or_else(|| {
            RigError::config_validation(
                format!("sensors[{}].source", spec.name),
                "source is mandatory for replay sensors",
            )
        })?;

        let reader = RecordingReader::open(source)?;
        let mut frames = Vec::new();
        for record in reader.records()? {
            let record = record?;
            if let Some(FrameEntry::Sampled(frame)) = record.frames.get(spec.name.as_str()) {
                let mut frame = frame.clone();
                // Stamp with the record tick so replayed timestamps are
                // a subset of the original record timestamps.
                frame.timestamp = record.timestamp;
                frames.push(frame);
            }
        }

        info!(
            sensor = %spec.name,
            source = %source.display(),
            frames = frames.len(),
            "replay sensor loaded"
        );

        let pacing = match spec.fixed_cadence_hz {
            Some(hz) => Pacing::Fixed {
                interval: Duration::from_secs_f64(1.0 / hz),
            },
            None => Pacing::Original {
                speed: spec.speed.unwrap_or(1.0).max(0.1),
            },
        };

        Ok(Self {
            name: spec.name.clone(),
            sampling_frequency: spec.sampling_frequency,
            recording_frequency: spec.recording_frequency,
            frames,
            cursor: 0,
            pacing,
            state: ConnectionState::Disconnected,
            playback_started: None,
        })
    }

    /// Number of frames left to emit.
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }

    fn wait_for_slot(&mut self) {
        match self.pacing {
            Pacing::Fixed { interval } => {
                // First frame is immediate.
                if self.cursor > 0 {
                    std::thread::sleep(interval);
                }
            }
            Pacing::Original { speed } => {
                let Some(first) = self.frames.first() else {
                    return;
                };
                let started = *self
                    .playback_started
                    .get_or_insert_with(Instant::now);
                let offset = self.frames[self.cursor].timestamp - first.timestamp;
                let target = Duration::from_secs_f64(offset / speed);
                let elapsed = started.elapsed();
                if target > elapsed {
                    std::thread::sleep(target - elapsed);
                }
            }
        }
    }
}

impl TouchSensor for ReplaySensor {
    fn name(&self) -> &SensorId {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Replay
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn recording_frequency(&self) -> f64 {
        self.recording_frequency
    }

    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    fn connect(&mut self) -> Result<(), RigError> {
        // The recording was already indexed at load time; nothing to
        // reach out to.
        if !matches!(self.state, ConnectionState::Failed) {
            self.state = ConnectionState::Connected;
        }
        Ok(())
    }

    fn configure(&mut self, option: &SensorOption) -> Result<(), RigError> {
        match option {
            SensorOption::PlaybackSpeed(speed) => {
                if *speed <= 0.0 {
                    return Err(RigError::config_validation(
                        format!("{}.playback_speed", self.name),
                        format!("playback speed must be > 0, got {speed}"),
                    ));
                }
                if let Pacing::Original { speed: current } = &mut self.pacing {
                    *current = *speed;
                }
                Ok(())
            }
            unsupported => Err(RigError::config_validation(
                format!("{}.{}", self.name, unsupported.name()),
                "option not supported by replay sensors",
            )),
        }
    }

    fn acquire(&mut self) -> Result<Frame, RigError> {
        if self.state == ConnectionState::Disconnected {
            return Err(RigError::acquisition(
                self.name.as_str(),
                "acquire before connect",
            ));
        }
        if self.cursor >= self.frames.len() {
            return Err(RigError::acquisition(
                self.name.as_str(),
                "end of recording",
            ));
        }

        self.wait_for_slot();

        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        self.state = ConnectionState::Streaming;
        Ok(frame)
    }

    fn mark_failed(&mut self) {
        self.state = ConnectionState::Failed;
    }

    fn release(&mut self) {
        self.playback_started = None;
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Disconnected;
        }
        debug!(sensor = %self.name, "replay sensor released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{
        FramePayload, GroupBlueprint, ImageData, ImageFormat, PayloadSnapshot, Record,
    };
    use recording::{Manifest, RecordingWriter};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::tempdir;

    fn frame(sensor: &str, ts: f64, seed: u8) -> Frame {
        Frame {
            sensor: sensor.into(),
            timestamp: ts,
            payload: FramePayload::Image(ImageData {
                width: 2,
                height: 1,
                format: ImageFormat::Gray8,
                data: Bytes::from(vec![seed, seed + 1]),
            }),
        }
    }

    fn write_recording(path: &Path) -> Vec<f64> {
        let blueprint = GroupBlueprint {
            group_name: "hand".into(),
            destination: None,
            group_frequency: None,
            sensors: vec![SensorSpec::new("thumb", SensorKind::Digit).with_serial("D1")],
            payload: vec![],
        };
        let mut writer =
            RecordingWriter::create(path, &Manifest::from_blueprint(&blueprint)).unwrap();

        let mut tick_timestamps = Vec::new();
        for i in 0..6 {
            let ts = i as f64 * 0.1;
            tick_timestamps.push(ts);
            let mut frames = BTreeMap::new();
            // Every other record repeats instead of sampling fresh.
            let entry = if i % 2 == 0 {
                FrameEntry::Sampled(frame("thumb", ts - 0.01, i as u8))
            } else {
                FrameEntry::Repeated(frame("thumb", ts - 0.11, i as u8))
            };
            frames.insert(SensorId::from("thumb"), entry);
            writer
                .append(&Record {
                    timestamp: ts,
                    frames,
                    payload: PayloadSnapshot::default(),
                })
                .unwrap();
        }
        writer.finish().unwrap();
        tick_timestamps
    }

    fn replay_spec(path: &Path) -> SensorSpec {
        SensorSpec::new("thumb", SensorKind::Replay)
            .with_source(path)
            // fast, deterministic pacing for tests
            .with_frequencies(30.0, 30.0)
    }

    #[test]
    fn emits_sampled_frames_with_record_timestamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.trec");
        let ticks = write_recording(&path);

        let mut spec = replay_spec(&path);
        spec.speed = Some(1000.0); // collapse the sleeps
        let mut sensor = ReplaySensor::load(&spec).unwrap();
        sensor.connect().unwrap();

        let mut emitted = Vec::new();
        while let Ok(frame) = sensor.acquire() {
            emitted.push(frame.timestamp);
        }

        // Sampled entries only: records 0, 2, 4.
        assert_eq!(emitted.len(), 3);
        // In order, and a strict subset of the original tick timestamps.
        let mut sorted = emitted.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(emitted, sorted);
        for ts in &emitted {
            assert!(ticks.contains(ts));
        }
    }

    #[test]
    fn end_of_recording_is_an_acquisition_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.trec");
        write_recording(&path);

        let mut spec = replay_spec(&path);
        spec.speed = Some(1000.0);
        let mut sensor = ReplaySensor::load(&spec).unwrap();
        sensor.connect().unwrap();

        while sensor.acquire().is_ok() {}
        let err = sensor.acquire().unwrap_err();
        assert!(err.to_string().contains("end of recording"));
    }

    #[test]
    fn missing_source_rejected_at_load() {
        let spec = SensorSpec::new("thumb", SensorKind::Replay);
        assert!(ReplaySensor::load(&spec).is_err());
    }

    #[test]
    fn unknown_member_yields_no_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.trec");
        write_recording(&path);

        let spec = SensorSpec::new("pinky", SensorKind::Replay).with_source(&path);
        let sensor = ReplaySensor::load(&spec).unwrap();
        assert_eq!(sensor.remaining(), 0);
    }
}
