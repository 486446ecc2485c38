//! GroupBlueprint - Config Loader output
//!
//! The fully-typed description of one sensor group: members, recording
//! destination, group rate, annotation widgets. Produced by validation,
//! consumed by group assembly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Resolution, SensorId, SensorKind, WidgetSpec};

/// Default native polling rate for camera-based devices (Hz).
pub const DEFAULT_SAMPLING_HZ: f64 = 30.0;

/// Complete group description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBlueprint {
    /// Group name
    pub group_name: String,

    /// Recording destination; `None` runs the group without persistence
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Explicit group capture rate (Hz); defaults to the maximum member
    /// recording frequency
    #[serde(default)]
    pub group_frequency: Option<f64>,

    /// Member sensors (names unique)
    pub sensors: Vec<SensorSpec>,

    /// Annotation widget declarations (labels unique)
    #[serde(default)]
    pub payload: Vec<WidgetSpec>,
}

impl GroupBlueprint {
    /// The rate the group tick loop runs at: the configured
    /// `group_frequency`, or the fastest member recording frequency.
    pub fn effective_frequency(&self) -> f64 {
        self.group_frequency.unwrap_or_else(|| {
            self.sensors
                .iter()
                .map(|s| s.recording_frequency)
                .fold(0.0, f64::max)
        })
    }

    pub fn sensor(&self, name: &str) -> Option<&SensorSpec> {
        self.sensors.iter().find(|s| s.name == name)
    }
}

/// One validated sensor entry.
///
/// Per-kind fields are optional at the type level; validation guarantees
/// the mandatory ones are present and the unsupported ones are unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Unique (within the group) sensor name
    pub name: SensorId,

    /// Device family
    pub kind: SensorKind,

    /// Native polling rate (Hz), > 0
    pub sampling_frequency: f64,

    /// Persisted rate (Hz), 0 < fr <= fs
    pub recording_frequency: f64,

    /// Device serial (Digit, Digit360)
    #[serde(default)]
    pub serial_id: Option<String>,

    /// Illumination intensity 0-15 per channel (Digit)
    #[serde(default)]
    pub rgb: Option<[u8; 3]>,

    /// Camera resolution (Digit)
    #[serde(default)]
    pub resolution: Option<Resolution>,

    /// Camera frame rate, 30 or 60 (Digit)
    #[serde(default)]
    pub fps: Option<u32>,

    /// Ring LED colors, eight RGB triplets (Digit360)
    #[serde(default)]
    pub led_values: Option<[[u8; 3]; 8]>,

    /// Recording to replay from (Replay)
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Playback speed multiplier (Replay), defaults to 1.0
    #[serde(default)]
    pub speed: Option<f64>,

    /// Re-emit at a fixed cadence instead of the original deltas (Replay)
    #[serde(default)]
    pub fixed_cadence_hz: Option<f64>,
}

impl SensorSpec {
    /// A spec with kind-appropriate defaults, for programmatic assembly.
    pub fn new(name: impl Into<SensorId>, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sampling_frequency: DEFAULT_SAMPLING_HZ,
            recording_frequency: DEFAULT_SAMPLING_HZ,
            serial_id: None,
            rgb: None,
            resolution: None,
            fps: None,
            led_values: None,
            source: None,
            speed: None,
            fixed_cadence_hz: None,
        }
    }

    pub fn with_frequencies(mut self, sampling: f64, recording: f64) -> Self {
        self.sampling_frequency = sampling;
        self.recording_frequency = recording;
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_id = Some(serial.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}
