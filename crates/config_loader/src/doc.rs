//! Raw group-document model
//!
//! The shape of a configuration document before validation. Everything a
//! document may carry is optional or a plain string here; validation
//! resolves tags, applies defaults, and produces the typed
//! `GroupBlueprint`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A group description as found in a TOML/JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDoc {
    /// Group name
    pub group_name: String,

    /// Recording destination (optional; no persistence when absent)
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Explicit group capture rate (Hz)
    #[serde(default)]
    pub group_frequency: Option<f64>,

    /// Sensor entries
    #[serde(default)]
    pub sensors: Vec<SensorDoc>,

    /// Annotation widget entries
    #[serde(default)]
    pub payload: Vec<WidgetDoc>,
}

/// One raw sensor entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDoc {
    /// Type tag, resolved against the known sensor kinds at validation
    pub sensor_type: String,

    /// Sensor name, unique within the group
    pub sensor_name: String,

    #[serde(default)]
    pub sampling_frequency: Option<f64>,

    #[serde(default)]
    pub recording_frequency: Option<f64>,

    #[serde(default)]
    pub serial_id: Option<String>,

    /// Illumination intensity triplet (digit)
    #[serde(default)]
    pub rgb: Option<Vec<u8>>,

    /// "VGA" or "QVGA" (digit)
    #[serde(default)]
    pub resolution: Option<String>,

    /// 30 or 60 (digit)
    #[serde(default)]
    pub fps: Option<u32>,

    /// Eight RGB triplets (digit360)
    #[serde(default)]
    pub led_values: Option<Vec<Vec<u8>>>,

    /// Recording to replay from (replay)
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Playback speed multiplier (replay)
    #[serde(default)]
    pub speed: Option<f64>,

    /// Fixed re-emit cadence (replay)
    #[serde(default)]
    pub fixed_cadence_hz: Option<f64>,
}

/// One raw widget entry.
///
/// `default` stays an untyped value until the widget kind is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetDoc {
    /// Widget type tag ("slider", "text_input", "checkbox",
    /// "selectbox", "multiselect")
    #[serde(rename = "type")]
    pub widget_type: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub min_value: Option<f64>,

    #[serde(default)]
    pub max_value: Option<f64>,

    #[serde(default)]
    pub step: Option<f64>,

    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub default: Option<serde_json::Value>,
}
