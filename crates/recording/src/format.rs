//! Recording file format
//!
//! Layout:
//!
//! ```text
//! magic "TREC" | version u16 LE | manifest len u32 LE | manifest (JSON)
//! record len u32 LE | record (bincode)   -- repeated until EOF
//! ```
//!
//! Length prefixes are u32 little-endian. The manifest is framed as
//! JSON (it carries the tagged widget schema and stays peekable with a
//! text editor); records are bincode. The manifest snapshots the group
//! configuration so a recording is self-describing: replay can
//! re-assemble the group without the original config document.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use contracts::{GroupBlueprint, RigError, SensorId, SensorKind, SensorSpec, WidgetSpec};

/// File magic
pub const MAGIC: [u8; 4] = *b"TREC";

/// Format version
pub const VERSION: u16 = 1;

/// Upper bound for a single framed blob. Anything larger means a
/// corrupt length prefix.
pub const MAX_FRAME_LEN: u32 = 256 * 1024 * 1024;

/// Group configuration snapshot stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Recording group name
    pub group_name: String,

    /// RFC3339 creation timestamp
    pub created_at: String,

    /// Member sensors at capture time
    pub sensors: Vec<ManifestSensor>,

    /// Annotation widget declarations
    pub payload: Vec<WidgetSpec>,
}

/// One member sensor as recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSensor {
    pub name: SensorId,
    pub kind: SensorKind,
    pub sampling_frequency: f64,
    pub recording_frequency: f64,
}

impl Manifest {
    /// Snapshot a blueprint at recording start.
    pub fn from_blueprint(blueprint: &GroupBlueprint) -> Self {
        Self {
            group_name: blueprint.group_name.clone(),
            created_at: Utc::now().to_rfc3339(),
            sensors: blueprint
                .sensors
                .iter()
                .map(|s| ManifestSensor {
                    name: s.name.clone(),
                    kind: s.kind,
                    sampling_frequency: s.sampling_frequency,
                    recording_frequency: s.recording_frequency,
                })
                .collect(),
            payload: blueprint.payload.clone(),
        }
    }

    /// Build an all-replay blueprint reading back from `source`.
    ///
    /// Every recorded member becomes a replay sensor with the original
    /// frequencies, so a recorded session can be re-opened as a live
    /// group.
    pub fn replay_blueprint(&self, source: &Path) -> GroupBlueprint {
        GroupBlueprint {
            group_name: self.group_name.clone(),
            destination: None,
            group_frequency: None,
            sensors: self
                .sensors
                .iter()
                .map(|s| {
                    SensorSpec::new(s.name.clone(), SensorKind::Replay)
                        .with_frequencies(s.sampling_frequency, s.recording_frequency)
                        .with_source(source)
                })
                .collect(),
            payload: self.payload.clone(),
        }
    }
}

/// Wrap a bincode error as a storage error for `path`.
pub(crate) fn codec_error(path: &Path, err: impl std::fmt::Display) -> RigError {
    RigError::storage(path.display().to_string(), format!("codec error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_blueprint_mirrors_members() {
        let blueprint = GroupBlueprint {
            group_name: "hand".into(),
            destination: Some("datasets/hand.trec".into()),
            group_frequency: None,
            sensors: vec![
                SensorSpec::new("thumb", SensorKind::Digit).with_frequencies(60.0, 30.0)
            ],
            payload: vec![],
        };
        let manifest = Manifest::from_blueprint(&blueprint);
        let replay = manifest.replay_blueprint(Path::new("datasets/hand.trec"));

        assert_eq!(replay.sensors.len(), 1);
        assert_eq!(replay.sensors[0].kind, SensorKind::Replay);
        assert_eq!(replay.sensors[0].recording_frequency, 30.0);
        assert!(replay.sensors[0].source.is_some());
        assert!(replay.destination.is_none());
    }
}
