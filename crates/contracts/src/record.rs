//! Record - one group capture tick
//!
//! Aggregates the most recent decimated frame of every member sensor
//! plus the annotation payload snapshot at the tick instant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Frame, PayloadSnapshot, SensorId};

/// One group-level capture tick.
///
/// Keys are member sensor names; a `BTreeMap` keeps the serialized key
/// order stable so a persisted record always re-reads byte-identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Tick timestamp, seconds since capture start. Non-decreasing
    /// across a recording.
    pub timestamp: f64,

    /// One entry per member sensor
    pub frames: BTreeMap<SensorId, FrameEntry>,

    /// Annotation values at the tick instant
    pub payload: PayloadSnapshot,
}

impl Record {
    /// Sensors whose entry is `Absent` in this record.
    pub fn absent_sensors(&self) -> Vec<&SensorId> {
        self.frames
            .iter()
            .filter(|(_, entry)| matches!(entry, FrameEntry::Absent))
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of freshly sampled frames in this record.
    pub fn sampled_count(&self) -> usize {
        self.frames
            .values()
            .filter(|entry| matches!(entry, FrameEntry::Sampled(_)))
            .count()
    }
}

/// One member sensor's contribution to a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FrameEntry {
    /// A frame that arrived since the previous tick
    Sampled(Frame),

    /// The last known frame, repeated because the member produced
    /// nothing new between ticks
    Repeated(Frame),

    /// No data: the sensor failed or has not produced a frame yet.
    /// Never zero-filled.
    Absent,
}

impl FrameEntry {
    /// The carried frame, if any.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            FrameEntry::Sampled(frame) | FrameEntry::Repeated(frame) => Some(frame),
            FrameEntry::Absent => None,
        }
    }

    /// True only for frames newly sampled this tick.
    pub fn is_fresh(&self) -> bool {
        matches!(self, FrameEntry::Sampled(_))
    }
}
