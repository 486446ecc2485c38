//! RecordAssembler - per-tick frame selection
//!
//! Tracks the most recent decimated frame of every member between
//! ticks, and turns one tick into one `Record`. Pure state machine, no
//! clocks, so tick behavior is testable offline.
//!
//! Slow-member policy: a member that produced nothing since the last
//! tick contributes its last known frame marked `Repeated`; a failed
//! member (or one that never produced) contributes `Absent`. Frames are
//! never fabricated.

use std::collections::BTreeMap;

use contracts::{Frame, FrameEntry, PayloadSnapshot, Record, SensorId};

#[derive(Debug, Default)]
struct Slot {
    last: Option<Frame>,
    fresh: bool,
    failed: bool,
}

/// Latest-frame bookkeeping for one group.
#[derive(Debug)]
pub struct RecordAssembler {
    slots: BTreeMap<SensorId, Slot>,
}

impl RecordAssembler {
    /// One slot per member sensor.
    pub fn new(members: impl IntoIterator<Item = SensorId>) -> Self {
        Self {
            slots: members
                .into_iter()
                .map(|id| (id, Slot::default()))
                .collect(),
        }
    }

    /// Accept a decimated frame from a member. Frames from failed or
    /// unknown members are discarded.
    pub fn offer(&mut self, frame: Frame) {
        if let Some(slot) = self.slots.get_mut(&frame.sensor) {
            if slot.failed {
                return;
            }
            slot.last = Some(frame);
            slot.fresh = true;
        }
    }

    /// Mark a member failed; its subsequent entries are `Absent`.
    pub fn mark_failed(&mut self, sensor: &SensorId) {
        if let Some(slot) = self.slots.get_mut(sensor) {
            slot.failed = true;
            slot.fresh = false;
            slot.last = None;
        }
    }

    pub fn is_failed(&self, sensor: &SensorId) -> bool {
        self.slots.get(sensor).map(|s| s.failed).unwrap_or(false)
    }

    /// All members failed: nothing will ever arrive again.
    pub fn all_failed(&self) -> bool {
        !self.slots.is_empty() && self.slots.values().all(|s| s.failed)
    }

    /// Build the record for one tick and reset freshness.
    pub fn assemble(&mut self, timestamp: f64, payload: PayloadSnapshot) -> Record {
        let mut frames = BTreeMap::new();
        for (sensor, slot) in &mut self.slots {
            let entry = if slot.failed {
                FrameEntry::Absent
            } else {
                match (&slot.last, slot.fresh) {
                    (Some(frame), true) => FrameEntry::Sampled(frame.clone()),
                    (Some(frame), false) => FrameEntry::Repeated(frame.clone()),
                    (None, _) => FrameEntry::Absent,
                }
            };
            slot.fresh = false;
            frames.insert(sensor.clone(), entry);
        }
        Record {
            timestamp,
            frames,
            payload,
        }
    }
}
