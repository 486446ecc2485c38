//! # Capture Engine
//!
//! Synchronized multi-sensor capture: the rate decimator, the record
//! assembler, the annotation payload board, and the sensor group with
//! its tick loop.
//!
//! Group control surface:
//! - [`SensorGroup::assemble`] → [`SensorGroup::start`] → [`RunningGroup`]
//! - [`RunningGroup::set_annotation`] / [`RunningGroup::sensor_states`]
//! - [`RunningGroup::stop`] → [`CaptureStats`]
//! - [`replay`] to read a recorded session back

mod assembler;
mod decimator;
mod group;
mod payload;
mod runner;

pub use assembler::RecordAssembler;
pub use decimator::RateDecimator;
pub use group::{CaptureStats, RunningGroup, SensorGroup};
pub use payload::PayloadBoard;

use std::path::Path;

use contracts::RigError;
use recording::{RecordIter, RecordingReader};

/// Open a recorded session and iterate its records in original order.
///
/// The sequence is lazy, finite, and deterministic: replaying the same
/// path always yields the identical record sequence.
pub fn replay(path: impl AsRef<Path>) -> Result<RecordIter, RigError> {
    let reader = RecordingReader::open(path.as_ref())?;
    reader.records()
}
