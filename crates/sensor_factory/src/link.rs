//! DeviceLink trait - vendor channel abstraction
//!
//! The narrow seam the per-device vendor bindings implement. The core
//! never talks to vendor SDKs directly: a sensor variant owns a
//! `Box<dyn DeviceLink>` and translates its raw payloads into frames.
//! The built-in [`SyntheticLink`](crate::SyntheticLink) stands in when
//! no hardware is attached.

use thiserror::Error;

use contracts::{FramePayload, SensorOption};

/// Errors at the vendor-channel layer.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The device cannot be reached (bad serial, unplugged, busy).
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// The channel dropped mid-stream.
    #[error("channel dropped: {0}")]
    Dropped(String),

    /// The device refused an option value.
    #[error("option rejected: {0}")]
    Rejected(String),
}

/// Vendor channel contract.
///
/// `next_payload` blocks for at most roughly one native sample period;
/// a disconnected device errors instead of blocking forever.
pub trait DeviceLink: Send {
    /// Open the underlying channel. Idempotent.
    fn open(&mut self) -> Result<(), LinkError>;

    /// Block until the next raw payload at the device's native cadence.
    fn next_payload(&mut self) -> Result<FramePayload, LinkError>;

    /// Push one option down to the device.
    fn apply(&mut self, option: &SensorOption) -> Result<(), LinkError>;

    /// Close the channel. Idempotent.
    fn close(&mut self);
}
