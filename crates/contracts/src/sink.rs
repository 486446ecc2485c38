//! RecordSink trait - record output interface
//!
//! The group tick loop is the only writer; where the records go (a
//! recording store, or just the log when no destination is configured)
//! hides behind this trait.

use crate::{Record, RigError};

/// Record output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one record, preserving arrival order
    ///
    /// # Errors
    /// A storage error here is fatal to the recording session and must
    /// be surfaced, not swallowed.
    async fn write(&mut self, record: &Record) -> Result<(), RigError>;

    /// Flush buffered data (if any)
    async fn flush(&mut self) -> Result<(), RigError>;

    /// Close the sink. Called exactly once at teardown.
    async fn close(&mut self) -> Result<(), RigError>;
}
