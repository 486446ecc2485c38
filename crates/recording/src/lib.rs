//! # Recording
//!
//! Durable, ordered persistence of group records, and symmetric
//! retrieval for replay.
//!
//! - `RecordingWriter`: append-only, single writer per path (lock file),
//!   monotonic timestamps
//! - `RecordingReader`: lazy, restartable, deterministic iteration
//! - `StoreSink` / `LogSink`: `RecordSink` implementations for the group
//!   tick loop
//!
//! The file format is private to this crate; external callers only rely
//! on "openable by this reader".

mod format;
mod reader;
mod sinks;
mod writer;

pub use format::{Manifest, ManifestSensor};
pub use reader::{RecordIter, RecordingReader};
pub use sinks::{LogSink, StoreSink};
pub use writer::RecordingWriter;
