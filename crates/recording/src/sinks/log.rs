//! LogSink - logs record summaries via tracing
//!
//! Used when a group runs without a persistence destination.

use contracts::{Record, RecordSink, RigError};
use tracing::{info, instrument};

/// Sink that logs record summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_record_summary(&self, record: &Record) {
        info!(
            sink = %self.name,
            timestamp = record.timestamp,
            sensors = record.frames.len(),
            sampled = record.sampled_count(),
            absent = record.absent_sensors().len(),
            "Record received"
        );
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, record),
        fields(sink = %self.name, timestamp = record.timestamp)
    )]
    async fn write(&mut self, record: &Record) -> Result<(), RigError> {
        self.log_record_summary(record);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), RigError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), RigError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
