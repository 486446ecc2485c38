//! StoreSink - persists records through a RecordingWriter

use contracts::{Record, RecordSink, RigError};
use tracing::{debug, instrument};

use crate::writer::RecordingWriter;

/// Sink backed by a recording file.
pub struct StoreSink {
    name: String,
    writer: Option<RecordingWriter>,
}

impl StoreSink {
    /// Wrap an open writer.
    pub fn new(name: impl Into<String>, writer: RecordingWriter) -> Self {
        Self {
            name: name.into(),
            writer: Some(writer),
        }
    }

    fn writer_mut(&mut self) -> Result<&mut RecordingWriter, RigError> {
        self.writer
            .as_mut()
            .ok_or_else(|| RigError::storage(self.name.clone(), "sink already closed"))
    }
}

impl RecordSink for StoreSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "store_sink_write",
        skip(self, record),
        fields(sink = %self.name, timestamp = record.timestamp)
    )]
    async fn write(&mut self, record: &Record) -> Result<(), RigError> {
        self.writer_mut()?.append(record)
    }

    #[instrument(name = "store_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), RigError> {
        self.writer_mut()?.flush()
    }

    #[instrument(name = "store_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), RigError> {
        if let Some(writer) = self.writer.take() {
            let records = writer.finish()?;
            debug!(sink = %self.name, records, "StoreSink closed");
        }
        Ok(())
    }
}
