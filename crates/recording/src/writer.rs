//! RecordingWriter - append-only record persistence
//!
//! One writer per path at a time, enforced with a sibling `.lock` file
//! created with `create_new`. A second writer fails fast with a storage
//! error instead of corrupting the recording.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use contracts::{Record, RigError};

use crate::format::{self, Manifest, MAGIC, VERSION};

/// Append-only writer for one recording file.
#[derive(Debug)]
pub struct RecordingWriter {
    path: PathBuf,
    lock_path: PathBuf,
    writer: BufWriter<File>,
    last_timestamp: Option<f64>,
    records_written: u64,
    finished: bool,
}

impl RecordingWriter {
    /// Create a new recording at `path` and write the header.
    ///
    /// # Errors
    /// - the file already exists (recordings are write-once)
    /// - another writer holds the lock for this path
    /// - any I/O failure
    pub fn create(path: impl Into<PathBuf>, manifest: &Manifest) -> Result<Self, RigError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| storage(&path, format!("cannot create parent dirs: {e}")))?;
            }
        }

        let lock_path = lock_path_for(&path);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                storage(
                    &path,
                    format!("another writer holds the lock ({}): {e}", lock_path.display()),
                )
            })?;

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) => {
                let _ = fs::remove_file(&lock_path);
                return Err(storage(&path, format!("cannot create recording: {e}")));
            }
        };

        let mut writer = BufWriter::new(file);
        let header_result = (|| -> Result<(), RigError> {
            writer.write_all(&MAGIC).map_err(|e| storage(&path, e))?;
            writer
                .write_all(&VERSION.to_le_bytes())
                .map_err(|e| storage(&path, e))?;
            let manifest_bytes =
                serde_json::to_vec(manifest).map_err(|e| format::codec_error(&path, e))?;
            write_framed(&mut writer, &path, &manifest_bytes)
        })();

        if let Err(e) = header_result {
            let _ = fs::remove_file(&lock_path);
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        debug!(path = %path.display(), group = %manifest.group_name, "recording created");

        Ok(Self {
            path,
            lock_path,
            writer,
            last_timestamp: None,
            records_written: 0,
            finished: false,
        })
    }

    /// Append one record, preserving arrival order.
    ///
    /// Timestamps must be non-decreasing; a violation is a storage
    /// error, as is any I/O failure. Either ends the recording session.
    pub fn append(&mut self, record: &Record) -> Result<(), RigError> {
        if let Some(last) = self.last_timestamp {
            if record.timestamp < last {
                return Err(storage(
                    &self.path,
                    format!(
                        "non-monotonic record timestamp: {} after {}",
                        record.timestamp, last
                    ),
                ));
            }
        }

        let bytes =
            bincode::serialize(record).map_err(|e| format::codec_error(&self.path, e))?;
        write_framed(&mut self.writer, &self.path, &bytes)?;

        self.last_timestamp = Some(record.timestamp);
        self.records_written += 1;
        Ok(())
    }

    /// Flush buffered records to the OS.
    pub fn flush(&mut self) -> Result<(), RigError> {
        self.writer.flush().map_err(|e| storage(&self.path, e))
    }

    /// Flush, sync, and release the writer lock. Returns the number of
    /// records written.
    pub fn finish(mut self) -> Result<u64, RigError> {
        self.writer.flush().map_err(|e| storage(&self.path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| storage(&self.path, e))?;
        self.finished = true;
        let _ = fs::remove_file(&self.lock_path);
        debug!(
            path = %self.path.display(),
            records = self.records_written,
            "recording finished"
        );
        Ok(self.records_written)
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RecordingWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.writer.flush() {
                warn!(path = %self.path.display(), error = %e, "flush on drop failed");
            }
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

pub(crate) fn lock_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".lock");
    PathBuf::from(os)
}

fn write_framed(writer: &mut BufWriter<File>, path: &Path, bytes: &[u8]) -> Result<(), RigError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| storage(path, "record exceeds the maximum frame size"))?;
    writer
        .write_all(&len.to_le_bytes())
        .map_err(|e| storage(path, e))?;
    writer.write_all(bytes).map_err(|e| storage(path, e))?;
    Ok(())
}

fn storage(path: &Path, message: impl std::fmt::Display) -> RigError {
    RigError::storage(path.display().to_string(), message.to_string())
}
