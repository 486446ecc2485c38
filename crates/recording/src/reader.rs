//! RecordingReader - deterministic record retrieval
//!
//! Re-opening the same path always reproduces the identical record
//! sequence; `records()` can be called any number of times and each
//! iterator starts from the first record.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use contracts::{Record, RigError};

use crate::format::{self, Manifest, MAGIC, MAX_FRAME_LEN, VERSION};

/// Reader for one recording file.
#[derive(Debug)]
pub struct RecordingReader {
    path: PathBuf,
    manifest: Manifest,
    records_offset: u64,
}

impl RecordingReader {
    /// Open a recording and parse its header.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RigError> {
        let path = path.into();
        let file = File::open(&path)
            .map_err(|e| storage(&path, format!("cannot open recording: {e}")))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| storage(&path, format!("cannot read header: {e}")))?;
        if magic != MAGIC {
            return Err(storage(&path, "not a recording file (bad magic)"));
        }

        let mut version = [0u8; 2];
        reader
            .read_exact(&mut version)
            .map_err(|e| storage(&path, format!("cannot read header: {e}")))?;
        let version = u16::from_le_bytes(version);
        if version != VERSION {
            return Err(storage(
                &path,
                format!("unsupported recording version {version} (expected {VERSION})"),
            ));
        }

        let manifest_bytes = read_framed(&mut reader, &path)?
            .ok_or_else(|| storage(&path, "truncated header: missing manifest"))?;
        let manifest: Manifest =
            serde_json::from_slice(&manifest_bytes).map_err(|e| format::codec_error(&path, e))?;

        let records_offset = reader
            .stream_position()
            .map_err(|e| storage(&path, e))?;

        Ok(Self {
            path,
            manifest,
            records_offset,
        })
    }

    /// The group configuration snapshot taken at recording time.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A lazy iterator over all records, in the exact order written.
    ///
    /// Each call opens a fresh cursor at the first record, so the
    /// sequence is restartable.
    pub fn records(&self) -> Result<RecordIter, RigError> {
        let file = File::open(&self.path)
            .map_err(|e| storage(&self.path, format!("cannot open recording: {e}")))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(self.records_offset))
            .map_err(|e| storage(&self.path, e))?;
        Ok(RecordIter {
            reader,
            path: self.path.clone(),
            poisoned: false,
        })
    }
}

/// Lazy, finite record iterator.
pub struct RecordIter {
    reader: BufReader<File>,
    path: PathBuf,
    poisoned: bool,
}

impl Iterator for RecordIter {
    type Item = Result<Record, RigError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        match read_framed(&mut self.reader, &self.path) {
            Ok(None) => None,
            Ok(Some(bytes)) => match bincode::deserialize(&bytes) {
                Ok(record) => Some(Ok(record)),
                Err(e) => {
                    self.poisoned = true;
                    Some(Err(format::codec_error(&self.path, e)))
                }
            },
            Err(e) => {
                self.poisoned = true;
                Some(Err(e))
            }
        }
    }
}

/// Read one length-prefixed blob; `None` on clean EOF.
fn read_framed(reader: &mut BufReader<File>, path: &Path) -> Result<Option<Vec<u8>>, RigError> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = reader
            .read(&mut len_buf[filled..])
            .map_err(|e| storage(path, e))?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(storage(path, "truncated record length prefix"));
        }
        filled += n;
    }

    let len = u32::from_le_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(storage(
            path,
            format!("corrupt length prefix: {len} bytes"),
        ));
    }

    let mut bytes = vec![0u8; len as usize];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| storage(path, format!("truncated record body: {e}")))?;
    Ok(Some(bytes))
}

fn storage(path: &Path, message: impl std::fmt::Display) -> RigError {
    RigError::storage(path.display().to_string(), message.to_string())
}
