//! File sink: append-only JSON records in a bounded local file
//!
//! Each record is written with a single `write_all` of the serialized object
//! plus separator, so the file is always a sequence of whole records unless a
//! write is interrupted by the OS. The sink also remembers how much of the
//! file has been handed out by [`FileSink::size_delta`], which lets the upload
//! path read only what was appended since the last read.

use crate::core::{Appender, LogRecord, LoggerError, RecordIdentity, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
    /// Append cursor: bytes in the file as of the last write we observed
    size: u64,
    /// Bytes already returned by `size_delta`
    last_file_size: u64,
    max_bytes: Option<u64>,
}

impl FileSink {
    /// Create a sink for `path`. The file is opened lazily on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            size: 0,
            last_file_size: 0,
            max_bytes: None,
        }
    }

    /// Cap the file size in bytes
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Current size as tracked by the append cursor
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Bytes appended since the last `size_delta`
    pub fn unread_len(&self) -> u64 {
        self.size.saturating_sub(self.last_file_size)
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    fn ensure_open(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| {
                    LoggerError::file_sink(self.path_str(), format!("Failed to open: {}", e))
                })?;

            self.size = file
                .metadata()
                .map_err(|e| {
                    LoggerError::file_sink(
                        self.path_str(),
                        format!("Cannot access file metadata: {}", e),
                    )
                })?
                .len();
            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| LoggerError::file_sink(self.path.display().to_string(), "not open"))
    }

    /// Whether `additional` bytes fit under the configured cap. An empty file
    /// always has room so an oversized record is still written once.
    pub fn has_room_for(&mut self, additional: u64) -> Result<bool> {
        self.ensure_open()?;
        Ok(match self.max_bytes {
            Some(max) => self.size == 0 || self.size + additional <= max,
            None => true,
        })
    }

    /// Append one already-serialized, separator-terminated record
    pub fn append_line(&mut self, line: &[u8]) -> Result<()> {
        let path = self.path_str();
        let file = self.ensure_open()?;

        lock(file, &path)?;
        let written = file.write_all(line);
        unlock(file);

        written.map_err(|e| LoggerError::file_sink(path, format!("Failed to write record: {}", e)))?;
        self.size += line.len() as u64;
        Ok(())
    }

    /// Full file contents. A file that was never created reads as empty.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(LoggerError::file_sink(
                self.path_str(),
                format!("Failed to read: {}", e),
            )),
        }
    }

    /// Empty the file and reset size tracking
    pub fn truncate(&mut self) -> Result<()> {
        let path = self.path_str();
        let file = self.ensure_open()?;

        lock(file, &path)?;
        let result = file.set_len(0);
        unlock(file);

        result.map_err(|e| LoggerError::file_sink(path, format!("Failed to truncate: {}", e)))?;
        self.size = 0;
        self.last_file_size = 0;
        Ok(())
    }

    /// Bytes appended since the previous call. Advances the read mark only
    /// after the read succeeds.
    pub fn size_delta(&mut self) -> Result<Vec<u8>> {
        let mut reader = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LoggerError::file_sink(
                    self.path_str(),
                    format!("Failed to open for reading: {}", e),
                ))
            }
        };

        let current = reader
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(self.path_str(), format!("Cannot access file metadata: {}", e))
            })?
            .len();

        // Shrunk underneath us: start over from the beginning.
        if current < self.last_file_size {
            self.last_file_size = 0;
        }

        let mut delta = Vec::with_capacity((current - self.last_file_size) as usize);
        reader
            .seek(SeekFrom::Start(self.last_file_size))
            .and_then(|_| reader.read_to_end(&mut delta))
            .map_err(|e| {
                LoggerError::file_sink(self.path_str(), format!("Failed to read delta: {}", e))
            })?;

        self.last_file_size += delta.len() as u64;
        self.size = self.size.max(self.last_file_size);
        Ok(delta)
    }
}

impl Appender for FileSink {
    fn append(&mut self, record: &LogRecord, identity: &RecordIdentity) -> Result<()> {
        let line = record.to_json_line(identity)?;
        self.append_line(&line)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.file {
            file.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(feature = "file-lock")]
fn lock(file: &File, path: &str) -> Result<()> {
    fs2::FileExt::lock_exclusive(file)
        .map_err(|e| LoggerError::file_sink(path, format!("Failed to acquire file lock: {}", e)))
}

#[cfg(feature = "file-lock")]
fn unlock(file: &File) {
    let _ = fs2::FileExt::unlock(file);
}

#[cfg(not(feature = "file-lock"))]
fn lock(_file: &File, _path: &str) -> Result<()> {
    Ok(())
}

#[cfg(not(feature = "file-lock"))]
fn unlock(_file: &File) {}
