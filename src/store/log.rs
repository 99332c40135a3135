//! Append-only event logs and their poll-based readers.
//!
//! Every record the station persists goes through [`EventLogStore::append`],
//! which renders it as `[<timestamp>] <text>\n` and flushes before returning.
//! Consumers read with [`LogReader`], which tails the file directly with its
//! own handle, so running readers never synchronize with the writer and work
//! from a separate process.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::StationError;

/// Append side of the event log store.
///
/// One store serves every log under the station root. Handles are opened
/// lazily in append mode and kept for the lifetime of the store; all appends
/// run behind one async mutex, so records from concurrent writers never
/// interleave within a line.
///
/// Any I/O failure is [`StationError::LogIo`]. Appends are durable: the
/// station treats a failed append as fatal rather than dropping records.
#[derive(Clone, Default)]
pub struct EventLogStore {
    handles: Arc<Mutex<HashMap<PathBuf, File>>>,
}

impl EventLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` to the log at `path` as one timestamped record.
    ///
    /// Parent directories are created on first use. The record is written
    /// and flushed before this returns.
    pub async fn append(&self, path: &Path, text: &str) -> Result<(), StationError> {
        let mut handles = self.handles.lock().await;
        let file = match handles.entry(path.to_path_buf()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|source| log_io(path, source))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|source| log_io(path, source))?;
                slot.insert(file)
            }
        };
        let record = format!("[{}] {text}\n", timestamp());
        file.write_all(record.as_bytes())
            .await
            .map_err(|source| log_io(path, source))?;
        file.flush().await.map_err(|source| log_io(path, source))?;
        Ok(())
    }
}

/// Position-tracked reader over one event log.
///
/// Each poll opens a fresh handle, seeks to the last consumed offset and
/// drains whatever is there, so the reader works across processes and
/// tolerates the file not existing yet (a missing log reads as empty).
/// Only complete records are yielded; a partially written trailing line is
/// carried until its newline shows up.
pub struct LogReader {
    path: PathBuf,
    follow: bool,
    poll: Duration,
    offset: u64,
    partial: LineBuf,
    queued: VecDeque<String>,
}

impl LogReader {
    /// Opens a reader positioned at the start of the log at `path`.
    ///
    /// With `follow`, [`LogReader::next_line`] never returns `None`: it keeps
    /// polling every `poll` until a new record arrives. Without it, `None`
    /// marks the end of the data present when the reader drained the file.
    pub fn open(path: impl Into<PathBuf>, follow: bool, poll: Duration) -> Self {
        Self {
            path: path.into(),
            follow,
            poll,
            offset: 0,
            partial: LineBuf::default(),
            queued: VecDeque::new(),
        }
    }

    /// Returns the next complete record, `None` at end of data (non-follow).
    ///
    /// Cancel-safe: the offset only advances once a poll pass has fully
    /// completed, so a dropped call never loses or duplicates records.
    pub async fn next_line(&mut self) -> Result<Option<String>, StationError> {
        loop {
            if let Some(line) = self.queued.pop_front() {
                return Ok(Some(line));
            }
            let lines = self.poll_new_lines().await?;
            if lines.is_empty() {
                if !self.follow {
                    return Ok(None);
                }
                tokio::time::sleep(self.poll).await;
            } else {
                self.queued.extend(lines);
            }
        }
    }

    /// Performs one non-sleeping poll pass and returns the new complete
    /// records, oldest first. An empty vec means nothing new arrived.
    pub async fn poll_new_lines(&mut self) -> Result<Vec<String>, StationError> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(log_io(&self.path, source)),
        };
        file.seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|source| log_io(&self.path, source))?;
        let mut chunk = Vec::new();
        let read = file
            .read_to_end(&mut chunk)
            .await
            .map_err(|source| log_io(&self.path, source))?;
        self.offset += read as u64;
        self.partial.push(&chunk);
        Ok(self.partial.complete_lines())
    }
}

/// Splits a byte stream into complete lines, carrying a partial tail from
/// one chunk to the next. `\r\n` endings are trimmed to the payload.
#[derive(Default)]
pub(crate) struct LineBuf {
    pending: Vec<u8>,
}

impl LineBuf {
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Drains every newline-terminated line accumulated so far.
    pub(crate) fn complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut record: Vec<u8> = self.pending.drain(..=pos).collect();
            record.pop();
            if record.last() == Some(&b'\r') {
                record.pop();
            }
            lines.push(String::from_utf8_lossy(&record).into_owned());
        }
        lines
    }

    /// Remaining bytes as one final line, for a stream that ended without a
    /// trailing newline.
    pub(crate) fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let record = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&record).into_owned())
    }
}

/// Strips the `[<timestamp>] ` prefix from a stored record, returning the
/// payload text. Lines without the prefix come back unchanged.
pub fn strip_timestamp_prefix(line: &str) -> &str {
    if line.starts_with('[') {
        if let Some(end) = line.find("] ") {
            return &line[end + 2..];
        }
    }
    line
}

/// Record timestamp in the shape consumers expect, e.g. `3/14/2023, 10:38:14 AM`.
fn timestamp() -> String {
    chrono::Local::now()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

fn log_io(path: &Path, source: std::io::Error) -> StationError {
    StationError::LogIo {
        path: path.to_path_buf(),
        source,
    }
}
