//! Error types used by the station runtime and the module event decoder.
//!
//! This module defines two error enums:
//!
//! - [`StationError`] — failures raised by the station itself: the singleton
//!   lock, the log store, and the shutdown sequence.
//! - [`DecodeError`] — failures while decoding a single event line printed by
//!   a module process.
//!
//! [`StationError`] provides helper methods (`as_label`, `as_message`) for
//! logging; decode failures are non-fatal and are only ever logged.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the station runtime.
///
/// These represent failures of the station process itself. Module processes
/// crashing is *not* an error here; that is recorded as activity instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StationError {
    /// Another live station owns the state directory.
    #[error("Station Core is already running (pid {pid}, state root: {root:?})")]
    AlreadyRunning {
        /// State root directory the lock protects.
        root: PathBuf,
        /// Process id recorded in the lock file.
        pid: u32,
    },

    /// Reading or writing the lock file failed for a reason other than contention.
    #[error("lock file {path:?}: {source}")]
    LockIo {
        /// Path of the lock file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Appending to or reading from an event log failed.
    #[error("event log {path:?}: {source}")]
    LogIo {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A record failed to serialize before it could be appended.
    #[error("encode record: {source}")]
    Encode {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// No wallet address was provided; modules cannot be started without one.
    #[error("FIL_WALLET_ADDRESS is not set; a wallet address is required to run modules")]
    WalletRequired,

    /// Shutdown grace period was exceeded; some workers remained stuck and were force-terminated.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the workers that did not stop in time.
        stuck: Vec<String>,
    },
}

impl StationError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use station_core::StationError;
    ///
    /// let err = StationError::WalletRequired;
    /// assert_eq!(err.as_label(), "wallet_required");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StationError::AlreadyRunning { .. } => "already_running",
            StationError::LockIo { .. } => "lock_io",
            StationError::LogIo { .. } => "log_io",
            StationError::Encode { .. } => "encode",
            StationError::WalletRequired => "wallet_required",
            StationError::GraceExceeded { .. } => "grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StationError::AlreadyRunning { root, pid } => {
                format!("already running: pid={pid} root={root:?}")
            }
            StationError::LockIo { path, source } => format!("lock io: {path:?}: {source}"),
            StationError::LogIo { path, source } => format!("log io: {path:?}: {source}"),
            StationError::Encode { source } => format!("encode: {source}"),
            StationError::WalletRequired => "wallet address required".to_string(),
            StationError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck workers={stuck:?}")
            }
        }
    }
}

/// # Errors produced while decoding one module event line.
///
/// Modules emit one JSON object per stdout line. A line that fails to decode
/// is skipped; the stream itself keeps going.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The line is not valid JSON, or a known event is missing required fields.
    #[error("malformed event: {reason}")]
    Malformed {
        /// What exactly failed to parse.
        reason: String,
    },

    /// The line is valid JSON but carries an event type the station does not support.
    #[error("unsupported event type: {event_type}")]
    Unsupported {
        /// The unrecognized `type` value.
        event_type: String,
    },
}
