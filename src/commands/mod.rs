//! Reader commands behind the `station` subcommands.
//!
//! Every command here reads the log store directly: no singleton lock, no
//! wallet address, and nothing on this path creates directories, so the
//! commands run concurrently with a supervisor or entirely without one.
//! Output goes to stdout and is flushed per line; a consumer closing the
//! pipe ends the command cleanly.

mod activity;
mod events;
mod logs;
mod metrics;

pub use activity::print_activity;
pub use events::stream_events;
pub use logs::print_logs;
pub use metrics::print_metrics;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::StationError;
use crate::store::LogReader;

/// Writes one line and flushes it through. `false` means the consumer went
/// away (closed pipe) and the command should stop.
fn emit(out: &mut impl Write, line: &str) -> bool {
    writeln!(out, "{line}").and_then(|()| out.flush()).is_ok()
}

/// Prints a log as stored, timestamps included; with `follow`, keeps
/// tailing it.
async fn tail(path: &Path, follow: bool, poll: Duration) -> Result<(), StationError> {
    let mut reader = LogReader::open(path, follow, poll);
    let mut stdout = std::io::stdout();
    while let Some(line) = reader.next_line().await? {
        if !emit(&mut stdout, &line) {
            break;
        }
    }
    Ok(())
}
