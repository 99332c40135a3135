//! `station metrics`: the authoritative metrics snapshot.

use crate::config::Config;
use crate::error::StationError;
use crate::store::{read_latest_snapshot, strip_timestamp_prefix, LogReader, MetricsSnapshot};

use super::emit;

/// Prints the latest snapshot as pretty JSON; the zero snapshot when no
/// metrics were ever written. With `follow`, reprints a fresh snapshot
/// every time a metrics record lands.
pub async fn print_metrics(cfg: &Config, follow: bool) -> Result<(), StationError> {
    let mut stdout = std::io::stdout();
    if !follow {
        let snapshot = read_latest_snapshot(&cfg.paths.metrics).await?;
        emit(&mut stdout, &render(&snapshot)?);
        return Ok(());
    }

    // Drain the history before the first print so the reader's position
    // covers everything the initial snapshot shows; records arriving after
    // that print exactly once.
    let mut reader = LogReader::open(&cfg.paths.metrics, true, cfg.follow_poll);
    let mut current = MetricsSnapshot::zero();
    for line in reader.poll_new_lines().await? {
        if let Some(snapshot) = parse_record(&line) {
            current = snapshot;
        }
    }
    if !emit(&mut stdout, &render(&current)?) {
        return Ok(());
    }
    loop {
        let Some(line) = reader.next_line().await? else {
            return Ok(());
        };
        if let Some(snapshot) = parse_record(&line) {
            if !emit(&mut stdout, &render(&snapshot)?) {
                return Ok(());
            }
        }
    }
}

fn render(snapshot: &MetricsSnapshot) -> Result<String, StationError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Records that do not parse as a snapshot are skipped, matching the
/// non-follow reader.
fn parse_record(line: &str) -> Option<MetricsSnapshot> {
    serde_json::from_str(strip_timestamp_prefix(line)).ok()
}
