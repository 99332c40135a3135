//! `station events`: the merged event stream as JSON lines.

use crate::config::Config;
use crate::error::StationError;
use crate::events::MergedEvents;

use super::emit;

/// Streams station events to stdout, one JSON object per line, flushed per
/// line. Replays history first, then follows; never ends on its own.
pub async fn stream_events(cfg: &Config) -> Result<(), StationError> {
    let mut stream = MergedEvents::open(&cfg.paths, cfg.follow_poll);
    let mut stdout = std::io::stdout();
    loop {
        let event = stream.next_event().await?;
        let line = serde_json::to_string(&event)?;
        if !emit(&mut stdout, &line) {
            return Ok(());
        }
    }
}
