//! `station logs`: everything the modules wrote, merged across modules.

use crate::config::Config;
use crate::error::StationError;

use super::tail;

/// Prints `logs/all.log` as stored; with `follow`, keeps tailing it.
pub async fn print_logs(cfg: &Config, follow: bool) -> Result<(), StationError> {
    tail(&cfg.paths.all_logs, follow, cfg.follow_poll).await
}
