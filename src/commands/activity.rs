//! `station activity`: the station-wide activity history.

use crate::config::Config;
use crate::error::StationError;

use super::tail;

/// Prints `logs/activity.log` as stored; with `follow`, keeps tailing it.
pub async fn print_activity(cfg: &Config, follow: bool) -> Result<(), StationError> {
    tail(&cfg.paths.activity, follow, cfg.follow_poll).await
}
