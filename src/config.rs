//! # Station runtime configuration.
//!
//! [`Config`] defines the station's behavior: where state lives, which
//! wallet earns, and the timing knobs for readiness, polling and shutdown.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use station_core::Config;
//!
//! let mut cfg = Config::new("/tmp/station-root");
//! cfg.wallet_address = Some("f1abjxfbp274xpdqcpuaykwkfb43omjotacm2p3za".to_string());
//! cfg.grace = Duration::from_secs(5);
//!
//! assert_eq!(cfg.grace, Duration::from_secs(5));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::rewards::PollPacing;
use crate::store::StationPaths;

/// Global configuration for the station.
///
/// Timing knobs are plain fields so tests can shrink them.
#[derive(Clone, Debug)]
pub struct Config {
    /// Filesystem layout under the state root.
    pub paths: StationPaths,
    /// Wallet address earnings are credited to. Required to run modules;
    /// not needed by any reader command.
    pub wallet_address: Option<String>,
    /// How long a freshly spawned module may stay silent before a start
    /// failure is recorded.
    pub readiness_timeout: Duration,
    /// Delay between checks while the reward source set is still empty.
    pub contracts_poll: Duration,
    /// Base interval between reward polling rounds.
    pub rewards_interval: Duration,
    /// Maximum deviation applied to the rewards interval.
    pub rewards_jitter: Duration,
    /// Poll interval of follow-mode readers.
    pub follow_poll: Duration,
    /// Maximum time to wait for graceful shutdown before force-terminating.
    pub grace: Duration,
}

impl Config {
    /// Configuration rooted at `root` with the default timing:
    /// - `readiness_timeout = 500ms`
    /// - `contracts_poll = 1s`
    /// - `rewards_interval = 600s`
    /// - `rewards_jitter = 10s`
    /// - `follow_poll = 100ms`
    /// - `grace = 10s`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: StationPaths::new(root),
            wallet_address: None,
            readiness_timeout: Duration::from_millis(500),
            contracts_poll: Duration::from_secs(1),
            rewards_interval: Duration::from_secs(600),
            rewards_jitter: Duration::from_secs(10),
            follow_poll: Duration::from_millis(100),
            grace: Duration::from_secs(10),
        }
    }

    /// Default state root: `$HOME/.station-core`, or a relative
    /// `.station-core` when no home directory is known.
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".station-core"))
            .unwrap_or_else(|| PathBuf::from(".station-core"))
    }

    /// Pacing of the rewards loop derived from the interval and jitter.
    pub fn rewards_pacing(&self) -> PollPacing {
        PollPacing {
            base: self.rewards_interval,
            jitter: self.rewards_jitter,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}
