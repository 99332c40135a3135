//! Command line surface of the `station` binary.
//!
//! Running without a subcommand starts the supervisor. The subcommands are
//! readers over the log store and work while a supervisor is running, or
//! without one, and never require the wallet address or the lock.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "station")]
#[command(about = "Station Core: runs compute modules and tracks their rewards", long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Directory holding the logs, module state, and the lock file
    #[arg(long, global = true, env = "ROOT_DIR")]
    pub root_dir: Option<PathBuf>,

    /// Filecoin wallet address rewards are scheduled for
    #[arg(long, global = true, env = "FIL_WALLET_ADDRESS")]
    pub wallet_address: Option<String>,

    /// Where modules keep persistent state (defaults to <root>/state)
    #[arg(long, env = "STATE_ROOT")]
    pub state_root: Option<PathBuf>,

    /// Where modules keep cached data (defaults to <root>/cache)
    #[arg(long, env = "CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the latest metrics snapshot
    Metrics {
        /// Keep reading and reprint the snapshot on every update
        #[arg(short, long)]
        follow: bool,
    },

    /// Print everything the modules wrote to their logs
    Logs {
        /// Keep reading and print new lines as they arrive
        #[arg(short, long)]
        follow: bool,
    },

    /// Print the activity history
    Activity {
        /// Keep reading and print new records as they arrive
        #[arg(short, long)]
        follow: bool,
    },

    /// Stream station events as JSON lines
    Events,
}

impl Cli {
    /// Configuration assembled from the arguments, the environment, and the
    /// built-in defaults.
    pub fn build_config(&self) -> Config {
        let root = self
            .root_dir
            .clone()
            .unwrap_or_else(Config::default_root);
        let mut cfg = Config::new(root);
        cfg.wallet_address = self.wallet_address.clone();
        if let Some(state) = &self.state_root {
            cfg.paths.state = state.clone();
        }
        if let Some(cache) = &self.cache_root {
            cfg.paths.cache = cache.clone();
        }
        cfg
    }
}
