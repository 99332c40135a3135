//! Module catalog: what the station can run.

use std::path::PathBuf;

use crate::config::Config;

/// Everything needed to launch one module process.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    /// Stable identifier, used for the log file name, e.g. `zinnia`.
    pub name: String,
    /// Human-facing name used in activity records and events, e.g. `Zinnia`.
    pub display_name: String,
    /// Executable to spawn.
    pub executable: PathBuf,
    /// Arguments; module source paths are relative to `working_dir`.
    pub args: Vec<String>,
    /// Working directory of the child process.
    pub working_dir: PathBuf,
    /// Extra environment handed to the child.
    pub env: Vec<(String, String)>,
}

/// The built-in catalog entry: the Zinnia runtime executing the peer
/// checker module.
///
/// Downloading and installing the binaries is an external collaborator's
/// job; a missing executable is a start failure for this module only.
pub fn zinnia(cfg: &Config, wallet_address: &str) -> ModuleSpec {
    ModuleSpec {
        name: "zinnia".to_string(),
        display_name: "Zinnia".to_string(),
        executable: cfg.paths.module_binaries.join("zinnia").join("zinniad"),
        args: vec!["peer-checker/peer-checker.js".to_string()],
        working_dir: cfg.paths.module_binaries.clone(),
        env: vec![
            (
                "FIL_WALLET_ADDRESS".to_string(),
                wallet_address.to_string(),
            ),
            (
                "STATE_ROOT".to_string(),
                cfg.paths.state.to_string_lossy().into_owned(),
            ),
            (
                "CACHE_ROOT".to_string(),
                cfg.paths.cache.to_string_lossy().into_owned(),
            ),
        ],
    }
}
