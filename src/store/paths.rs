//! Filesystem layout of the station state directory.

use std::io;
use std::path::PathBuf;

/// Precomputed layout of everything the station persists under one root.
///
/// ```text
/// <root>/
///   .lock                    singleton lock file
///   logs/activity.log        activity records (JSON, timestamped)
///   logs/metrics.log         metrics snapshots (JSON, timestamped)
///   logs/all.log             raw output of every module, merged
///   logs/modules/<name>.log  raw output per module
///   modules/                 module binaries
///   state/                   module state root (STATE_ROOT)
///   cache/                   module cache root (CACHE_ROOT)
/// ```
///
/// Fields are public so the embedding layer can override individual
/// locations (state and cache roots accept env overrides).
#[derive(Debug, Clone)]
pub struct StationPaths {
    /// Root state directory.
    pub root: PathBuf,
    /// Directory holding the per-module raw logs.
    pub module_logs: PathBuf,
    /// Merged raw log of every module.
    pub all_logs: PathBuf,
    /// Activity record log.
    pub activity: PathBuf,
    /// Metrics snapshot log.
    pub metrics: PathBuf,
    /// Directory holding module binaries.
    pub module_binaries: PathBuf,
    /// State root handed to modules.
    pub state: PathBuf,
    /// Cache root handed to modules.
    pub cache: PathBuf,
    /// Singleton lock file.
    pub lock: PathBuf,
}

impl StationPaths {
    /// Computes the default layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let logs = root.join("logs");
        Self {
            module_logs: logs.join("modules"),
            all_logs: logs.join("all.log"),
            activity: logs.join("activity.log"),
            metrics: logs.join("metrics.log"),
            module_binaries: root.join("modules"),
            state: root.join("state"),
            cache: root.join("cache"),
            lock: root.join(".lock"),
            root,
        }
    }

    /// Raw log path for one module.
    pub fn module_log(&self, module: &str) -> PathBuf {
        self.module_logs.join(format!("{module}.log"))
    }

    /// Creates every directory of the layout.
    ///
    /// Log files themselves appear lazily on first append.
    pub fn ensure_layout(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.module_logs)?;
        std::fs::create_dir_all(&self.module_binaries)?;
        std::fs::create_dir_all(&self.state)?;
        std::fs::create_dir_all(&self.cache)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_rooted() {
        let p = StationPaths::new("/tmp/station");
        assert_eq!(p.all_logs, PathBuf::from("/tmp/station/logs/all.log"));
        assert_eq!(p.activity, PathBuf::from("/tmp/station/logs/activity.log"));
        assert_eq!(p.metrics, PathBuf::from("/tmp/station/logs/metrics.log"));
        assert_eq!(p.lock, PathBuf::from("/tmp/station/.lock"));
        assert_eq!(
            p.module_log("zinnia"),
            PathBuf::from("/tmp/station/logs/modules/zinnia.log")
        );
    }

    #[test]
    fn test_ensure_layout_creates_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = StationPaths::new(dir.path().join("station"));
        p.ensure_layout().expect("layout");
        assert!(p.module_logs.is_dir(), "logs/modules must exist");
        assert!(p.module_binaries.is_dir(), "modules must exist");
        assert!(p.state.is_dir(), "state must exist");
        assert!(p.cache.is_dir(), "cache must exist");
    }
}
