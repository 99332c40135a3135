//! Singleton lock: at most one live station per state directory.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::StationError;
use crate::store::StationPaths;

/// How many times a stale lock may be observed and removed before giving up.
const ACQUIRE_ROUNDS: usize = 8;

/// Guard owning the station's singleton lock.
///
/// The lock is a file holding the owner's PID. An acquire that finds the
/// file checks whether that PID still names a live process: a live one means
/// another station owns the root, a dead one (or garbage contents) means the
/// previous owner went away without cleanup and the lock is reclaimed. The
/// file is removed when the guard drops, including on error returns and
/// panic unwinds; only a SIGKILL leaves a stale file behind.
#[derive(Debug)]
pub struct SingletonLock {
    path: PathBuf,
}

impl SingletonLock {
    /// Takes the lock for this process.
    ///
    /// Fails with [`StationError::AlreadyRunning`] when a live owner exists.
    /// Two processes racing for a stale lock resolve to exactly one holder:
    /// `create_new` is the atomic step, removal of a stale file merely makes
    /// room for the next round.
    pub fn acquire(paths: &StationPaths) -> Result<Self, StationError> {
        fs::create_dir_all(&paths.root).map_err(|source| lock_io(&paths.lock, source))?;

        for _ in 0..ACQUIRE_ROUNDS {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&paths.lock)
            {
                Ok(mut file) => {
                    if let Err(source) = file.write_all(std::process::id().to_string().as_bytes())
                    {
                        let _ = fs::remove_file(&paths.lock);
                        return Err(lock_io(&paths.lock, source));
                    }
                    return Ok(Self {
                        path: paths.lock.clone(),
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    let contents = match fs::read_to_string(&paths.lock) {
                        Ok(contents) => contents,
                        // Owner released between our open and read; try again.
                        Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                        Err(source) => return Err(lock_io(&paths.lock, source)),
                    };
                    if let Ok(pid) = contents.trim().parse::<u32>() {
                        if process_alive(pid) {
                            return Err(StationError::AlreadyRunning {
                                root: paths.root.clone(),
                                pid,
                            });
                        }
                    }
                    // Stale: the recorded process is gone, or the contents
                    // are not a PID at all. A removal race is fine; the next
                    // round retries `create_new` either way.
                    let _ = fs::remove_file(&paths.lock);
                }
                Err(source) => return Err(lock_io(&paths.lock, source)),
            }
        }
        Err(lock_io(
            &paths.lock,
            io::Error::new(
                io::ErrorKind::TimedOut,
                "lock file kept reappearing stale; giving up",
            ),
        ))
    }
}

impl Drop for SingletonLock {
    fn drop(&mut self) {
        // Nothing useful to do with a failure on the way out.
        let _ = fs::remove_file(&self.path);
    }
}

/// Whether `pid` names a live process. Refreshes only that one PID.
fn process_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        false,
        ProcessRefreshKind::nothing(),
    );
    system.process(pid).is_some()
}

fn lock_io(path: &std::path::Path, source: io::Error) -> StationError {
    StationError::LockIo {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths() -> (tempfile::TempDir, StationPaths) {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = StationPaths::new(dir.path().join("station"));
        (dir, paths)
    }

    #[test]
    fn test_second_acquire_fails_while_first_guard_lives() {
        let (_dir, paths) = temp_paths();
        let _guard = SingletonLock::acquire(&paths).expect("first acquire");

        let err = SingletonLock::acquire(&paths).expect_err("second acquire must fail");
        match &err {
            StationError::AlreadyRunning { pid, .. } => {
                assert_eq!(*pid, std::process::id(), "lock must name the live owner");
            }
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
        assert!(
            err.to_string().contains("is already running"),
            "message must say so: {err}"
        );
    }

    #[test]
    fn test_drop_releases_the_lock() {
        let (_dir, paths) = temp_paths();
        {
            let _guard = SingletonLock::acquire(&paths).expect("first acquire");
            assert!(paths.lock.exists(), "lock file must exist while held");
        }
        assert!(!paths.lock.exists(), "drop must remove the lock file");
        let _guard = SingletonLock::acquire(&paths).expect("reacquire after drop");
    }

    #[test]
    fn test_garbage_lock_contents_count_as_stale() {
        let (_dir, paths) = temp_paths();
        fs::create_dir_all(&paths.root).expect("root");
        fs::write(&paths.lock, "definitely not a pid").expect("seed");

        let _guard = SingletonLock::acquire(&paths).expect("stale lock must be reclaimed");
        let contents = fs::read_to_string(&paths.lock).expect("read");
        assert_eq!(
            contents.trim().parse::<u32>().expect("pid"),
            std::process::id()
        );
    }

    #[test]
    fn test_process_alive_sees_the_current_process() {
        assert!(process_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_dead_owner_pid_counts_as_stale() {
        let (_dir, paths) = temp_paths();
        fs::create_dir_all(&paths.root).expect("root");

        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("spawn short-lived process");
        let dead_pid = child.id();
        child.wait().expect("reap");

        fs::write(&paths.lock, dead_pid.to_string()).expect("seed");
        let _guard = SingletonLock::acquire(&paths).expect("dead owner must be reclaimed");
    }
}
