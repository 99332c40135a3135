//! Shared helpers for the `station` binary tests.
//!
//! Terminating invocations go through [`station_cmd`] (assert_cmd with a
//! timeout). The daemon and the follow readers never terminate on their
//! own, so those are spawned raw with [`spawn_station`], observed through
//! [`LineStream`] / [`wait_until`], then killed.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin_cmd;

/// Wallet address used wherever a test needs one.
pub const WALLET: &str = "f1abjxfbp274xpdqcpuaykwkfb43omjotacm2p3za";

/// Timeout for invocations that terminate on their own, and for
/// [`LineStream::read_until`].
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Host environment that must not leak into a test.
const SCRUBBED: &[&str] = &[
    "FIL_WALLET_ADDRESS",
    "ROOT_DIR",
    "STATE_ROOT",
    "CACHE_ROOT",
    "RUST_LOG",
];

/// Command for the `station` binary against the given root directory, with
/// a hermetic environment.
pub fn station_cmd(root: &Path) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("station");
    cmd.timeout(TIMEOUT);
    for var in SCRUBBED {
        cmd.env_remove(var);
    }
    cmd.env("ROOT_DIR", root);
    cmd
}

/// Spawns the binary for invocations that keep running, stdout piped.
/// Callers kill the child through [`kill_and_wait`].
pub fn spawn_station(root: &Path, args: &[&str], wallet: Option<&str>) -> Child {
    let bin = assert_cmd::cargo::cargo_bin!("station");
    let mut cmd = Command::new(bin);
    for var in SCRUBBED {
        cmd.env_remove(var);
    }
    cmd.env("ROOT_DIR", root);
    if let Some(wallet) = wallet {
        cmd.env("FIL_WALLET_ADDRESS", wallet);
    }
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn station")
}

/// Kills a spawned child and reaps it.
pub fn kill_and_wait(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Live view over a child's stdout: a background thread reads lines, the
/// test pulls them with a deadline. Sequential [`LineStream::read_until`]
/// calls continue where the previous one stopped, so one stream can cover
/// several phases of a follow test.
pub struct LineStream {
    rx: mpsc::Receiver<String>,
}

impl LineStream {
    pub fn new(stdout: ChildStdout) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }

    /// Collects lines until `done` accepts the batch; panics with the
    /// partial batch when [`TIMEOUT`] passes or the child's stdout closes.
    pub fn read_until(&mut self, what: &str, done: impl Fn(&[String]) -> bool) -> Vec<String> {
        let deadline = Instant::now() + TIMEOUT;
        let mut lines = Vec::new();
        while !done(&lines) {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                panic!("timed out waiting for {what}; got {lines:?}");
            };
            match self.rx.recv_timeout(remaining) {
                Ok(line) => lines.push(line),
                Err(_) => panic!("stream ended waiting for {what}; got {lines:?}"),
            }
        }
        lines
    }
}

/// Polls `check` until it passes, failing the test after five seconds.
pub fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(50));
    }
}

/// Writes a fixture log, creating parent directories the way a real
/// station run would have.
pub fn seed_log(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create log dir");
    }
    std::fs::write(path, contents).expect("seed log");
}

/// Appends a record to a fixture log.
pub fn append_log(path: &Path, contents: &str) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("open log");
    file.write_all(contents.as_bytes()).expect("append log");
}
