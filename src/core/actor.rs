//! # ModuleActor: single-module supervisor.
//!
//! Drives one module process from spawn to exit:
//! - raw output capture into the module's log and the merged log,
//! - protocol decoding and routing into activity records and metrics,
//! - a readiness watchdog for the window right after spawn,
//! - cooperative cancellation via [`CancellationToken`].
//!
//! ## Line flow
//! ```text
//! child stdout ──► raw logs ──► decode_line ──► activity:info/error ──► activity log
//!                                           ├─► jobs-completed ──────► metrics sink
//!                                           └─► DecodeError ─────────► warn, skip line
//! child stderr ──► raw logs
//! ```
//!
//! ## Rules
//! - A module is **single-shot**: it runs once and its exit is recorded, not
//!   retried. Restarting is the embedding layer's call.
//! - A start failure (spawn error, silent module) is fatal to **this module
//!   only**; sibling actors never notice.
//! - Log store failures are fatal to the whole station and propagate.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::module::ModuleSpec;
use crate::error::StationError;
use crate::events::{decode_line, ModuleEvent};
use crate::report::ErrorReporter;
use crate::store::{ActivityWriter, EventLogStore, LineBuf, MetricsSink, MetricsUpdate};

/// Supervises execution of a single module process.
pub struct ModuleActor {
    /// What to launch.
    pub spec: ModuleSpec,
    /// Store the raw logs go through.
    pub store: EventLogStore,
    /// The module's own raw log, `logs/modules/<name>.log`.
    pub module_log: PathBuf,
    /// The merged raw log, `logs/all.log`.
    pub all_log: PathBuf,
    /// Activity sink for decoded and lifecycle records.
    pub activity: ActivityWriter,
    /// Metrics sink for `jobs-completed` events.
    pub metrics: Arc<dyn MetricsSink>,
    /// Error reporting collaborator, told about module exits.
    pub reporter: Arc<dyn ErrorReporter>,
    /// Silence window after spawn before a start failure is recorded.
    pub readiness_timeout: Duration,
}

impl ModuleActor {
    /// Runs the module until it exits or `token` cancels.
    ///
    /// ### Exit conditions
    /// - The child exits on its own: the exit is recorded as activity and
    ///   reported, then the actor returns `Ok`.
    /// - `token` cancels: the child is killed and its exit recorded the
    ///   same way.
    /// - The child cannot be spawned: one activity error, `Ok`.
    /// - A log append fails: the error propagates immediately.
    ///
    /// ### Readiness
    /// The first output byte on either stream marks the module ready, even
    /// mid-line. If nothing arrives within `readiness_timeout`, one activity
    /// error is recorded and the child is deliberately left running; a slow
    /// module is surfaced, not killed.
    pub async fn run(self, token: CancellationToken) -> Result<(), StationError> {
        let display_name = self.spec.display_name.clone();
        self.log_raw(&format!("Starting {display_name}")).await?;

        let mut command = Command::new(&self.spec.executable);
        command
            .args(&self.spec.args)
            .current_dir(&self.spec.working_dir)
            .envs(self.spec.env.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                let message = format!("Cannot start {display_name}: {err}");
                self.log_raw(&message).await?;
                self.activity.error(&display_name, &message).await?;
                return Ok(());
            }
        };

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut stdout_buf = LineBuf::default();
        let mut stderr_buf = LineBuf::default();
        let mut stdout_done = stdout.is_none();
        let mut stderr_done = stderr.is_none();

        let readiness = time::sleep(self.readiness_timeout);
        tokio::pin!(readiness);
        let mut ready = false;
        let mut readiness_fired = false;
        let mut killing = false;

        while !(stdout_done && stderr_done) {
            select! {
                read = read_chunk(&mut stdout, &mut stdout_buf), if !stdout_done => match read {
                    Ok(0) => {
                        stdout_done = true;
                        if let Some(line) = stdout_buf.flush() {
                            self.log_raw(&line).await?;
                            self.route(&line).await?;
                        }
                    }
                    Ok(_) => {
                        ready = true;
                        for line in stdout_buf.complete_lines() {
                            self.log_raw(&line).await?;
                            self.route(&line).await?;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("reading {display_name} stdout: {err}");
                        stdout_done = true;
                    }
                },
                read = read_chunk(&mut stderr, &mut stderr_buf), if !stderr_done => match read {
                    Ok(0) => {
                        stderr_done = true;
                        if let Some(line) = stderr_buf.flush() {
                            self.log_raw(&line).await?;
                        }
                    }
                    Ok(_) => {
                        ready = true;
                        for line in stderr_buf.complete_lines() {
                            self.log_raw(&line).await?;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("reading {display_name} stderr: {err}");
                        stderr_done = true;
                    }
                },
                _ = &mut readiness, if !ready && !readiness_fired => {
                    readiness_fired = true;
                    let message = format!(
                        "Cannot start {display_name}: no output within {:?}",
                        self.readiness_timeout
                    );
                    self.log_raw(&message).await?;
                    self.activity.error(&display_name, &message).await?;
                },
                _ = token.cancelled(), if !killing => {
                    killing = true;
                    if let Err(err) = child.start_kill() {
                        tracing::warn!("killing {display_name}: {err}");
                    }
                },
            }
        }

        let status = select! {
            status = child.wait() => status,
            _ = token.cancelled(), if !killing => {
                if let Err(err) = child.start_kill() {
                    tracing::warn!("killing {display_name}: {err}");
                }
                child.wait().await
            }
        };
        let status = match status {
            Ok(status) => status,
            Err(err) => {
                tracing::error!("waiting for {display_name}: {err}");
                return Ok(());
            }
        };

        let message = format!("{display_name} exited {}", exit_reason(&status));
        self.log_raw(&message).await?;
        self.activity.info(&display_name, &message).await?;
        self.reporter.report(&format!("{display_name} exited"));
        Ok(())
    }

    /// Appends one raw line to the module's log and the merged log.
    async fn log_raw(&self, text: &str) -> Result<(), StationError> {
        self.store.append(&self.module_log, text).await?;
        self.store.append(&self.all_log, text).await
    }

    /// Decodes one stdout line and routes the event into the store.
    async fn route(&self, line: &str) -> Result<(), StationError> {
        match decode_line(line, &self.spec.display_name) {
            Ok(ModuleEvent::ActivityInfo { source, message }) => {
                self.activity.info(&source, &message).await
            }
            Ok(ModuleEvent::ActivityError { source, message }) => {
                self.activity.error(&source, &message).await
            }
            Ok(ModuleEvent::JobsCompleted { total }) => {
                self.metrics
                    .submit(MetricsUpdate {
                        total_jobs_completed: Some(total),
                        total_earnings: Some("0".to_string()),
                        ..Default::default()
                    })
                    .await
            }
            Err(err) => {
                tracing::warn!("ignoring {} event: {err}", self.spec.display_name);
                Ok(())
            }
        }
    }
}

/// One cancel-safe read into `buf`; `Ok(0)` is end of stream.
async fn read_chunk<R: AsyncRead + Unpin>(
    stream: &mut Option<R>,
    buf: &mut LineBuf,
) -> std::io::Result<usize> {
    match stream {
        Some(reader) => {
            let mut chunk = [0u8; 4096];
            let n = reader.read(&mut chunk).await?;
            buf.push(&chunk[..n]);
            Ok(n)
        }
        None => Ok(0),
    }
}

#[cfg(unix)]
fn exit_reason(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("with code: {code}"),
        (None, Some(signal)) => format!("via signal {signal}"),
        (None, None) => "with code: <none>".to_string(),
    }
}

#[cfg(not(unix))]
fn exit_reason(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("with code: {code}"),
        None => "with code: <none>".to_string(),
    }
}
