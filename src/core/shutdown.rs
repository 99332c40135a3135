//! # Termination signal handling.
//!
//! [`wait_for_shutdown_signal`] completes when the process is asked to stop.
//! The station funnels every termination request through graceful shutdown
//! so module children are killed and the singleton lock guard drops; only a
//! SIGKILL bypasses this path (and the stale-lock reclaim covers that case).
//!
//! ## Signals
//! **Unix:** `SIGINT` (Ctrl-C), `SIGTERM` (service managers), `SIGQUIT`.
//!
//! **Elsewhere:** Ctrl-C via [`tokio::signal::ctrl_c`].

/// Waits for a termination signal.
///
/// Each call registers independent listeners. Returns `Err` only if signal
/// registration itself fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call registers independent listeners. Returns `Err` only if signal
/// registration itself fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
