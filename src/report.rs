//! Error reporting collaborator.

/// Where "something went wrong" notifications go.
///
/// The station reports noteworthy failures (a module exiting, for one)
/// through this seam so the embedding layer can forward them to whatever
/// crash reporting it runs. Reporting is fire-and-forget: it never blocks
/// and never fails the caller.
pub trait ErrorReporter: Send + Sync {
    /// Reports one noteworthy event, e.g. `Zinnia exited`.
    fn report(&self, event: &str);
}

/// Default reporter: the event lands in the station's own log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, event: &str) {
        tracing::error!("{event}");
    }
}
