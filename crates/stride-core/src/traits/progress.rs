use crate::models::ReconcileProgress;

/// Receives reconciliation progress, typically for a UI progress bar.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &ReconcileProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&ReconcileProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &ReconcileProgress) {
        self(progress)
    }
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _progress: &ReconcileProgress) {}
}
