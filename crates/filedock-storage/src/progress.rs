//! Upload progress reporting.
//!
//! Backends push percentages into a [`ProgressReporter`]; the caller observes
//! them through the paired `watch::Receiver`. Values only move forward and are
//! clamped to 100.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<Arc<watch::Sender<u8>>>,
}

impl ProgressReporter {
    /// Create a reporter and the receiver observing it (starting at 0%).
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0u8);
        (Self { tx: Some(Arc::new(tx)) }, rx)
    }

    /// A reporter that discards every update.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Report a percentage; lower values than the last reported one are ignored.
    pub fn report(&self, percent: u8) {
        let Some(tx) = &self.tx else {
            return;
        };
        let percent = percent.min(100);
        tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    /// Report progress as bytes sent out of `total`, rounded to the nearest percent.
    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            self.report(100);
            return;
        }
        let percent = ((sent.min(total) as f64 / total as f64) * 100.0).round() as u8;
        self.report(percent);
    }

    /// Last reported percentage (0 for a disabled reporter).
    pub fn current(&self) -> u8 {
        self.tx.as_ref().map(|tx| *tx.borrow()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let (reporter, rx) = ProgressReporter::channel();
        reporter.report(40);
        reporter.report(10);
        assert_eq!(*rx.borrow(), 40);

        reporter.report(250);
        assert_eq!(*rx.borrow(), 100);
        assert_eq!(reporter.current(), 100);
    }

    #[test]
    fn test_report_bytes_rounds() {
        let (reporter, rx) = ProgressReporter::channel();
        reporter.report_bytes(1, 3);
        assert_eq!(*rx.borrow(), 33);
        reporter.report_bytes(2, 3);
        assert_eq!(*rx.borrow(), 67);
        reporter.report_bytes(0, 0);
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_disabled_reporter_ignores_updates() {
        let reporter = ProgressReporter::disabled();
        reporter.report(50);
        assert_eq!(reporter.current(), 0);
    }

    #[test]
    fn test_reporter_outlives_dropped_receiver() {
        let (reporter, rx) = ProgressReporter::channel();
        drop(rx);
        reporter.report(70);
        assert_eq!(reporter.current(), 70);
    }
}
