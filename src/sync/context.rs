use std::sync::atomic::{AtomicBool, Ordering};

use super::events::{CatalogChange, EventSink};
use super::stats::SyncStats;

/// Mutable state threaded through one sync pass.
pub(super) struct SyncContext<'a> {
    pub(super) events: EventSink<'a>,
    cancel: Option<&'a AtomicBool>,
    budget: usize,
    pub(super) stats: SyncStats,
    pub(super) folders_found: usize,
}

impl<'a> SyncContext<'a> {
    pub(super) fn new(
        listener: Option<&'a mut (dyn FnMut(&CatalogChange) + 'a)>,
        cancel: Option<&'a AtomicBool>,
        batch_size: usize,
    ) -> Self {
        Self {
            events: EventSink::new(listener),
            cancel,
            budget: batch_size,
            stats: SyncStats::default(),
            folders_found: 0,
        }
    }

    /// Check the cancellation flag, remembering the first observation.
    pub(super) fn is_cancelled(&mut self) -> bool {
        if self.stats.cancelled {
            return true;
        }
        if let Some(cancel) = self.cancel
            && cancel.load(Ordering::Relaxed)
        {
            tracing::info!("Sync cancellation observed");
            self.stats.cancelled = true;
        }
        self.stats.cancelled
    }

    pub(super) fn budget_exhausted(&self) -> bool {
        self.budget == 0
    }

    /// Consume one unit of the batch budget after a successful create or update.
    pub(super) fn consume_budget(&mut self) {
        self.budget = self.budget.saturating_sub(1);
    }

    /// Record that pending work was left for the next pass.
    pub(super) fn defer(&mut self) {
        if !self.stats.deferred {
            tracing::info!("Batch size reached, deferring remaining work");
        }
        self.stats.deferred = true;
    }

    /// True once the walk must not start another folder.
    pub(super) fn should_stop(&mut self) -> bool {
        if self.is_cancelled() {
            return true;
        }
        if self.budget_exhausted() {
            self.defer();
            return true;
        }
        false
    }

    pub(super) fn emit(&mut self, change: CatalogChange) {
        self.events.emit(change);
    }

    pub(super) fn record_folder_failure(&mut self) {
        self.stats.failed_folders += 1;
    }

    pub(super) fn has_failures(&self) -> bool {
        self.stats.failed_folders > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_counts_down_and_defers() {
        let mut ctx = SyncContext::new(None, None, 2);
        assert!(!ctx.should_stop());
        ctx.consume_budget();
        ctx.consume_budget();
        ctx.consume_budget();
        assert!(ctx.budget_exhausted());
        assert!(ctx.should_stop());
        assert!(ctx.stats.deferred);
        assert!(!ctx.stats.cancelled);
    }

    #[test]
    fn cancellation_is_sticky() {
        let flag = AtomicBool::new(false);
        let mut ctx = SyncContext::new(None, Some(&flag), 10);
        assert!(!ctx.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(ctx.is_cancelled());
        flag.store(false, Ordering::Relaxed);
        assert!(ctx.is_cancelled());
    }
}
