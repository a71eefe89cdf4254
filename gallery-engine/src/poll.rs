//! Counter reconciliation: periodically overwrite local counts with
//! the service's authoritative values so viewers see each other's
//! reactions.
//!
//! A tick is best-effort. It merges aggregate counts only — the poll
//! response carries no per-viewer data, so it can never clear or alter
//! the viewer's own reaction — and it is suppressed for a settle
//! window after every local write so a fresh optimistic update is not
//! stomped by a read that raced the server-side write. That window is
//! the sole race mitigation: counts are eventually consistent, not
//! locked.

use crate::{CounterService, Engine};

/// What one poll tick did. Mostly for logging and tests; the loop
/// treats every outcome the same and just keeps ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Authoritative counts merged for this many images.
    Merged(usize),
    /// Skipped: within the settle window after a local write.
    Settling,
    /// Skipped: the viewing surface is hidden.
    Hidden,
    /// Skipped: no images loaded.
    Empty,
    /// The fetch failed; swallowed, the next tick retries.
    Failed,
}

impl<S: CounterService> Engine<S> {
    /// One reconciliation tick.
    pub async fn poll_once(&self) -> PollOutcome {
        let ids = {
            let state = self.state();
            if state.is_empty() {
                return PollOutcome::Empty;
            }
            if let Some(at) = state.last_write()
                && at.elapsed() < self.config().settle_window
            {
                return PollOutcome::Settling;
            }
            state.image_ids()
        };
        if !self.is_visible() {
            return PollOutcome::Hidden;
        }

        match self.service().fetch_counters(&ids).await {
            Ok(updates) => {
                let merged = self.state().merge_counters(&updates);
                log::debug!("poll merged counters for {merged} of {} images", ids.len());
                PollOutcome::Merged(merged)
            }
            Err(e) => {
                log::debug!("counter poll failed, will retry next tick: {e}");
                PollOutcome::Failed
            }
        }
    }

    /// Long-running reconciliation loop. Spawn once after `load`; runs
    /// for the whole session. The interval is recreated only when the
    /// number of loaded images changes, otherwise it stays stable.
    pub async fn run_poller(&self) {
        loop {
            let tracked = self.image_count();
            if tracked == 0 {
                tokio::time::sleep(self.config().poll_interval).await;
                continue;
            }
            let mut interval = tokio::time::interval(self.config().poll_interval);
            // An interval's first tick completes immediately; consume
            // it so the first fetch happens one full period after load.
            interval.tick().await;
            loop {
                interval.tick().await;
                self.poll_once().await;
                if self.image_count() != tracked {
                    break;
                }
            }
        }
    }
}
