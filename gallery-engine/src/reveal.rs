//! Progressive reveal: after a load, grow the number of
//! render-eligible images in fixed batches on a fixed cadence until
//! the whole list is visible.
//!
//! Purely a display gate over the already-fetched, immutable list; it
//! never touches counts or reactions, and it runs exactly once per
//! freshly loaded list.

use std::sync::atomic::Ordering;

use crate::{CounterService, Engine, ImageItem};

/// The reveal counts one run steps through, e.g. 16, 32, 48, 50 for a
/// 50-item list with batch 16. Yields nothing for an empty list.
#[derive(Debug, Clone)]
pub struct RevealSchedule {
    total: usize,
    batch: usize,
    shown: usize,
}

impl RevealSchedule {
    pub fn new(total: usize, batch: usize) -> Self {
        Self {
            total,
            batch: batch.max(1),
            shown: 0,
        }
    }
}

impl Iterator for RevealSchedule {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.shown >= self.total {
            return None;
        }
        self.shown = self.total.min(self.shown + self.batch);
        Some(self.shown)
    }
}

impl<S: CounterService> Engine<S> {
    /// How many images are currently eligible for rendering.
    pub fn revealed_count(&self) -> usize {
        self.revealed
            .load(Ordering::SeqCst)
            .min(self.image_count())
    }

    /// The revealed prefix of the loaded list, in display order.
    pub fn visible_images(&self) -> Vec<ImageItem> {
        let state = self.state();
        let count = self.revealed.load(Ordering::SeqCst).min(state.len());
        state.images().take(count).cloned().collect()
    }

    /// Step the reveal until everything is visible, then return. A
    /// second call for the same loaded list returns immediately; only
    /// `load` re-arms it.
    pub async fn run_reveal(&self) {
        if self.reveal_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let total = self.image_count();
        let schedule = RevealSchedule::new(total, self.config().reveal_batch);
        let mut interval = tokio::time::interval(self.config().reveal_interval);
        // Consume the immediate first tick: the first batch appears
        // one cadence after the run starts.
        interval.tick().await;
        for count in schedule {
            interval.tick().await;
            self.revealed.store(count, Ordering::SeqCst);
        }
        log::debug!("reveal complete, {total} images visible");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_steps_in_batches() {
        let counts: Vec<usize> = RevealSchedule::new(50, 16).collect();
        assert_eq!(counts, vec![16, 32, 48, 50]);
    }

    #[test]
    fn test_schedule_exact_multiple() {
        let counts: Vec<usize> = RevealSchedule::new(32, 16).collect();
        assert_eq!(counts, vec![16, 32]);
    }

    #[test]
    fn test_schedule_smaller_than_batch() {
        let counts: Vec<usize> = RevealSchedule::new(5, 16).collect();
        assert_eq!(counts, vec![5]);
    }

    #[test]
    fn test_schedule_empty_list() {
        assert_eq!(RevealSchedule::new(0, 16).count(), 0);
    }

    #[test]
    fn test_schedule_zero_batch_still_terminates() {
        let counts: Vec<usize> = RevealSchedule::new(3, 0).collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }
}
