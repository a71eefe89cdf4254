//! Shared gallery state: the loaded image list, the viewer's own
//! reactions, and the last-write marker the poller consults.
//!
//! This container holds no I/O and is owned by the composition root
//! behind a lock; the coordinator and the poller both mutate it, but
//! only the coordinator ever touches the reaction map.

use std::collections::HashMap;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reaction::{Reaction, Transition};

/// One gallery entry as served by the counter service. Counts are the
/// only fields that change after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
    pub image_id: u64,
    pub source_url: String,
    pub likes: u64,
    pub dislikes: u64,
}

/// Authoritative counters for one image, as returned by a poll fetch.
/// Carries aggregate counts only, never who voted what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdate {
    pub image_id: u64,
    pub likes: u64,
    pub dislikes: u64,
}

/// Apply a signed delta to a count, saturating at zero. Counts must
/// never go negative even under a stale rollback.
fn apply_delta(count: u64, delta: i64) -> u64 {
    if delta >= 0 {
        count.saturating_add(delta as u64)
    } else {
        count.saturating_sub(delta.unsigned_abs())
    }
}

#[derive(Debug, Default)]
pub struct GalleryState {
    /// Loaded images in display order, keyed by id.
    images: IndexMap<u64, ImageItem>,
    /// The viewer's own reaction per image. An entry is always `Like`
    /// or `Dislike`; "no reaction" is the absence of an entry.
    reactions: HashMap<u64, Reaction>,
    /// Stamped on every vote attempt, before its remote calls resolve.
    last_write: Option<Instant>,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the image list. A fresh list starts a fresh session for
    /// the viewer's own reactions.
    pub fn set_images(&mut self, images: Vec<ImageItem>) {
        self.images = images.into_iter().map(|img| (img.image_id, img)).collect();
        self.reactions.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, image_id: u64) -> Option<&ImageItem> {
        self.images.get(&image_id)
    }

    pub fn image_at(&self, index: usize) -> Option<&ImageItem> {
        self.images.get_index(index).map(|(_, img)| img)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageItem> {
        self.images.values()
    }

    pub fn image_ids(&self) -> Vec<u64> {
        self.images.keys().copied().collect()
    }

    pub fn reaction(&self, image_id: u64) -> Option<Reaction> {
        self.reactions.get(&image_id).copied()
    }

    pub fn reactions(&self) -> &HashMap<u64, Reaction> {
        &self.reactions
    }

    pub fn last_write(&self) -> Option<Instant> {
        self.last_write
    }

    pub fn stamp_last_write(&mut self, at: Instant) {
        self.last_write = Some(at);
    }

    /// Optimistically apply a transition's deltas and reaction entry.
    /// Returns false (untouched) if the image is unknown.
    pub fn apply(&mut self, image_id: u64, transition: &Transition) -> bool {
        let Some(img) = self.images.get_mut(&image_id) else {
            return false;
        };
        img.likes = apply_delta(img.likes, transition.likes_delta);
        img.dislikes = apply_delta(img.dislikes, transition.dislikes_delta);
        match transition.next {
            Some(reaction) => {
                self.reactions.insert(image_id, reaction);
            }
            None => {
                self.reactions.remove(&image_id);
            }
        }
        true
    }

    /// Reverse a previously applied transition: subtract the same
    /// deltas (saturating) and restore the previous reaction entry.
    pub fn revert(&mut self, image_id: u64, transition: &Transition) {
        if let Some(img) = self.images.get_mut(&image_id) {
            img.likes = apply_delta(img.likes, -transition.likes_delta);
            img.dislikes = apply_delta(img.dislikes, -transition.dislikes_delta);
        }
        match transition.previous {
            Some(reaction) => {
                self.reactions.insert(image_id, reaction);
            }
            None => {
                self.reactions.remove(&image_id);
            }
        }
    }

    /// Merge authoritative counters. Overwrites counts for every image
    /// present in the update; images absent from it are left alone, as
    /// is the reaction map. Returns how many images were updated.
    pub fn merge_counters(&mut self, updates: &[CounterUpdate]) -> usize {
        let mut merged = 0;
        for update in updates {
            if let Some(img) = self.images.get_mut(&update.image_id) {
                img.likes = update.likes;
                img.dislikes = update.dislikes;
                merged += 1;
            }
        }
        merged
    }
}

/// Fullscreen-viewer selection over the loaded list. Keeps an explicit
/// index so the selection survives counter refreshes, and wraps around
/// at both ends.
///
/// The UI collaborator owns the instance and resolves the index
/// against [`Engine::image_at`](crate::Engine::image_at); the engine
/// itself never tracks what is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    index: Option<usize>,
}

impl Selection {
    pub fn open(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub fn close(&mut self) {
        self.index = None;
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn next(&mut self, len: usize) {
        if let Some(idx) = self.index
            && len > 0
        {
            self.index = Some((idx + 1) % len);
        }
    }

    pub fn prev(&mut self, len: usize) {
        if let Some(idx) = self.index
            && len > 0
        {
            self.index = Some((idx + len - 1) % len);
        }
    }
}
