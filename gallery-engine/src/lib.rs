//! Client-side reaction synchronization engine for a shared image
//! gallery.
//!
//! Many viewers browse the same image set and cast one reaction
//! (like/dislike/none) per image. The engine keeps an optimistic local
//! view of per-image counts and the viewer's own reaction in agreement
//! with a remote counter service: votes apply locally before the
//! remote calls resolve and roll back exactly on failure, while a
//! background poller periodically overwrites local counts with the
//! service's authoritative values.
//!
//! Rendering, transport, and the counter service itself are external
//! collaborators. Transport enters through the [`CounterService`]
//! trait; the UI reads [`ImageItem`]s and reactions, and writes only
//! through [`Engine::vote`].

mod poll;
mod reaction;
mod reveal;
mod state;

pub use poll::PollOutcome;
pub use reaction::{Reaction, RemoteOp, Transition, VoteAction, resolve};
pub use reveal::RevealSchedule;
pub use state::{CounterUpdate, GalleryState, ImageItem, Selection};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Failure from the remote counter service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Non-2xx response; carries the status and whatever body text the
    /// service returned.
    #[error("counter service returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Transport-level failure (connect, timeout, decode).
    #[error("counter service request failed: {0}")]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The initial image-list fetch failed. Surfaced once to the caller;
/// the engine does not retry it.
#[derive(Debug, thiserror::Error)]
#[error("failed to load images: {0}")]
pub struct LoadError(#[from] pub ServiceError);

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("image {0} is not loaded")]
    UnknownImage(u64),
    /// A remote reaction call rejected. The optimistic update has
    /// already been rolled back when this is returned.
    #[error("vote on image {image_id} failed and was rolled back: {source}")]
    Remote {
        image_id: u64,
        #[source]
        source: ServiceError,
    },
}

/// Remote surface the engine consumes. Implementations are plain
/// request/response; the engine never retries and delegates timeouts
/// to the transport.
///
/// Convergence across sessions assumes the service's reaction
/// endpoints are commutative increments/decrements; the engine does
/// not reconcile conflicting orders beyond overwriting counts with
/// whatever a later fetch returns.
pub trait CounterService: Send + Sync {
    /// `GET /images` — the full gallery with current counts.
    fn fetch_images(&self)
    -> impl Future<Output = Result<Vec<ImageItem>, ServiceError>> + Send;

    /// `GET /images/counters?ids=…` — authoritative counts for a
    /// subset of ids. Ids unknown to the service are simply absent
    /// from the response.
    fn fetch_counters(
        &self,
        ids: &[u64],
    ) -> impl Future<Output = Result<Vec<CounterUpdate>, ServiceError>> + Send;

    /// `POST /images/{op}/{id}` — apply one reaction operation.
    fn apply_op(
        &self,
        op: RemoteOp,
        image_id: u64,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

// Lets an `Arc`-shared client back the engine while the app keeps its
// own handle (e.g. for the CSV download path).
impl<S: CounterService> CounterService for std::sync::Arc<S> {
    fn fetch_images(&self)
    -> impl Future<Output = Result<Vec<ImageItem>, ServiceError>> + Send {
        S::fetch_images(self)
    }

    fn fetch_counters(
        &self,
        ids: &[u64],
    ) -> impl Future<Output = Result<Vec<CounterUpdate>, ServiceError>> + Send {
        S::fetch_counters(self, ids)
    }

    fn apply_op(
        &self,
        op: RemoteOp,
        image_id: u64,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        S::apply_op(self, op, image_id)
    }
}

/// Tunable cadences. Defaults match the reference client.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Counter reconciliation cadence.
    pub poll_interval: Duration,
    /// Grace period after a local write during which poll merges are
    /// suppressed, so a just-applied optimistic count is not stomped
    /// by a read that raced the server-side write.
    pub settle_window: Duration,
    /// Images revealed per reveal tick.
    pub reveal_batch: usize,
    /// Reveal cadence.
    pub reveal_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            settle_window: Duration::from_millis(1500),
            reveal_batch: 16,
            reveal_interval: Duration::from_millis(200),
        }
    }
}

/// The synchronization engine. Owns the shared state; hand it to the
/// UI and background tasks behind an `Arc`.
pub struct Engine<S> {
    service: S,
    config: EngineConfig,
    state: Mutex<GalleryState>,
    /// Whether the viewing surface is currently on screen. The poller
    /// skips ticks while hidden.
    visible: AtomicBool,
    pub(crate) revealed: AtomicUsize,
    pub(crate) reveal_started: AtomicBool,
}

impl<S: CounterService> Engine<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, EngineConfig::default())
    }

    pub fn with_config(service: S, config: EngineConfig) -> Self {
        Self {
            service,
            config,
            state: Mutex::new(GalleryState::new()),
            visible: AtomicBool::new(true),
            revealed: AtomicUsize::new(0),
            reveal_started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn service(&self) -> &S {
        &self.service
    }

    /// All mutations happen under this lock, and never across an
    /// await point, so a vote's read-resolve-apply-stamp block is
    /// atomic with respect to other votes and poll merges.
    pub(crate) fn state(&self) -> MutexGuard<'_, GalleryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch the image list and reset the session: reactions cleared,
    /// reveal progress back to zero. Returns how many images loaded.
    pub async fn load(&self) -> Result<usize, LoadError> {
        let images = self.service.fetch_images().await?;
        let count = images.len();
        self.state().set_images(images);
        self.revealed.store(0, Ordering::SeqCst);
        self.reveal_started.store(false, Ordering::SeqCst);
        log::info!("loaded {count} images");
        Ok(count)
    }

    /// Cast a vote. The only write path into counts and reactions.
    ///
    /// The optimistic update (count deltas, reaction entry, last-write
    /// stamp) lands before any remote call is issued; the remote ops
    /// then fire in order, and any rejection rolls the update back
    /// exactly and surfaces the error. A repeated action toggles the
    /// reaction off.
    pub async fn vote(&self, image_id: u64, action: VoteAction) -> Result<(), VoteError> {
        let transition = {
            let mut state = self.state();
            if state.image(image_id).is_none() {
                return Err(VoteError::UnknownImage(image_id));
            }
            // Read against live state: a vote racing an earlier vote
            // on the same image sees that vote's optimistic result.
            let previous = state.reaction(image_id);
            let transition = reaction::resolve(previous, action);
            state.apply(image_id, &transition);
            state.stamp_last_write(Instant::now());
            transition
        };

        for op in &transition.ops {
            if let Err(source) = self.service.apply_op(*op, image_id).await {
                log::warn!("vote op {op} on image {image_id} failed, rolling back: {source}");
                self.state().revert(image_id, &transition);
                return Err(VoteError::Remote { image_id, source });
            }
        }
        log::debug!(
            "image {image_id}: reaction {:?} -> {:?}",
            transition.previous,
            transition.next
        );
        Ok(())
    }

    /// Snapshot of the loaded images in display order.
    pub fn images(&self) -> Vec<ImageItem> {
        self.state().images().cloned().collect()
    }

    pub fn image(&self, image_id: u64) -> Option<ImageItem> {
        self.state().image(image_id).cloned()
    }

    pub fn image_at(&self, index: usize) -> Option<ImageItem> {
        self.state().image_at(index).cloned()
    }

    pub fn image_count(&self) -> usize {
        self.state().len()
    }

    /// The viewer's own reaction to one image, if any.
    pub fn reaction(&self, image_id: u64) -> Option<Reaction> {
        self.state().reaction(image_id)
    }

    pub fn reactions(&self) -> HashMap<u64, Reaction> {
        self.state().reactions().clone()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}
