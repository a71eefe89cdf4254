//! Exercises the engine against a live counter service: load the
//! gallery, reveal it, cast a vote, let the poller reconcile, then
//! toggle the vote back off so the run leaves no trace.
//!
//! Usage: `gallery-spot-check [base-url]`, or set `GALLERY_API_URL`.

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use gallery_api::ApiClient;
use gallery_engine::{Engine, Selection, VoteAction};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let base_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GALLERY_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let engine = Arc::new(Engine::new(ApiClient::new(&base_url)));
    let count = engine
        .load()
        .await
        .with_context(|| format!("failed to load images from {base_url}"))?;
    ensure!(count > 0, "the gallery at {base_url} is empty");
    println!("loaded {count} images from {base_url}");

    let poller = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_poller().await })
    };

    engine.run_reveal().await;
    println!("revealed {} images", engine.revealed_count());

    // Walk a viewer selection once around the gallery ends to check
    // indexed access and wrap-around navigation.
    let mut selection = Selection::default();
    selection.open(0);
    selection.prev(count);
    let last = selection
        .index()
        .and_then(|idx| engine.image_at(idx))
        .context("wrap-around to the last image failed")?;
    selection.next(count);
    println!("selection wraps: last image is {}", last.image_id);

    let first = selection
        .index()
        .and_then(|idx| engine.image_at(idx))
        .context("no first image")?;
    let id = first.image_id;
    println!(
        "image {id} before vote: {} likes / {} dislikes",
        first.likes, first.dislikes
    );

    engine.vote(id, VoteAction::Like).await.context("like failed")?;
    let after_vote = engine.image(id).context("image disappeared")?;
    println!(
        "image {id} after optimistic like: {} likes / {} dislikes (reaction {:?})",
        after_vote.likes,
        after_vote.dislikes,
        engine.reaction(id)
    );

    // Let the settle window pass and one poll tick land, so the
    // printed counts are the server's authoritative values.
    let wait = engine.config().settle_window + engine.config().poll_interval;
    log::info!("waiting {wait:?} for reconciliation");
    tokio::time::sleep(wait).await;
    let reconciled = engine.image(id).context("image disappeared")?;
    println!(
        "image {id} after reconciliation: {} likes / {} dislikes",
        reconciled.likes, reconciled.dislikes
    );

    // Toggle the like back off.
    engine.vote(id, VoteAction::Like).await.context("unlike failed")?;
    ensure!(engine.reaction(id).is_none(), "reaction did not toggle off");
    println!("toggled the like back off, spot check passed");

    poller.abort();
    Ok(())
}
