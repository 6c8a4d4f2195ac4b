//! The `Runnable` contract and its two supported shapes (§4.F): an
//! incremental informer (fine-grained add/update/delete per object) and a
//! state reconciler (single sentinel event, controller re-lists itself).
//!
//! The concrete watch transport is out of scope (§1); a `Runnable` here is
//! anything that can translate *some* external source into calls on a
//! [`super::controller::Controller`] — tests and embedders drive it over
//! a channel, a poll loop, or a real watch client.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// `Run(stop)` blocks until the stop signal; `HasSynced` reports whether
/// the first LIST has completed.
#[async_trait]
pub trait Runnable: Send + Sync {
    /// A human-readable name, used in logging and `Controller::start`
    /// failure messages.
    fn name(&self) -> &str;

    /// Block until `stop` fires. Implementations MUST translate external
    /// mutations into calls against the controller's cache as they are
    /// observed, and set their `HasSynced` flag true once the initial
    /// LIST phase completes.
    async fn run(&self, stop: watch::Receiver<bool>);

    /// Whether the initial LIST phase has completed.
    fn has_synced(&self) -> bool;
}

/// Shared synced-flag bookkeeping used by both runnable shapes below.
#[derive(Debug, Default)]
pub struct SyncFlag(AtomicBool);

impl SyncFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn mark_synced(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_synced(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Waits for `stop` to become `true`, or for `stop`'s sender to drop.
pub async fn wait_for_stop(mut stop: watch::Receiver<bool>) {
    loop {
        if *stop.borrow() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// A synced flag plus a name, the common skeleton both runnable shapes in
/// `super::controller` build on.
pub struct RunnableCore {
    pub name: String,
    pub synced: Arc<SyncFlag>,
}

impl RunnableCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            synced: Arc::new(SyncFlag::new()),
        }
    }
}
