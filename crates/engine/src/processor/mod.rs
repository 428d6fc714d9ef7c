// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background processors
//!
//! A processor follows one or more journals and issues the commands that
//! keep downstream aggregates consistent with upstream ones. Every pass
//! subscribes before it reads, so no update between the read and the
//! subscription is missed. A failed pass is retried from scratch after a
//! fixed delay until shutdown.

mod registry_init;
mod replicate;
mod repo_init;

pub use registry_init::{RegistryInit, RegistryInitAction};
pub use replicate::Replicate;
pub use repo_init::{RepoInit, RepoInitAction};

use crate::error::{ProcessorError, TellError};
use async_trait::async_trait;
use fso_core::{EntityId, EventId, Journal, NotifyReceiver, SubscriberId, Watch};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Cancellation signal; `true` means shut down
pub type Shutdown = watch::Receiver<bool>;

/// One long-running control loop
#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run until cancelled or until the pass fails.
    ///
    /// Returns `Ok` only after observing cancellation.
    async fn run_once(&self, shutdown: &mut Shutdown) -> Result<(), ProcessorError>;
}

/// Run `processor` until `shutdown` fires, retrying failed passes
pub async fn run_forever<P>(processor: Arc<P>, mut shutdown: Shutdown, retry_delay: Duration)
where
    P: Processor + ?Sized,
{
    tracing::info!(processor = processor.name(), "processor started");
    while !is_cancelled(&shutdown) {
        match processor.run_once(&mut shutdown).await {
            Ok(()) => {}
            Err(e) => tracing::warn!(
                processor = processor.name(),
                error = %e,
                retry_in = ?retry_delay,
                "processor pass failed"
            ),
        }
        if !sleep_or_cancel(&mut shutdown, retry_delay).await {
            break;
        }
    }
    tracing::info!(processor = processor.name(), "processor stopped");
}

pub fn is_cancelled(shutdown: &Shutdown) -> bool {
    *shutdown.borrow()
}

/// Resolves once shutdown is requested or the sender is gone
pub async fn cancelled(shutdown: &mut Shutdown) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Sleep for `duration`; returns `false` if cancelled first
pub async fn sleep_or_cancel(shutdown: &mut Shutdown, duration: Duration) -> bool {
    if is_cancelled(shutdown) {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancelled(shutdown) => false,
    }
}

/// A journal subscription that is dropped with the pass that owns it
pub(crate) struct Subscription<P: 'static> {
    journal: Arc<dyn Journal<P>>,
    id: SubscriberId,
}

impl<P: 'static> Subscription<P> {
    pub(crate) fn new(journal: &Arc<dyn Journal<P>>, tx: mpsc::Sender<EntityId>, watch: Watch) -> Self {
        let id = journal.subscribe(tx, watch);
        Self {
            journal: Arc::clone(journal),
            id,
        }
    }
}

impl<P: 'static> Drop for Subscription<P> {
    fn drop(&mut self) {
        self.journal.unsubscribe(self.id);
    }
}

/// Discard queued notifications; the caller is about to re-read anyway
pub(crate) fn drain(rx: &mut NotifyReceiver) {
    while rx.try_recv().is_ok() {}
}

/// Outcome of a command issued by a processor.
///
/// Rejections are logged and skipped, since retrying the same command
/// against the same state cannot succeed. Everything else fails the pass.
pub(crate) fn settle(
    kind: &'static str,
    id: EntityId,
    result: Result<EventId, TellError>,
) -> Result<Option<EventId>, ProcessorError> {
    match result {
        Ok(vid) => Ok(Some(vid)),
        Err(TellError::Domain(e)) => {
            tracing::warn!(kind, %id, error = %e, "command rejected, skipping");
            Ok(None)
        }
        Err(source) => Err(ProcessorError::Tell { kind, id, source }),
    }
}

/// Map a failed load into a pass failure
pub(crate) fn load_failed(kind: &'static str, id: EntityId) -> impl FnOnce(TellError) -> ProcessorError {
    move |source| ProcessorError::Tell { kind, id, source }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
