// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of id-level change notifications

use fso_core::{EntityId, NotifySender, SubscriberId, Watch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::mpsc::error::TrySendError;

/// Routes "log of id changed" hints to subscribers.
///
/// Delivery never blocks the writer. A full queue drops the hint; readers
/// recover by rescanning the journal.
#[derive(Default)]
pub struct Notifier {
    subscribers: RwLock<HashMap<SubscriberId, (Watch, NotifySender)>>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, tx: NotifySender, watch: Watch) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.insert(id, (watch, tx));
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.remove(&id);
    }

    /// Notify every matching subscriber that `id` has new events
    pub fn publish(&self, id: EntityId) {
        let mut closed = Vec::new();
        {
            let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            for (sub_id, (watch, tx)) in subs.iter() {
                if !watch.matches(&id) {
                    continue;
                }
                match tx.try_send(id) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::trace!(%id, subscriber = sub_id.0, "notification dropped");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*sub_id),
                }
            }
        }
        if !closed.is_empty() {
            let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
            for sub_id in closed {
                subs.remove(&sub_id);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
