// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal contract
//!
//! A journal is an append-only, per-entity event log with optimistic
//! concurrency on append and id-level change notifications. Notifications
//! are hints delivered through bounded queues and may be dropped; the
//! journal contents are authoritative.

use crate::event::Event;
use crate::id::{EntityId, EventId, ExpectedVid};
use thiserror::Error;
use tokio::sync::mpsc;

/// Sender half of a notification queue
pub type NotifySender = mpsc::Sender<EntityId>;
/// Receiver half of a notification queue
pub type NotifyReceiver = mpsc::Receiver<EntityId>;

/// Errors from journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("tail mismatch for {id}: expected {expected}, actual {actual}")]
    Conflict {
        id: EntityId,
        expected: EventId,
        actual: EventId,
    },
    #[error("broken event chain for {id} at event {event}")]
    BrokenChain { id: EntityId, event: EventId },
    #[error("corrupt journal record for {id}: {reason}")]
    Corrupt { id: EntityId, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which ids a subscription wants to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    Id(EntityId),
    All,
}

impl Watch {
    pub fn matches(&self, id: &EntityId) -> bool {
        match self {
            Watch::Id(watched) => watched == id,
            Watch::All => true,
        }
    }
}

/// Handle for unsubscribing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Append-only, subscribable per-entity event log
pub trait Journal<P>: Send + Sync {
    /// Append `events` to the log of `id`.
    ///
    /// Fails with `JournalError::Conflict` unless `expected` admits the
    /// current tail, and with `BrokenChain` unless the events continue the
    /// parent chain with strictly increasing ids. Returns the new tail.
    fn append(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        events: Vec<Event<P>>,
    ) -> Result<EventId, JournalError>;

    /// Events of `id` strictly after `after`, in log order
    fn find(&self, id: EntityId, after: EventId) -> Result<Vec<Event<P>>, JournalError>;

    /// Id of the last event of `id`, `EPOCH` if the log is empty
    fn tail(&self, id: EntityId) -> Result<EventId, JournalError>;

    /// Deliver the ids of updated logs matching `watch` to `tx`
    fn subscribe(&self, tx: NotifySender, watch: Watch) -> SubscriberId;

    fn unsubscribe(&self, subscriber: SubscriberId);
}

/// Check that `events` continue a log currently ending at `tail`.
///
/// Returns the new tail.
pub fn check_chain<P>(
    id: EntityId,
    tail: EventId,
    events: &[Event<P>],
) -> Result<EventId, JournalError> {
    let mut prev = tail;
    for event in events {
        if event.parent != prev || event.id <= prev {
            return Err(JournalError::BrokenChain {
                id,
                event: event.id,
            });
        }
        prev = event.id;
    }
    Ok(prev)
}
