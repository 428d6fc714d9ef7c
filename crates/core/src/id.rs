// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity ids, version ids and event id generation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one aggregate instance (one log in a journal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// A random id, for caller-supplied nonces such as workflow ids
    pub fn random() -> Self {
        EntityId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        EntityId(u)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(EntityId)
    }
}

/// Workflow ids are caller-supplied nonces that also key the workflow journal
pub type WorkflowId = EntityId;

/// Identifies one event.
///
/// Ids are time-sortable (UUIDv7 layout) and strictly increase within a log,
/// so the id of the last event doubles as the version of the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

/// The version of an aggregate is the id of its last event
pub type Vid = EventId;

impl EventId {
    /// Position before the first event of every log
    pub const EPOCH: EventId = EventId(Uuid::nil());

    pub fn is_epoch(&self) -> bool {
        self.0.is_nil()
    }

    /// The smallest id strictly greater than `self`
    pub fn successor(self) -> EventId {
        EventId(Uuid::from_u128(self.0.as_u128().saturating_add(1)))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(EventId)
    }
}

/// Optimistic concurrency expectation attached to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVid {
    /// Skip the check
    Any,
    /// The command was issued against this version
    Exact(Vid),
}

impl ExpectedVid {
    /// Whether a log currently at `actual` satisfies the expectation
    pub fn admits(&self, actual: Vid) -> bool {
        match self {
            ExpectedVid::Any => true,
            ExpectedVid::Exact(v) => *v == actual,
        }
    }
}

impl From<Vid> for ExpectedVid {
    fn from(v: Vid) -> Self {
        ExpectedVid::Exact(v)
    }
}

/// Allocates event ids
pub trait EventIdGen: Send + Sync {
    /// Returns an id strictly greater than `prev`
    fn next_after(&self, prev: EventId) -> EventId;
}

/// Time-ordered generator for production use
#[derive(Clone, Default)]
pub struct TimeOrderedIdGen;

impl EventIdGen for TimeOrderedIdGen {
    fn next_after(&self, prev: EventId) -> EventId {
        let id = EventId(Uuid::now_v7());
        if id > prev {
            id
        } else {
            prev.successor()
        }
    }
}

/// Sequential generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl EventIdGen for SequentialIdGen {
    fn next_after(&self, prev: EventId) -> EventId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = EventId(Uuid::from_u128(u128::from(n)));
        if id > prev {
            id
        } else {
            prev.successor()
        }
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
