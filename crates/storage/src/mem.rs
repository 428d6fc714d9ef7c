// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory journal

use crate::notify::Notifier;
use fso_core::journal::check_chain;
use fso_core::{
    EntityId, Event, EventId, ExpectedVid, Journal, JournalError, NotifySender, SubscriberId,
    Watch,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Journal held entirely in memory
pub struct MemJournal<P> {
    logs: RwLock<HashMap<EntityId, Vec<Event<P>>>>,
    notifier: Notifier,
}

impl<P> MemJournal<P> {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            notifier: Notifier::new(),
        }
    }

    /// Total number of events across all logs
    pub fn len(&self) -> usize {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        logs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P> Default for MemJournal<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + Send + Sync> Journal<P> for MemJournal<P> {
    fn append(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        events: Vec<Event<P>>,
    ) -> Result<EventId, JournalError> {
        let tail = {
            let mut logs = self.logs.write().unwrap_or_else(|e| e.into_inner());
            let log = logs.entry(id).or_default();
            let actual = log.last().map(|e| e.id).unwrap_or(EventId::EPOCH);
            if !expected.admits(actual) {
                return Err(JournalError::Conflict {
                    id,
                    expected: match expected {
                        ExpectedVid::Exact(vid) => vid,
                        ExpectedVid::Any => actual,
                    },
                    actual,
                });
            }
            if events.is_empty() {
                return Ok(actual);
            }
            let tail = check_chain(id, actual, &events)?;
            log.extend(events);
            tail
        };
        self.notifier.publish(id);
        Ok(tail)
    }

    fn find(&self, id: EntityId, after: EventId) -> Result<Vec<Event<P>>, JournalError> {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        Ok(logs
            .get(&id)
            .map(|log| log.iter().filter(|e| e.id > after).cloned().collect())
            .unwrap_or_default())
    }

    fn tail(&self, id: EntityId) -> Result<EventId, JournalError> {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        Ok(logs
            .get(&id)
            .and_then(|log| log.last())
            .map(|e| e.id)
            .unwrap_or(EventId::EPOCH))
    }

    fn subscribe(&self, tx: NotifySender, watch: Watch) -> SubscriberId {
        self.notifier.subscribe(tx, watch)
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.notifier.unsubscribe(subscriber);
    }
}

#[cfg(test)]
#[path = "mem_tests.rs"]
mod tests;
