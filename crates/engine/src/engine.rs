// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate engine
//!
//! Loads aggregate state by folding journals and applies commands with
//! optimistic concurrency. Writes to one id are serialized; different ids
//! proceed in parallel. Folded states are cached per id and the cache is
//! only ever extended by folding newer events. Final states are evicted.

use crate::error::TellError;
use fso_core::{
    fold, genesis, Behavior, EntityId, Event, EventId, EventIdGen, EventName, ExpectedVid,
    IdLocks, Journal, Versioned,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Engine for one aggregate kind over one journal
pub struct Engine<B: Behavior, J: ?Sized> {
    behavior: B,
    journal: Arc<J>,
    ids: Arc<dyn EventIdGen>,
    locks: IdLocks,
    cache: Mutex<HashMap<EntityId, Versioned<B::State>>>,
}

impl<B, J> Engine<B, J>
where
    B: Behavior,
    J: Journal<B::Payload> + ?Sized,
{
    pub fn new(behavior: B, journal: Arc<J>, ids: Arc<dyn EventIdGen>) -> Self {
        Self {
            behavior,
            journal,
            ids,
            locks: IdLocks::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn journal(&self) -> &Arc<J> {
        &self.journal
    }

    /// Current state of `id`
    pub fn load(&self, id: EntityId) -> Result<Versioned<B::State>, TellError> {
        self.locks.with(id, || self.load_locked(id))
    }

    fn load_locked(&self, id: EntityId) -> Result<Versioned<B::State>, TellError> {
        let cached = {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.get(&id).cloned()
        };
        let current = match cached {
            Some(cached) if self.journal.tail(id)? == cached.vid => return Ok(cached),
            Some(cached) => cached,
            None => genesis(&self.behavior, id),
        };
        let events = self.journal.find(id, current.vid)?;
        if events.is_empty() {
            return Ok(current);
        }
        let current = fold(&self.behavior, current, &events)?;
        self.remember(current.clone());
        Ok(current)
    }

    fn remember(&self, versioned: Versioned<B::State>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if self.behavior.is_final(&versioned.state) {
            cache.remove(&versioned.id);
        } else {
            cache.insert(versioned.id, versioned);
        }
    }

    /// Apply `cmd` to the current state of `id`
    pub fn tell(&self, id: EntityId, cmd: B::Command) -> Result<EventId, TellError> {
        self.tell_id_vid(id, ExpectedVid::Any, cmd)
    }

    /// Apply `cmd` if `id` is still at `expected`.
    ///
    /// Returns the vid after the command, which is the current vid when the
    /// command had no effect. A stale `expected` fails with
    /// `TellError::Concurrency` without appending.
    pub fn tell_id_vid(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        cmd: B::Command,
    ) -> Result<EventId, TellError> {
        self.locks.with(id, || self.tell_locked(id, expected, cmd))
    }

    fn tell_locked(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        cmd: B::Command,
    ) -> Result<EventId, TellError> {
        let current = self.load_locked(id)?;
        if let ExpectedVid::Exact(vid) = expected {
            if vid != current.vid {
                return Err(TellError::Concurrency {
                    id,
                    expected: vid,
                    actual: current.vid,
                });
            }
        }

        tracing::debug!(kind = B::KIND, %id, ?cmd, "tell");
        let payloads = self.behavior.tell(&current.state, cmd)?;
        if payloads.is_empty() {
            tracing::debug!(kind = B::KIND, %id, vid = %current.vid, "no-op");
            return Ok(current.vid);
        }

        let mut parent = current.vid;
        let events: Vec<_> = payloads
            .into_iter()
            .map(|payload| {
                let event_id = self.ids.next_after(parent);
                let event = Event::new(event_id, parent, payload);
                parent = event_id;
                event
            })
            .collect();
        let names: Vec<_> = events.iter().map(|e| e.payload.name()).collect();

        // Fold before appending so that nothing unfoldable reaches the journal
        let next = fold(&self.behavior, current.clone(), &events)?;
        let tail = self
            .journal
            .append(id, ExpectedVid::Exact(current.vid), events)?;
        tracing::info!(kind = B::KIND, %id, vid = %tail, events = ?names, "applied");
        self.remember(next);
        Ok(tail)
    }

    /// Drop the cached state of `id`
    pub fn forget(&self, id: EntityId) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.remove(&id);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
