// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced journal wrapper for consistent observability

use fso_core::{
    EntityId, Event, EventId, ExpectedVid, Journal, JournalError, NotifySender, SubscriberId,
    Watch,
};
use std::time::Instant;

/// Wrapper that adds tracing to any journal
pub struct TracedJournal<J> {
    inner: J,
    name: &'static str,
}

impl<J> TracedJournal<J> {
    /// `name` identifies the journal in spans, e.g. `"repo"`
    pub fn new(name: &'static str, inner: J) -> Self {
        Self { inner, name }
    }

    pub fn inner(&self) -> &J {
        &self.inner
    }
}

impl<P, J: Journal<P>> Journal<P> for TracedJournal<J> {
    fn append(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        events: Vec<Event<P>>,
    ) -> Result<EventId, JournalError> {
        let span = tracing::debug_span!("journal.append", journal = self.name, %id);
        let _guard = span.enter();

        let count = events.len();
        let start = Instant::now();
        let result = self.inner.append(id, expected, events);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(tail) => tracing::debug!(count, %tail, elapsed_ms, "appended"),
            Err(JournalError::Conflict { .. }) => {
                tracing::debug!(count, elapsed_ms, "append rejected: stale tail")
            }
            Err(e) => tracing::error!(count, elapsed_ms, error = %e, "append failed"),
        }
        result
    }

    fn find(&self, id: EntityId, after: EventId) -> Result<Vec<Event<P>>, JournalError> {
        let span = tracing::trace_span!("journal.find", journal = self.name, %id, %after);
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.find(id, after);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(events) => tracing::trace!(count = events.len(), elapsed_ms, "found"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "find failed"),
        }
        result
    }

    fn tail(&self, id: EntityId) -> Result<EventId, JournalError> {
        self.inner.tail(id)
    }

    fn subscribe(&self, tx: NotifySender, watch: Watch) -> SubscriberId {
        let sub = self.inner.subscribe(tx, watch);
        tracing::debug!(journal = self.name, subscriber = sub.0, ?watch, "subscribed");
        sub
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        tracing::debug!(journal = self.name, subscriber = subscriber.0, "unsubscribed");
        self.inner.unsubscribe(subscriber);
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
