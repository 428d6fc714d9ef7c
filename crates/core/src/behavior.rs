// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The aggregate behavior contract and the checked fold
//!
//! A `Behavior` describes one kind of aggregate: its empty state, how an
//! event advances the state, and how a command turns into events. Both
//! `advance` and `tell` are pure. `advance` takes the state by reference and
//! returns a new value, so a fold never aliases a caller's state.

use crate::error::DomainError;
use crate::event::{Event, EventName};
use crate::id::{EntityId, EventId, Vid};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

/// An event that cannot be applied to the state it was folded onto
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{event} does not apply to {kind}: {reason}")]
pub struct AdvanceError {
    pub kind: &'static str,
    pub event: &'static str,
    pub reason: String,
}

impl AdvanceError {
    pub fn new(kind: &'static str, event: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind,
            event,
            reason: reason.into(),
        }
    }
}

/// A journal that cannot be folded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    #[error("event {event} of {id} does not continue the chain at {expected_parent}")]
    BrokenChain {
        id: EntityId,
        event: EventId,
        expected_parent: EventId,
    },
    #[error("invalid event {event} of {id}: {source}")]
    Advance {
        id: EntityId,
        event: EventId,
        #[source]
        source: AdvanceError,
    },
}

/// One kind of event-sourced aggregate
pub trait Behavior: Send + Sync + 'static {
    type State: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Payload: Clone + Debug + EventName + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Command: Debug + Send;

    /// Name used in logs and errors
    const KIND: &'static str;

    /// State of an aggregate without events
    fn new_state(&self, id: EntityId) -> Self::State;

    /// Apply one event
    fn advance(
        &self,
        state: &Self::State,
        payload: &Self::Payload,
    ) -> Result<Self::State, AdvanceError>;

    /// Decide the events for a command.
    ///
    /// Returns no events when the effect of the command is already reflected
    /// in `state`.
    fn tell(
        &self,
        state: &Self::State,
        cmd: Self::Command,
    ) -> Result<Vec<Self::Payload>, DomainError>;

    /// Whether `state` accepts no further events. Final states are not
    /// kept in memory by the engine.
    fn is_final(&self, _state: &Self::State) -> bool {
        false
    }
}

/// A state together with its position in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<S> {
    pub id: EntityId,
    pub vid: Vid,
    pub state: S,
}

impl<S> Versioned<S> {
    /// Whether any event has been folded
    pub fn exists(&self) -> bool {
        !self.vid.is_epoch()
    }
}

/// State of `id` before its first event
pub fn genesis<B: Behavior>(behavior: &B, id: EntityId) -> Versioned<B::State> {
    Versioned {
        id,
        vid: EventId::EPOCH,
        state: behavior.new_state(id),
    }
}

/// Fold `events` onto `current`, verifying the parent chain
pub fn fold<B: Behavior>(
    behavior: &B,
    current: Versioned<B::State>,
    events: &[Event<B::Payload>],
) -> Result<Versioned<B::State>, FoldError> {
    let Versioned { id, mut vid, mut state } = current;
    for event in events {
        if event.parent != vid || event.id <= vid {
            return Err(FoldError::BrokenChain {
                id,
                event: event.id,
                expected_parent: vid,
            });
        }
        state = behavior
            .advance(&state, &event.payload)
            .map_err(|source| FoldError::Advance {
                id,
                event: event.id,
                source,
            })?;
        vid = event.id;
    }
    Ok(Versioned { id, vid, state })
}
