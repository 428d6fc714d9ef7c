// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event envelope stored in journals

use crate::id::EventId;
use serde::{Deserialize, Serialize};

/// An immutable journal record.
///
/// `parent` is the id of the previous event in the same log (`EPOCH` for the
/// first event), forming an auditable chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<P> {
    pub id: EventId,
    pub parent: EventId,
    pub payload: P,
}

impl<P> Event<P> {
    pub fn new(id: EventId, parent: EventId, payload: P) -> Self {
        Self {
            id,
            parent,
            payload,
        }
    }
}

/// Stable event names for logging
pub trait EventName {
    fn name(&self) -> &'static str;
}
