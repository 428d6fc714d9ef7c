// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fso-core: event-sourced aggregates for the fleet repository tracker
//!
//! This crate provides:
//! - Entity and event identifiers, deterministic name-derived ids
//! - The journal contract consumed by the engine
//! - The `Behavior` trait and a checked fold
//! - Pure state machines for the fleet root, registries, repos and the
//!   move-repo / move-shadow workflows

pub mod id;
pub mod limits;
pub mod locks;
pub mod naming;

pub mod behavior;
pub mod error;
pub mod event;
pub mod journal;
pub mod location;

// Aggregates (order matters for dependencies)
pub mod fleet;
pub mod registry;
pub mod repo;
pub mod workflow;

// Re-exports
pub use behavior::{fold, genesis, AdvanceError, Behavior, FoldError, Versioned};
pub use error::{Conflict, DomainError};
pub use event::{Event, EventName};
pub use id::{
    EntityId, EventId, EventIdGen, ExpectedVid, SequentialIdGen, TimeOrderedIdGen, Vid,
    WorkflowId,
};
pub use journal::{Journal, JournalError, NotifyReceiver, NotifySender, SubscriberId, Watch};
pub use location::{Creator, Location};
pub use locks::IdLocks;
pub use naming::Namer;

pub use fleet::{Fleet, FleetCommand, FleetEvent, FleetState, RegistryEntry};
pub use registry::{Registry, RegistryCommand, RegistryEvent, RegistryState, Root};
pub use repo::{Repo, RepoCommand, RepoEvent, RepoState, StorageTier, TierOp};
pub use workflow::{
    MoveRepo, MoveRepoCommand, MoveRepoInit, MoveRepoState, MoveShadow, MoveShadowCommand,
    MoveShadowInit, MoveShadowState, WorkflowEvent,
};
