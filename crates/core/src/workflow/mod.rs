// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow aggregates
//!
//! Move-repo and move-shadow sagas share one journal. Each workflow id is
//! used by exactly one saga kind and is never recycled.

mod move_repo;
mod move_shadow;

pub use move_repo::{MoveRepo, MoveRepoCommand, MoveRepoInit, MoveRepoState};
pub use move_shadow::{MoveShadow, MoveShadowCommand, MoveShadowInit, MoveShadowState};

use crate::event::EventName;
use crate::id::{EntityId, EventId};
use crate::location::Location;
use serde::{Deserialize, Serialize};

/// Events of the workflow journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    MoveRepoInitialized {
        repo_id: EntityId,
        repo_event_id: EventId,
        old_file: Location,
        new_file: Location,
    },
    MoveRepoStadReleased,
    MoveRepoAppAccepted,
    MoveRepoCommitted {
        repo_id: EntityId,
        new_shadow_path: String,
    },
    MoveRepoExited,
    MoveShadowInitialized {
        repo_id: EntityId,
        repo_event_id: EventId,
        old_shadow_path: String,
        new_shadow_path: String,
    },
    MoveShadowStadDisabled,
    MoveShadowCommitted {
        repo_id: EntityId,
    },
    MoveShadowExited,
}

impl EventName for WorkflowEvent {
    fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::MoveRepoInitialized { .. } => "move_repo:initialized",
            WorkflowEvent::MoveRepoStadReleased => "move_repo:stad_released",
            WorkflowEvent::MoveRepoAppAccepted => "move_repo:app_accepted",
            WorkflowEvent::MoveRepoCommitted { .. } => "move_repo:committed",
            WorkflowEvent::MoveRepoExited => "move_repo:exited",
            WorkflowEvent::MoveShadowInitialized { .. } => "move_shadow:initialized",
            WorkflowEvent::MoveShadowStadDisabled => "move_shadow:stad_disabled",
            WorkflowEvent::MoveShadowCommitted { .. } => "move_shadow:committed",
            WorkflowEvent::MoveShadowExited => "move_shadow:exited",
        }
    }
}
