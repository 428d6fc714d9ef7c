// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo aggregate
//!
//! One aggregate per repository. It records where the repo and its shadow
//! live, which storage tier holds its content, which workflow currently
//! owns it, and an operator-visible error that blocks further transitions
//! until it is cleared.

mod command;
mod state;
mod tier;

pub use state::{ActiveMoveRepo, ActiveMoveShadow, RepoState};
pub use tier::{StorageTier, TierOp};

use crate::behavior::{AdvanceError, Behavior};
use crate::error::DomainError;
use crate::event::EventName;
use crate::id::{EntityId, EventId, WorkflowId};
use crate::location::{Creator, Location};
use serde::{Deserialize, Serialize};

/// Commands accepted by a repo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCommand {
    Init {
        registry: String,
        global_path: String,
        file: Location,
        creator: Creator,
    },
    ConfirmShadow {
        shadow_path: String,
    },
    SetShadowBackupUrl {
        url: String,
    },
    BeginMoveRepo {
        workflow_id: WorkflowId,
        new_file: Location,
    },
    CommitMoveRepo {
        workflow_id: WorkflowId,
        new_shadow_path: String,
        workflow_event_id: EventId,
    },
    BeginMoveShadow {
        workflow_id: WorkflowId,
        new_shadow_path: String,
    },
    CommitMoveShadow {
        workflow_id: WorkflowId,
        workflow_event_id: EventId,
    },
    BeginTier {
        op: TierOp,
        workflow_id: WorkflowId,
    },
    /// `archive_url` is required for `TierOp::Archive` and ignored otherwise
    CommitTier {
        op: TierOp,
        workflow_id: WorkflowId,
        archive_url: Option<String>,
    },
    AbortTier {
        op: TierOp,
        workflow_id: WorkflowId,
        code: i32,
        message: String,
    },
    SetError {
        message: String,
    },
    ClearError {
        message: String,
    },
}

/// Events of the repo journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepoEvent {
    Initialized {
        registry: String,
        global_path: String,
        file: Location,
        creator: Creator,
    },
    ShadowConfirmed {
        shadow_path: String,
    },
    ShadowBackupUrlSet {
        url: String,
    },
    MoveRepoStarted {
        workflow_id: WorkflowId,
        old_file: Location,
        new_file: Location,
    },
    RepoMoved {
        workflow_id: WorkflowId,
        file: Location,
        shadow_path: String,
        workflow_event_id: EventId,
    },
    MoveShadowStarted {
        workflow_id: WorkflowId,
        old_shadow_path: String,
        new_shadow_path: String,
    },
    ShadowMoved {
        workflow_id: WorkflowId,
        shadow_path: String,
        workflow_event_id: EventId,
    },
    TierStarted {
        op: TierOp,
        workflow_id: WorkflowId,
    },
    TierCompleted {
        op: TierOp,
        workflow_id: WorkflowId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        archive_url: Option<String>,
    },
    TierFailed {
        op: TierOp,
        workflow_id: WorkflowId,
        code: i32,
        message: String,
    },
    ErrorSet {
        message: String,
    },
    ErrorCleared,
}

impl EventName for RepoEvent {
    fn name(&self) -> &'static str {
        match self {
            RepoEvent::Initialized { .. } => "repo:initialized",
            RepoEvent::ShadowConfirmed { .. } => "repo:shadow_confirmed",
            RepoEvent::ShadowBackupUrlSet { .. } => "repo:shadow_backup_url_set",
            RepoEvent::MoveRepoStarted { .. } => "repo:move_repo_started",
            RepoEvent::RepoMoved { .. } => "repo:repo_moved",
            RepoEvent::MoveShadowStarted { .. } => "repo:move_shadow_started",
            RepoEvent::ShadowMoved { .. } => "repo:shadow_moved",
            RepoEvent::TierStarted { .. } => "repo:tier_started",
            RepoEvent::TierCompleted { .. } => "repo:tier_completed",
            RepoEvent::TierFailed { .. } => "repo:tier_failed",
            RepoEvent::ErrorSet { .. } => "repo:error_set",
            RepoEvent::ErrorCleared => "repo:error_cleared",
        }
    }
}

/// Behavior of repo aggregates
#[derive(Debug, Clone, Copy, Default)]
pub struct Repo;

impl Behavior for Repo {
    type State = RepoState;
    type Payload = RepoEvent;
    type Command = RepoCommand;

    const KIND: &'static str = "repo";

    fn new_state(&self, id: EntityId) -> RepoState {
        RepoState::new(id)
    }

    fn advance(&self, state: &RepoState, event: &RepoEvent) -> Result<RepoState, AdvanceError> {
        state.apply(event)
    }

    fn tell(&self, state: &RepoState, cmd: RepoCommand) -> Result<Vec<RepoEvent>, DomainError> {
        command::decide(state, cmd)
    }
}
