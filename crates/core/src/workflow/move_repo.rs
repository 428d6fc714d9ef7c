// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Move-repo saga
//!
//! Stages: init, then stad-released and app-accepted in either order,
//! then commit with the new shadow path, then exit.

use super::WorkflowEvent;
use crate::behavior::{AdvanceError, Behavior};
use crate::error::{Conflict, DomainError};
use crate::event::EventName;
use crate::id::{EntityId, EventId};
use crate::limits::check_abs_path;
use crate::location::Location;

/// Parameters fixed when the saga starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRepoInit {
    pub repo_id: EntityId,
    pub repo_event_id: EventId,
    pub old_file: Location,
    pub new_file: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRepoState {
    pub id: EntityId,
    pub init: Option<MoveRepoInit>,
    pub is_stad_released: bool,
    pub has_app_accepted: bool,
    /// Set by the commit
    pub new_shadow_path: Option<String>,
    pub is_terminated: bool,
}

impl MoveRepoState {
    pub fn is_committed(&self) -> bool {
        self.new_shadow_path.is_some()
    }

    fn has_progress(&self) -> bool {
        self.is_stad_released || self.has_app_accepted || self.is_committed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRepoCommand {
    Init(MoveRepoInit),
    PostStadReleased,
    PostAppAccepted,
    Commit { new_shadow_path: String },
    Exit,
}

/// Behavior of move-repo workflows
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveRepo;

impl MoveRepo {
    fn post(
        state: &MoveRepoState,
        already: bool,
        event: WorkflowEvent,
    ) -> Result<Vec<WorkflowEvent>, DomainError> {
        if state.init.is_none() {
            return Err(DomainError::Uninitialized);
        }
        if state.is_terminated {
            return Err(Conflict::Terminated.into());
        }
        if already {
            return Ok(vec![]);
        }
        Ok(vec![event])
    }
}

impl Behavior for MoveRepo {
    type State = MoveRepoState;
    type Payload = WorkflowEvent;
    type Command = MoveRepoCommand;

    const KIND: &'static str = "move_repo";

    fn new_state(&self, id: EntityId) -> MoveRepoState {
        MoveRepoState {
            id,
            init: None,
            is_stad_released: false,
            has_app_accepted: false,
            new_shadow_path: None,
            is_terminated: false,
        }
    }

    fn is_final(&self, state: &MoveRepoState) -> bool {
        state.is_terminated
    }

    fn advance(
        &self,
        state: &MoveRepoState,
        event: &WorkflowEvent,
    ) -> Result<MoveRepoState, AdvanceError> {
        let invalid = |reason: &str| AdvanceError::new(Self::KIND, event.name(), reason);
        if state.is_terminated {
            return Err(invalid("workflow has terminated"));
        }
        let initialized = state.init.is_some();
        let mut next = state.clone();
        match event {
            WorkflowEvent::MoveRepoInitialized {
                repo_id,
                repo_event_id,
                old_file,
                new_file,
            } => {
                if initialized {
                    return Err(invalid("already initialized"));
                }
                next.init = Some(MoveRepoInit {
                    repo_id: *repo_id,
                    repo_event_id: *repo_event_id,
                    old_file: old_file.clone(),
                    new_file: new_file.clone(),
                });
            }
            WorkflowEvent::MoveRepoStadReleased if initialized => next.is_stad_released = true,
            WorkflowEvent::MoveRepoAppAccepted if initialized => next.has_app_accepted = true,
            WorkflowEvent::MoveRepoCommitted {
                new_shadow_path, ..
            } => {
                if !(state.is_stad_released && state.has_app_accepted) {
                    return Err(invalid("commit before release"));
                }
                next.new_shadow_path = Some(new_shadow_path.clone());
            }
            WorkflowEvent::MoveRepoExited => {
                if !state.is_committed() {
                    return Err(invalid("exit before commit"));
                }
                next.is_terminated = true;
            }
            WorkflowEvent::MoveRepoStadReleased | WorkflowEvent::MoveRepoAppAccepted => {
                return Err(invalid("workflow is not initialized"));
            }
            WorkflowEvent::MoveShadowInitialized { .. }
            | WorkflowEvent::MoveShadowStadDisabled
            | WorkflowEvent::MoveShadowCommitted { .. }
            | WorkflowEvent::MoveShadowExited => {
                return Err(invalid("move-shadow event in a move-repo workflow"));
            }
        }
        Ok(next)
    }

    fn tell(
        &self,
        state: &MoveRepoState,
        cmd: MoveRepoCommand,
    ) -> Result<Vec<WorkflowEvent>, DomainError> {
        match cmd {
            MoveRepoCommand::Init(init) => {
                if state.is_terminated {
                    if state.init.as_ref() == Some(&init) {
                        return Ok(vec![]);
                    }
                    return Err(Conflict::WorkflowReuse(state.id).into());
                }
                if state.has_progress() {
                    return Err(Conflict::StateAdvanced.into());
                }
                match &state.init {
                    Some(existing) if *existing == init => Ok(vec![]),
                    Some(existing) => Err(Conflict::Init(format!(
                        "workflow moves repo {} from {}",
                        existing.repo_id, existing.old_file
                    ))
                    .into()),
                    None => Ok(vec![WorkflowEvent::MoveRepoInitialized {
                        repo_id: init.repo_id,
                        repo_event_id: init.repo_event_id,
                        old_file: init.old_file,
                        new_file: init.new_file,
                    }]),
                }
            }
            MoveRepoCommand::PostStadReleased => Self::post(
                state,
                state.is_stad_released,
                WorkflowEvent::MoveRepoStadReleased,
            ),
            MoveRepoCommand::PostAppAccepted => Self::post(
                state,
                state.has_app_accepted,
                WorkflowEvent::MoveRepoAppAccepted,
            ),
            MoveRepoCommand::Commit { new_shadow_path } => {
                check_abs_path("new shadow path", &new_shadow_path)?;
                let Some(init) = &state.init else {
                    return Err(DomainError::Uninitialized);
                };
                if let Some(committed) = &state.new_shadow_path {
                    if *committed == new_shadow_path {
                        return Ok(vec![]);
                    }
                    if state.is_terminated {
                        return Err(Conflict::Terminated.into());
                    }
                    return Err(Conflict::StateAdvanced.into());
                }
                if state.is_terminated {
                    return Err(Conflict::Terminated.into());
                }
                if !(state.is_stad_released && state.has_app_accepted) {
                    return Err(Conflict::NotYetReleased.into());
                }
                Ok(vec![WorkflowEvent::MoveRepoCommitted {
                    repo_id: init.repo_id,
                    new_shadow_path,
                }])
            }
            MoveRepoCommand::Exit => {
                if state.init.is_none() {
                    return Err(DomainError::Uninitialized);
                }
                if state.is_terminated {
                    return Ok(vec![]);
                }
                if !state.is_committed() {
                    return Err(Conflict::NotYetMoved.into());
                }
                Ok(vec![WorkflowEvent::MoveRepoExited])
            }
        }
    }
}

#[cfg(test)]
#[path = "move_repo_tests.rs"]
mod tests;
