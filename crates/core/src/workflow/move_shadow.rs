// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Move-shadow saga: init, stad-disabled, commit, exit

use super::WorkflowEvent;
use crate::behavior::{AdvanceError, Behavior};
use crate::error::{Conflict, DomainError};
use crate::event::EventName;
use crate::id::{EntityId, EventId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveShadowInit {
    pub repo_id: EntityId,
    pub repo_event_id: EventId,
    pub old_shadow_path: String,
    pub new_shadow_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveShadowState {
    pub id: EntityId,
    pub init: Option<MoveShadowInit>,
    pub is_stad_disabled: bool,
    pub is_committed: bool,
    pub is_terminated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveShadowCommand {
    Init(MoveShadowInit),
    PostStadDisabled,
    Commit,
    Exit,
}

/// Behavior of move-shadow workflows
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveShadow;

impl Behavior for MoveShadow {
    type State = MoveShadowState;
    type Payload = WorkflowEvent;
    type Command = MoveShadowCommand;

    const KIND: &'static str = "move_shadow";

    fn new_state(&self, id: EntityId) -> MoveShadowState {
        MoveShadowState {
            id,
            init: None,
            is_stad_disabled: false,
            is_committed: false,
            is_terminated: false,
        }
    }

    fn is_final(&self, state: &MoveShadowState) -> bool {
        state.is_terminated
    }

    fn advance(
        &self,
        state: &MoveShadowState,
        event: &WorkflowEvent,
    ) -> Result<MoveShadowState, AdvanceError> {
        let invalid = |reason: &str| AdvanceError::new(Self::KIND, event.name(), reason);
        if state.is_terminated {
            return Err(invalid("workflow has terminated"));
        }
        let mut next = state.clone();
        match event {
            WorkflowEvent::MoveShadowInitialized {
                repo_id,
                repo_event_id,
                old_shadow_path,
                new_shadow_path,
            } => {
                if state.init.is_some() {
                    return Err(invalid("already initialized"));
                }
                next.init = Some(MoveShadowInit {
                    repo_id: *repo_id,
                    repo_event_id: *repo_event_id,
                    old_shadow_path: old_shadow_path.clone(),
                    new_shadow_path: new_shadow_path.clone(),
                });
            }
            WorkflowEvent::MoveShadowStadDisabled => {
                if state.init.is_none() {
                    return Err(invalid("workflow is not initialized"));
                }
                next.is_stad_disabled = true;
            }
            WorkflowEvent::MoveShadowCommitted { .. } => {
                if !state.is_stad_disabled {
                    return Err(invalid("commit before stad disabled"));
                }
                next.is_committed = true;
            }
            WorkflowEvent::MoveShadowExited => {
                if !state.is_committed {
                    return Err(invalid("exit before commit"));
                }
                next.is_terminated = true;
            }
            WorkflowEvent::MoveRepoInitialized { .. }
            | WorkflowEvent::MoveRepoStadReleased
            | WorkflowEvent::MoveRepoAppAccepted
            | WorkflowEvent::MoveRepoCommitted { .. }
            | WorkflowEvent::MoveRepoExited => {
                return Err(invalid("move-repo event in a move-shadow workflow"));
            }
        }
        Ok(next)
    }

    fn tell(
        &self,
        state: &MoveShadowState,
        cmd: MoveShadowCommand,
    ) -> Result<Vec<WorkflowEvent>, DomainError> {
        if let MoveShadowCommand::Init(init) = cmd {
            return match &state.init {
                Some(existing) if *existing == init => Ok(vec![]),
                Some(_) if state.is_terminated => Err(Conflict::WorkflowReuse(state.id).into()),
                Some(existing) => Err(Conflict::Init(format!(
                    "workflow moves shadow of repo {} from `{}`",
                    existing.repo_id, existing.old_shadow_path
                ))
                .into()),
                None => Ok(vec![WorkflowEvent::MoveShadowInitialized {
                    repo_id: init.repo_id,
                    repo_event_id: init.repo_event_id,
                    old_shadow_path: init.old_shadow_path,
                    new_shadow_path: init.new_shadow_path,
                }]),
            };
        }
        let Some(init) = &state.init else {
            return Err(DomainError::Uninitialized);
        };

        match cmd {
            MoveShadowCommand::Init(_) => Ok(vec![]),
            MoveShadowCommand::PostStadDisabled => {
                if state.is_terminated {
                    return Err(Conflict::Terminated.into());
                }
                if state.is_stad_disabled {
                    return Ok(vec![]);
                }
                Ok(vec![WorkflowEvent::MoveShadowStadDisabled])
            }
            MoveShadowCommand::Commit => {
                if state.is_committed {
                    return Ok(vec![]);
                }
                if state.is_terminated {
                    return Err(Conflict::Terminated.into());
                }
                if !state.is_stad_disabled {
                    return Err(Conflict::NotYetDisabled.into());
                }
                Ok(vec![WorkflowEvent::MoveShadowCommitted {
                    repo_id: init.repo_id,
                }])
            }
            MoveShadowCommand::Exit => {
                if state.is_terminated {
                    return Ok(vec![]);
                }
                if !state.is_committed {
                    return Err(Conflict::NotYetMoved.into());
                }
                Ok(vec![WorkflowEvent::MoveShadowExited])
            }
        }
    }
}

#[cfg(test)]
#[path = "move_shadow_tests.rs"]
mod tests;
