// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::tier::{StorageTier, TierOp};
use super::RepoEvent;
use crate::behavior::AdvanceError;
use crate::event::EventName;
use crate::id::{EntityId, WorkflowId};
use crate::location::{Creator, Location};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A move-repo workflow that has begun but not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMoveRepo {
    pub workflow_id: WorkflowId,
    pub new_file: Location,
}

/// A move-shadow workflow that has begun but not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMoveShadow {
    pub workflow_id: WorkflowId,
    pub new_shadow_path: String,
}

/// Folded state of one repo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    pub id: EntityId,
    pub registry: String,
    /// Set once by `Initialized`
    pub global_path: String,
    pub file: Option<Location>,
    pub creator: Option<Creator>,
    pub shadow_path: Option<String>,
    pub shadow_backup_url: Option<String>,
    pub archive_url: Option<String>,
    pub storage_tier: StorageTier,
    /// Workflow of the current or most recent tier operation
    pub storage_workflow_id: Option<WorkflowId>,
    /// Operation run by `storage_workflow_id`
    pub storage_op: Option<TierOp>,
    pub move_repo: Option<ActiveMoveRepo>,
    pub move_shadow: Option<ActiveMoveShadow>,
    /// Workflow ids that have completed and must not be reused
    pub retired_workflows: Arc<BTreeSet<WorkflowId>>,
    /// Empty when no error is stored
    pub error_message: String,
}

impl RepoState {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            registry: String::new(),
            global_path: String::new(),
            file: None,
            creator: None,
            shadow_path: None,
            shadow_backup_url: None,
            archive_url: None,
            storage_tier: StorageTier::Online,
            storage_workflow_id: None,
            storage_op: None,
            move_repo: None,
            move_shadow: None,
            retired_workflows: Arc::new(BTreeSet::new()),
            error_message: String::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.global_path.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    /// Whether a move-repo or move-shadow workflow is active
    pub fn has_active_move(&self) -> bool {
        self.move_repo.is_some() || self.move_shadow.is_some()
    }

    pub fn is_retired(&self, workflow_id: &WorkflowId) -> bool {
        self.retired_workflows.contains(workflow_id)
    }

    fn retire(&mut self, workflow_id: WorkflowId) {
        Arc::make_mut(&mut self.retired_workflows).insert(workflow_id);
    }

    pub(super) fn apply(&self, event: &RepoEvent) -> Result<RepoState, AdvanceError> {
        let invalid = |reason: &str| AdvanceError::new("repo", event.name(), reason);
        if !self.is_initialized() && !matches!(event, RepoEvent::Initialized { .. }) {
            return Err(invalid("repo is not initialized"));
        }

        let mut next = self.clone();
        match event {
            RepoEvent::Initialized {
                registry,
                global_path,
                file,
                creator,
            } => {
                if self.is_initialized() {
                    return Err(invalid("already initialized"));
                }
                next.registry = registry.clone();
                next.global_path = global_path.clone();
                next.file = Some(file.clone());
                next.creator = Some(creator.clone());
            }
            RepoEvent::ShadowConfirmed { shadow_path } => {
                next.shadow_path = Some(shadow_path.clone());
            }
            RepoEvent::ShadowBackupUrlSet { url } => {
                next.shadow_backup_url = Some(url.clone());
            }
            RepoEvent::MoveRepoStarted {
                workflow_id,
                new_file,
                ..
            } => {
                if self.move_repo.is_some() {
                    return Err(invalid("move-repo already active"));
                }
                next.move_repo = Some(ActiveMoveRepo {
                    workflow_id: *workflow_id,
                    new_file: new_file.clone(),
                });
            }
            RepoEvent::RepoMoved {
                workflow_id,
                file,
                shadow_path,
                ..
            } => {
                match &self.move_repo {
                    Some(active) if active.workflow_id == *workflow_id => {}
                    _ => return Err(invalid("workflow is not the active move-repo")),
                }
                next.move_repo = None;
                next.file = Some(file.clone());
                next.shadow_path = Some(shadow_path.clone());
                next.retire(*workflow_id);
            }
            RepoEvent::MoveShadowStarted {
                workflow_id,
                new_shadow_path,
                ..
            } => {
                if self.move_shadow.is_some() {
                    return Err(invalid("move-shadow already active"));
                }
                next.move_shadow = Some(ActiveMoveShadow {
                    workflow_id: *workflow_id,
                    new_shadow_path: new_shadow_path.clone(),
                });
            }
            RepoEvent::ShadowMoved {
                workflow_id,
                shadow_path,
                ..
            } => {
                match &self.move_shadow {
                    Some(active) if active.workflow_id == *workflow_id => {}
                    _ => return Err(invalid("workflow is not the active move-shadow")),
                }
                next.move_shadow = None;
                next.shadow_path = Some(shadow_path.clone());
                next.retire(*workflow_id);
            }
            RepoEvent::TierStarted { op, workflow_id } => {
                if !op.can_begin_from(self.storage_tier) {
                    return Err(invalid("tier does not permit begin"));
                }
                next.storage_tier = op.in_progress();
                next.storage_workflow_id = Some(*workflow_id);
                next.storage_op = Some(*op);
            }
            RepoEvent::TierCompleted {
                op,
                workflow_id,
                archive_url,
            } => {
                self.check_in_progress(*op, workflow_id)
                    .map_err(invalid)?;
                next.storage_tier = op.done();
                match op {
                    TierOp::Archive => next.archive_url = archive_url.clone(),
                    TierOp::Unarchive => next.archive_url = None,
                    TierOp::Freeze | TierOp::Unfreeze => {}
                }
                next.retire(*workflow_id);
            }
            RepoEvent::TierFailed {
                op, workflow_id, ..
            } => {
                self.check_in_progress(*op, workflow_id)
                    .map_err(invalid)?;
                next.storage_tier = op.failed();
                next.retire(*workflow_id);
            }
            RepoEvent::ErrorSet { message } => {
                next.error_message = message.clone();
            }
            RepoEvent::ErrorCleared => {
                next.error_message.clear();
            }
        }
        Ok(next)
    }

    /// Whether `workflow_id` is the storage workflow and runs `op`
    pub fn is_storage_workflow(&self, op: TierOp, workflow_id: &WorkflowId) -> bool {
        self.storage_workflow_id.as_ref() == Some(workflow_id) && self.storage_op == Some(op)
    }

    fn check_in_progress(&self, op: TierOp, workflow_id: &WorkflowId) -> Result<(), &'static str> {
        if !self.is_storage_workflow(op, workflow_id) {
            return Err("storage workflow mismatch");
        }
        if self.storage_tier != op.in_progress() {
            return Err("tier operation is not in progress");
        }
        Ok(())
    }
}
