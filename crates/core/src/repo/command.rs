// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handling for repos

use super::state::RepoState;
use super::tier::{StorageTier, TierOp};
use super::{RepoCommand, RepoEvent};
use crate::error::{Conflict, DomainError};
use crate::id::{EventId, WorkflowId};
use crate::limits::{
    check_abs_path, check_name, check_text, MAX_ERROR_MESSAGE_LEN, MAX_PATH_LEN,
    MAX_STATUS_MESSAGE_LEN,
};
use crate::location::{Creator, Location};

type Decision = Result<Vec<RepoEvent>, DomainError>;

pub(super) fn decide(state: &RepoState, cmd: RepoCommand) -> Decision {
    match cmd {
        RepoCommand::Init {
            registry,
            global_path,
            file,
            creator,
        } => init(state, registry, global_path, file, creator),
        RepoCommand::ConfirmShadow { shadow_path } => confirm_shadow(state, shadow_path),
        RepoCommand::SetShadowBackupUrl { url } => set_shadow_backup_url(state, url),
        RepoCommand::BeginMoveRepo {
            workflow_id,
            new_file,
        } => begin_move_repo(state, workflow_id, new_file),
        RepoCommand::CommitMoveRepo {
            workflow_id,
            new_shadow_path,
            workflow_event_id,
        } => commit_move_repo(state, workflow_id, new_shadow_path, workflow_event_id),
        RepoCommand::BeginMoveShadow {
            workflow_id,
            new_shadow_path,
        } => begin_move_shadow(state, workflow_id, new_shadow_path),
        RepoCommand::CommitMoveShadow {
            workflow_id,
            workflow_event_id,
        } => commit_move_shadow(state, workflow_id, workflow_event_id),
        RepoCommand::BeginTier { op, workflow_id } => begin_tier(state, op, workflow_id),
        RepoCommand::CommitTier {
            op,
            workflow_id,
            archive_url,
        } => commit_tier(state, op, workflow_id, archive_url),
        RepoCommand::AbortTier {
            op,
            workflow_id,
            code,
            message,
        } => abort_tier(state, op, workflow_id, code, message),
        RepoCommand::SetError { message } => set_error(state, message),
        RepoCommand::ClearError { message } => clear_error(state, message),
    }
}

fn require_initialized(state: &RepoState) -> Result<(), DomainError> {
    if state.is_initialized() {
        Ok(())
    } else {
        Err(DomainError::Uninitialized)
    }
}

fn check_location(what: &str, location: &Location) -> Result<(), DomainError> {
    check_name(&format!("{} host", what), &location.host)?;
    check_abs_path(&format!("{} path", what), &location.path)
}

fn init(
    state: &RepoState,
    registry: String,
    global_path: String,
    file: Location,
    creator: Creator,
) -> Decision {
    check_name("registry", &registry)?;
    check_abs_path("global path", &global_path)?;
    check_location("file", &file)?;

    if state.is_initialized() {
        let same = state.registry == registry
            && state.global_path == global_path
            && state.file.as_ref() == Some(&file);
        if same {
            return Ok(vec![]);
        }
        return Err(Conflict::Init(format!(
            "repo is `{}` in registry `{}`",
            state.global_path, state.registry
        ))
        .into());
    }

    Ok(vec![RepoEvent::Initialized {
        registry,
        global_path,
        file,
        creator,
    }])
}

fn confirm_shadow(state: &RepoState, shadow_path: String) -> Decision {
    check_abs_path("shadow path", &shadow_path)?;
    require_initialized(state)?;
    match &state.shadow_path {
        Some(existing) if *existing == shadow_path => Ok(vec![]),
        Some(existing) => {
            Err(Conflict::Init(format!("shadow already confirmed at `{}`", existing)).into())
        }
        None => Ok(vec![RepoEvent::ShadowConfirmed { shadow_path }]),
    }
}

fn set_shadow_backup_url(state: &RepoState, url: String) -> Decision {
    check_text("shadow backup url", &url, MAX_PATH_LEN)?;
    require_initialized(state)?;
    if state.shadow_path.is_none() {
        return Err(Conflict::NoShadow.into());
    }
    if state.shadow_backup_url.as_deref() == Some(url.as_str()) {
        return Ok(vec![]);
    }
    Ok(vec![RepoEvent::ShadowBackupUrlSet { url }])
}

/// Checks shared by both move workflows once the workflow is known to be new
fn check_move_start(state: &RepoState, workflow_id: WorkflowId) -> Result<(), DomainError> {
    if state.is_retired(&workflow_id) {
        return Err(Conflict::WorkflowReuse(workflow_id).into());
    }
    if state.has_active_move() {
        return Err(Conflict::Workflow.into());
    }
    if state.has_error() {
        return Err(Conflict::RepoError.into());
    }
    Ok(())
}

fn begin_move_repo(state: &RepoState, workflow_id: WorkflowId, new_file: Location) -> Decision {
    check_location("new file", &new_file)?;
    require_initialized(state)?;
    if let Some(active) = &state.move_repo {
        if active.workflow_id == workflow_id {
            return Err(Conflict::WorkflowActive(workflow_id).into());
        }
    }
    check_move_start(state, workflow_id)?;
    if state.storage_tier != StorageTier::Online {
        return Err(Conflict::StorageTier {
            tier: state.storage_tier,
            op: "move-repo",
        }
        .into());
    }
    let Some(old_file) = state.file.clone() else {
        return Err(DomainError::Uninitialized);
    };
    Ok(vec![RepoEvent::MoveRepoStarted {
        workflow_id,
        old_file,
        new_file,
    }])
}

fn commit_move_repo(
    state: &RepoState,
    workflow_id: WorkflowId,
    new_shadow_path: String,
    workflow_event_id: EventId,
) -> Decision {
    check_abs_path("new shadow path", &new_shadow_path)?;
    require_initialized(state)?;
    if state.is_retired(&workflow_id) {
        return Ok(vec![]);
    }
    match &state.move_repo {
        Some(active) if active.workflow_id == workflow_id => Ok(vec![RepoEvent::RepoMoved {
            workflow_id,
            file: active.new_file.clone(),
            shadow_path: new_shadow_path,
            workflow_event_id,
        }]),
        _ => Err(Conflict::Workflow.into()),
    }
}

fn begin_move_shadow(state: &RepoState, workflow_id: WorkflowId, new_shadow_path: String) -> Decision {
    check_abs_path("new shadow path", &new_shadow_path)?;
    require_initialized(state)?;
    if let Some(active) = &state.move_shadow {
        if active.workflow_id == workflow_id {
            return Err(Conflict::WorkflowActive(workflow_id).into());
        }
    }
    check_move_start(state, workflow_id)?;
    if state.storage_tier.is_transitional() {
        return Err(Conflict::StorageTier {
            tier: state.storage_tier,
            op: "move-shadow",
        }
        .into());
    }
    let Some(old_shadow_path) = state.shadow_path.clone() else {
        return Err(Conflict::NoShadow.into());
    };
    Ok(vec![RepoEvent::MoveShadowStarted {
        workflow_id,
        old_shadow_path,
        new_shadow_path,
    }])
}

fn commit_move_shadow(
    state: &RepoState,
    workflow_id: WorkflowId,
    workflow_event_id: EventId,
) -> Decision {
    require_initialized(state)?;
    if state.is_retired(&workflow_id) {
        return Ok(vec![]);
    }
    match &state.move_shadow {
        Some(active) if active.workflow_id == workflow_id => Ok(vec![RepoEvent::ShadowMoved {
            workflow_id,
            shadow_path: active.new_shadow_path.clone(),
            workflow_event_id,
        }]),
        _ => Err(Conflict::Workflow.into()),
    }
}

fn tier_conflict(state: &RepoState, op: TierOp) -> DomainError {
    Conflict::StorageTier {
        tier: state.storage_tier,
        op: op.as_str(),
    }
    .into()
}

fn begin_tier(state: &RepoState, op: TierOp, workflow_id: WorkflowId) -> Decision {
    require_initialized(state)?;
    if state.is_storage_workflow(op, &workflow_id) && op.is_reflected_in(state.storage_tier) {
        return Ok(vec![]);
    }
    if state.is_retired(&workflow_id) {
        return Err(Conflict::WorkflowReuse(workflow_id).into());
    }
    if state.has_active_move() {
        return Err(Conflict::Workflow.into());
    }
    if state.has_error() {
        return Err(Conflict::RepoError.into());
    }
    if state.storage_tier.is_transitional() {
        return Err(Conflict::StorageWorkflow.into());
    }
    if !op.can_begin_from(state.storage_tier) {
        return Err(tier_conflict(state, op));
    }
    Ok(vec![RepoEvent::TierStarted { op, workflow_id }])
}

fn commit_tier(
    state: &RepoState,
    op: TierOp,
    workflow_id: WorkflowId,
    archive_url: Option<String>,
) -> Decision {
    let archive_url = match op {
        TierOp::Archive => {
            let Some(url) = archive_url else {
                return Err(DomainError::validation("archive commit requires an archive url"));
            };
            check_text("archive url", &url, MAX_PATH_LEN)?;
            Some(url)
        }
        TierOp::Freeze | TierOp::Unfreeze | TierOp::Unarchive => None,
    };
    require_initialized(state)?;
    if !state.is_storage_workflow(op, &workflow_id) {
        return Err(Conflict::StorageWorkflow.into());
    }
    if state.storage_tier == op.done() {
        return Ok(vec![]);
    }
    if state.storage_tier != op.in_progress() {
        return Err(tier_conflict(state, op));
    }
    Ok(vec![RepoEvent::TierCompleted {
        op,
        workflow_id,
        archive_url,
    }])
}

fn abort_tier(
    state: &RepoState,
    op: TierOp,
    workflow_id: WorkflowId,
    code: i32,
    message: String,
) -> Decision {
    if code == 0 {
        return Err(DomainError::validation("abort requires a non-zero status code"));
    }
    check_text("status message", &message, MAX_STATUS_MESSAGE_LEN)?;
    require_initialized(state)?;
    if !state.is_storage_workflow(op, &workflow_id) {
        return Err(Conflict::StorageWorkflow.into());
    }
    if state.storage_tier == op.failed() {
        return Ok(vec![]);
    }
    if state.storage_tier != op.in_progress() {
        return Err(tier_conflict(state, op));
    }

    let cause = format!("{} failed: status {}: {}", op, code, message);
    let mut events = vec![RepoEvent::TierFailed {
        op,
        workflow_id,
        code,
        message,
    }];
    // An error stored meanwhile stays authoritative
    if !state.has_error() {
        events.push(RepoEvent::ErrorSet { message: cause });
    }
    Ok(events)
}

fn set_error(state: &RepoState, message: String) -> Decision {
    check_text("error message", &message, MAX_ERROR_MESSAGE_LEN)?;
    require_initialized(state)?;
    if state.error_message == message {
        return Ok(vec![]);
    }
    if state.has_error() {
        return Err(Conflict::RepoError.into());
    }
    Ok(vec![RepoEvent::ErrorSet { message }])
}

fn clear_error(state: &RepoState, message: String) -> Decision {
    require_initialized(state)?;
    if !state.has_error() {
        return Ok(vec![]);
    }
    if state.error_message != message {
        return Err(Conflict::ErrorMismatch.into());
    }
    Ok(vec![RepoEvent::ErrorCleared])
}
