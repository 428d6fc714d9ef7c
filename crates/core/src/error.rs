// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors returned by command handlers
//!
//! Handlers never fail for infrastructure reasons; they either reject the
//! input (`Validation`), report that the aggregate does not exist yet
//! (`Uninitialized`), or report that the current state forecloses the
//! command (`Conflict`). Stale versions are detected by the engine, not here.

use crate::id::WorkflowId;
use crate::repo::StorageTier;
use thiserror::Error;

/// Rejection of a command by an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid command: {0}")]
    Validation(String),
    #[error("aggregate is not initialized")]
    Uninitialized,
    #[error("conflict: {0}")]
    Conflict(#[from] Conflict),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }
}

/// A well-formed command that the current state does not permit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("already initialized differently: {0}")]
    Init(String),
    #[error("another workflow is active")]
    Workflow,
    #[error("workflow {0} is already active")]
    WorkflowActive(WorkflowId),
    #[error("workflow id {0} has already been used")]
    WorkflowReuse(WorkflowId),
    #[error("repo has a stored error")]
    RepoError,
    #[error("stored error message does not match")]
    ErrorMismatch,
    #[error("storage workflow id mismatch")]
    StorageWorkflow,
    #[error("storage tier {tier} does not permit {op}")]
    StorageTier { tier: StorageTier, op: &'static str },
    #[error("workflow state has already advanced")]
    StateAdvanced,
    #[error("stad not yet disabled")]
    NotYetDisabled,
    #[error("repo not yet released")]
    NotYetReleased,
    #[error("not yet moved")]
    NotYetMoved,
    #[error("workflow has terminated")]
    Terminated,
    #[error("repo has no shadow")]
    NoShadow,
    #[error("unknown registry `{0}`")]
    UnknownRegistry(String),
    #[error("unknown repo")]
    UnknownRepo,
    #[error("repo is not yet confirmed")]
    RepoPending,
    #[error("no root contains `{0}`")]
    UnknownRoot(String),
    #[error("root `{0}` is already registered differently")]
    DuplicateRoot(String),
    #[error("root `{0}` still contains repos")]
    RootInUse(String),
    #[error("repo move already in progress")]
    MoveInProgress,
}
