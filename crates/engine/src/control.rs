// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator command surface
//!
//! Thin façade that routes operator and peer commands to the right
//! aggregate. Everything that happens as a consequence is left to the
//! processors.

use crate::aggregates::Aggregates;
use crate::error::TellError;
use fso_core::{
    Behavior, Creator, EntityId, EventId, FleetCommand, FleetState, Location, MoveRepoCommand,
    MoveRepoState, MoveShadowCommand, MoveShadowState, RegistryCommand, RegistryState, Repo,
    RepoCommand, RepoState, TierOp, Versioned, WorkflowId,
};
use std::sync::Arc;

/// Commands issued from outside the control plane
#[derive(Clone)]
pub struct Control {
    aggs: Arc<Aggregates>,
}

impl Control {
    pub fn new(aggs: Arc<Aggregates>) -> Self {
        Self { aggs }
    }

    pub fn aggregates(&self) -> &Arc<Aggregates> {
        &self.aggs
    }

    // Fleet root and registries

    pub fn init_main(&self) -> Result<EventId, TellError> {
        tracing::info!(main = %self.aggs.main_name, "init main");
        self.aggs.main.tell(
            self.aggs.main_id,
            FleetCommand::Init {
                name: self.aggs.main_name.clone(),
            },
        )
    }

    /// Accept a registry; the registry-init processor creates it
    pub fn init_registry(&self, name: &str) -> Result<EventId, TellError> {
        tracing::info!(registry = name, "init registry");
        self.aggs.main.tell(
            self.aggs.main_id,
            FleetCommand::InitRegistry {
                name: name.to_string(),
            },
        )
    }

    pub fn create_unix_domain(&self, name: &str) -> Result<EventId, TellError> {
        tracing::info!(domain = name, "create unix domain");
        self.aggs.main.tell(
            self.aggs.main_id,
            FleetCommand::CreateUnixDomain {
                name: name.to_string(),
            },
        )
    }

    pub fn add_root(
        &self,
        registry: &str,
        global_root: &str,
        host: &str,
        host_root: &str,
    ) -> Result<EventId, TellError> {
        tracing::info!(registry, global_root, host, host_root, "add root");
        self.aggs.registry.tell(
            self.aggs.registry_id(registry),
            RegistryCommand::AddRoot {
                global_root: global_root.to_string(),
                host: host.to_string(),
                host_root: host_root.to_string(),
            },
        )
    }

    pub fn remove_root(&self, registry: &str, global_root: &str) -> Result<EventId, TellError> {
        tracing::info!(registry, global_root, "remove root");
        self.aggs.registry.tell(
            self.aggs.registry_id(registry),
            RegistryCommand::RemoveRoot {
                global_root: global_root.to_string(),
            },
        )
    }

    // Repos

    /// Accept a repo in `registry`; the repo-init processor creates it.
    ///
    /// Returns the id the repo will have.
    pub fn init_repo(
        &self,
        registry: &str,
        global_path: &str,
        creator: Creator,
    ) -> Result<EntityId, TellError> {
        tracing::info!(registry, global_path, "init repo");
        self.aggs.registry.tell(
            self.aggs.registry_id(registry),
            RegistryCommand::InitRepo {
                global_path: global_path.to_string(),
                creator,
            },
        )?;
        Ok(self.aggs.namer.repo_id(registry, global_path))
    }

    pub fn confirm_shadow(&self, repo_id: EntityId, shadow_path: &str) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, shadow_path, "confirm shadow");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::ConfirmShadow {
                shadow_path: shadow_path.to_string(),
            },
        )
    }

    pub fn set_shadow_backup_url(&self, repo_id: EntityId, url: &str) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, url, "set shadow backup url");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::SetShadowBackupUrl {
                url: url.to_string(),
            },
        )
    }

    /// Start moving a repo to `new_file`.
    ///
    /// The move is accepted by the registry; the repo-init processor then
    /// begins it on the repo. The repo's own preconditions are checked
    /// first so that a move the repo would reject never reaches the
    /// registry.
    pub fn begin_move_repo(
        &self,
        repo_id: EntityId,
        workflow_id: WorkflowId,
        new_file: Location,
    ) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, %workflow_id, new_file = %new_file, "begin move-repo");
        let repo = self.aggs.repo.load(repo_id)?;
        Repo.tell(
            &repo.state,
            RepoCommand::BeginMoveRepo {
                workflow_id,
                new_file: new_file.clone(),
            },
        )?;
        self.aggs.registry.tell(
            self.aggs.registry_id(&repo.state.registry),
            RegistryCommand::BeginMoveRepo {
                repo_id,
                workflow_id,
                new_location: new_file,
            },
        )
    }

    pub fn begin_move_shadow(
        &self,
        repo_id: EntityId,
        workflow_id: WorkflowId,
        new_shadow_path: &str,
    ) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, %workflow_id, new_shadow_path, "begin move-shadow");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::BeginMoveShadow {
                workflow_id,
                new_shadow_path: new_shadow_path.to_string(),
            },
        )
    }

    pub fn begin_tier(
        &self,
        repo_id: EntityId,
        op: TierOp,
        workflow_id: WorkflowId,
    ) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, %op, %workflow_id, "begin tier operation");
        self.aggs
            .repo
            .tell(repo_id, RepoCommand::BeginTier { op, workflow_id })
    }

    /// `archive_url` is required when committing an archive
    pub fn commit_tier(
        &self,
        repo_id: EntityId,
        op: TierOp,
        workflow_id: WorkflowId,
        archive_url: Option<&str>,
    ) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, %op, %workflow_id, "commit tier operation");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::CommitTier {
                op,
                workflow_id,
                archive_url: archive_url.map(String::from),
            },
        )
    }

    pub fn abort_tier(
        &self,
        repo_id: EntityId,
        op: TierOp,
        workflow_id: WorkflowId,
        code: i32,
        message: &str,
    ) -> Result<EventId, TellError> {
        tracing::warn!(%repo_id, %op, %workflow_id, code, message, "abort tier operation");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::AbortTier {
                op,
                workflow_id,
                code,
                message: message.to_string(),
            },
        )
    }

    pub fn set_repo_error(&self, repo_id: EntityId, message: &str) -> Result<EventId, TellError> {
        tracing::warn!(%repo_id, message, "set repo error");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::SetError {
                message: message.to_string(),
            },
        )
    }

    pub fn clear_repo_error(&self, repo_id: EntityId, message: &str) -> Result<EventId, TellError> {
        tracing::info!(%repo_id, "clear repo error");
        self.aggs.repo.tell(
            repo_id,
            RepoCommand::ClearError {
                message: message.to_string(),
            },
        )
    }

    // Workflow progress reported by external actors

    pub fn post_move_repo_stad_released(&self, workflow_id: WorkflowId) -> Result<EventId, TellError> {
        tracing::info!(%workflow_id, "move-repo: stad released");
        self.aggs
            .move_repo
            .tell(workflow_id, MoveRepoCommand::PostStadReleased)
    }

    pub fn post_move_repo_app_accepted(&self, workflow_id: WorkflowId) -> Result<EventId, TellError> {
        tracing::info!(%workflow_id, "move-repo: app accepted");
        self.aggs
            .move_repo
            .tell(workflow_id, MoveRepoCommand::PostAppAccepted)
    }

    pub fn commit_move_repo(
        &self,
        workflow_id: WorkflowId,
        new_shadow_path: &str,
    ) -> Result<EventId, TellError> {
        tracing::info!(%workflow_id, new_shadow_path, "move-repo: commit");
        self.aggs.move_repo.tell(
            workflow_id,
            MoveRepoCommand::Commit {
                new_shadow_path: new_shadow_path.to_string(),
            },
        )
    }

    pub fn post_move_shadow_stad_disabled(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<EventId, TellError> {
        tracing::info!(%workflow_id, "move-shadow: stad disabled");
        self.aggs
            .move_shadow
            .tell(workflow_id, MoveShadowCommand::PostStadDisabled)
    }

    pub fn commit_move_shadow(&self, workflow_id: WorkflowId) -> Result<EventId, TellError> {
        tracing::info!(%workflow_id, "move-shadow: commit");
        self.aggs
            .move_shadow
            .tell(workflow_id, MoveShadowCommand::Commit)
    }

    // Queries

    pub fn main(&self) -> Result<Versioned<FleetState>, TellError> {
        self.aggs.main.load(self.aggs.main_id)
    }

    pub fn registry(&self, name: &str) -> Result<Versioned<RegistryState>, TellError> {
        self.aggs.registry.load(self.aggs.registry_id(name))
    }

    pub fn repo(&self, repo_id: EntityId) -> Result<Versioned<RepoState>, TellError> {
        self.aggs.repo.load(repo_id)
    }

    pub fn move_repo(&self, workflow_id: WorkflowId) -> Result<Versioned<MoveRepoState>, TellError> {
        self.aggs.move_repo.load(workflow_id)
    }

    pub fn move_shadow(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Versioned<MoveShadowState>, TellError> {
        self.aggs.move_shadow.load(workflow_id)
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
