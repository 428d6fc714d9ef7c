// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry aggregate
//!
//! A registry maps global paths to file hosts through a set of roots and
//! keeps the list of repos it has accepted. Repo creation and repo moves
//! are accepted here first; the repo-init processor then drives the repo
//! aggregate and replication reports the result back.

use crate::behavior::{AdvanceError, Behavior};
use crate::error::{Conflict, DomainError};
use crate::event::EventName;
use crate::id::{EntityId, EventId, WorkflowId};
use crate::limits::{check_abs_path, check_name};
use crate::location::{Creator, Location};
use crate::naming::Namer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Maps a global path prefix to a directory on a file host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    pub global_root: String,
    pub host: String,
    pub host_root: String,
}

impl Root {
    /// Host location of `global_path` if it lies strictly below this root
    pub fn locate(&self, global_path: &str) -> Option<Location> {
        let rest = if self.global_root == "/" {
            global_path.strip_prefix('/')?
        } else {
            global_path
                .strip_prefix(self.global_root.as_str())?
                .strip_prefix('/')?
        };
        if rest.is_empty() {
            return None;
        }
        let path = if self.host_root == "/" {
            format!("/{}", rest)
        } else {
            format!("{}/{}", self.host_root, rest)
        };
        Some(Location::new(self.host.clone(), path))
    }
}

/// A move accepted by the registry and not yet reported back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub workflow_id: WorkflowId,
    pub new_location: Location,
}

/// A repo as seen by its registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    pub id: EntityId,
    pub global_path: String,
    pub location: Location,
    pub creator: Creator,
    /// Whether the repo aggregate has been created
    pub confirmed: bool,
    pub moving: Option<PendingMove>,
}

/// Registry state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryState {
    pub id: EntityId,
    pub name: Option<String>,
    pub roots: Arc<BTreeMap<String, Root>>,
    pub repos: Arc<BTreeMap<EntityId, RepoEntry>>,
    pub retired_workflows: Arc<BTreeSet<WorkflowId>>,
}

impl RegistryState {
    pub fn is_initialized(&self) -> bool {
        self.name.is_some()
    }

    /// The root with the longest prefix that contains `global_path`
    pub fn find_root(&self, global_path: &str) -> Option<(&Root, Location)> {
        self.roots
            .values()
            .filter_map(|root| root.locate(global_path).map(|loc| (root, loc)))
            .max_by_key(|(root, _)| root.global_root.len())
    }

    pub fn pending_repos(&self) -> impl Iterator<Item = &RepoEntry> {
        self.repos.values().filter(|r| !r.confirmed)
    }

    pub fn pending_moves(&self) -> impl Iterator<Item = (&RepoEntry, &PendingMove)> {
        self.repos
            .values()
            .filter_map(|r| r.moving.as_ref().map(|m| (r, m)))
    }
}

/// Commands accepted by a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCommand {
    Init {
        name: String,
    },
    AddRoot {
        global_root: String,
        host: String,
        host_root: String,
    },
    RemoveRoot {
        global_root: String,
    },
    InitRepo {
        global_path: String,
        creator: Creator,
    },
    ConfirmRepo {
        repo_id: EntityId,
        repo_event_id: EventId,
    },
    BeginMoveRepo {
        repo_id: EntityId,
        workflow_id: WorkflowId,
        new_location: Location,
    },
    CommitMoveRepo {
        repo_id: EntityId,
        workflow_id: WorkflowId,
        repo_event_id: EventId,
    },
}

/// Events of the registry journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    Initialized {
        name: String,
    },
    RootAdded {
        root: Root,
    },
    RootRemoved {
        global_root: String,
    },
    RepoAccepted {
        repo_id: EntityId,
        global_path: String,
        location: Location,
        creator: Creator,
    },
    RepoAdded {
        repo_id: EntityId,
        global_path: String,
        repo_event_id: EventId,
    },
    RepoMoveAccepted {
        repo_id: EntityId,
        workflow_id: WorkflowId,
        old_location: Location,
        new_location: Location,
    },
    RepoMoved {
        repo_id: EntityId,
        workflow_id: WorkflowId,
        location: Location,
        repo_event_id: EventId,
    },
}

impl EventName for RegistryEvent {
    fn name(&self) -> &'static str {
        match self {
            RegistryEvent::Initialized { .. } => "registry:initialized",
            RegistryEvent::RootAdded { .. } => "registry:root_added",
            RegistryEvent::RootRemoved { .. } => "registry:root_removed",
            RegistryEvent::RepoAccepted { .. } => "registry:repo_accepted",
            RegistryEvent::RepoAdded { .. } => "registry:repo_added",
            RegistryEvent::RepoMoveAccepted { .. } => "registry:repo_move_accepted",
            RegistryEvent::RepoMoved { .. } => "registry:repo_moved",
        }
    }
}

/// Behavior of registry aggregates
#[derive(Debug, Clone, Default)]
pub struct Registry {
    namer: Namer,
}

impl Registry {
    pub fn new(namer: Namer) -> Self {
        Self { namer }
    }
}

impl Behavior for Registry {
    type State = RegistryState;
    type Payload = RegistryEvent;
    type Command = RegistryCommand;

    const KIND: &'static str = "registry";

    fn new_state(&self, id: EntityId) -> RegistryState {
        RegistryState {
            id,
            name: None,
            roots: Arc::new(BTreeMap::new()),
            repos: Arc::new(BTreeMap::new()),
            retired_workflows: Arc::new(BTreeSet::new()),
        }
    }

    fn advance(
        &self,
        state: &RegistryState,
        event: &RegistryEvent,
    ) -> Result<RegistryState, AdvanceError> {
        let invalid = |reason: &str| AdvanceError::new(Self::KIND, event.name(), reason);
        let mut next = state.clone();
        match event {
            RegistryEvent::Initialized { name } => {
                if state.is_initialized() {
                    return Err(invalid("already initialized"));
                }
                next.name = Some(name.clone());
            }
            RegistryEvent::RootAdded { root } => {
                Arc::make_mut(&mut next.roots).insert(root.global_root.clone(), root.clone());
            }
            RegistryEvent::RootRemoved { global_root } => {
                Arc::make_mut(&mut next.roots).remove(global_root);
            }
            RegistryEvent::RepoAccepted {
                repo_id,
                global_path,
                location,
                creator,
            } => {
                Arc::make_mut(&mut next.repos).insert(
                    *repo_id,
                    RepoEntry {
                        id: *repo_id,
                        global_path: global_path.clone(),
                        location: location.clone(),
                        creator: creator.clone(),
                        confirmed: false,
                        moving: None,
                    },
                );
            }
            RegistryEvent::RepoAdded { repo_id, .. } => {
                let entry = Arc::make_mut(&mut next.repos)
                    .get_mut(repo_id)
                    .ok_or_else(|| invalid("unknown repo"))?;
                entry.confirmed = true;
            }
            RegistryEvent::RepoMoveAccepted {
                repo_id,
                workflow_id,
                new_location,
                ..
            } => {
                let entry = Arc::make_mut(&mut next.repos)
                    .get_mut(repo_id)
                    .ok_or_else(|| invalid("unknown repo"))?;
                entry.moving = Some(PendingMove {
                    workflow_id: *workflow_id,
                    new_location: new_location.clone(),
                });
            }
            RegistryEvent::RepoMoved {
                repo_id,
                workflow_id,
                location,
                ..
            } => {
                let entry = Arc::make_mut(&mut next.repos)
                    .get_mut(repo_id)
                    .ok_or_else(|| invalid("unknown repo"))?;
                entry.location = location.clone();
                entry.moving = None;
                Arc::make_mut(&mut next.retired_workflows).insert(*workflow_id);
            }
        }
        Ok(next)
    }

    fn tell(
        &self,
        state: &RegistryState,
        cmd: RegistryCommand,
    ) -> Result<Vec<RegistryEvent>, DomainError> {
        if let RegistryCommand::Init { name } = cmd {
            check_name("registry name", &name)?;
            return match &state.name {
                None => Ok(vec![RegistryEvent::Initialized { name }]),
                Some(existing) if *existing == name => Ok(vec![]),
                Some(existing) => {
                    Err(Conflict::Init(format!("registry is named `{}`", existing)).into())
                }
            };
        }
        let Some(name) = &state.name else {
            return Err(DomainError::Uninitialized);
        };

        match cmd {
            RegistryCommand::Init { .. } => Ok(vec![]),
            RegistryCommand::AddRoot {
                global_root,
                host,
                host_root,
            } => {
                check_abs_path("global root", &global_root)?;
                check_name("host", &host)?;
                check_abs_path("host root", &host_root)?;
                let root = Root {
                    global_root,
                    host,
                    host_root,
                };
                match state.roots.get(&root.global_root) {
                    Some(existing) if *existing == root => Ok(vec![]),
                    Some(_) => Err(Conflict::DuplicateRoot(root.global_root).into()),
                    None => Ok(vec![RegistryEvent::RootAdded { root }]),
                }
            }
            RegistryCommand::RemoveRoot { global_root } => {
                if !state.roots.contains_key(&global_root) {
                    return Ok(vec![]);
                }
                let in_use = state.repos.values().any(|r| {
                    state
                        .find_root(&r.global_path)
                        .is_some_and(|(owner, _)| owner.global_root == global_root)
                });
                if in_use {
                    return Err(Conflict::RootInUse(global_root).into());
                }
                Ok(vec![RegistryEvent::RootRemoved { global_root }])
            }
            RegistryCommand::InitRepo {
                global_path,
                creator,
            } => {
                check_abs_path("global path", &global_path)?;
                let repo_id = self.namer.repo_id(name, &global_path);
                if state.repos.contains_key(&repo_id) {
                    return Ok(vec![]);
                }
                let Some((_, location)) = state.find_root(&global_path) else {
                    return Err(Conflict::UnknownRoot(global_path).into());
                };
                Ok(vec![RegistryEvent::RepoAccepted {
                    repo_id,
                    global_path,
                    location,
                    creator,
                }])
            }
            RegistryCommand::ConfirmRepo {
                repo_id,
                repo_event_id,
            } => {
                let entry = state.repos.get(&repo_id).ok_or(Conflict::UnknownRepo)?;
                if entry.confirmed {
                    return Ok(vec![]);
                }
                Ok(vec![RegistryEvent::RepoAdded {
                    repo_id,
                    global_path: entry.global_path.clone(),
                    repo_event_id,
                }])
            }
            RegistryCommand::BeginMoveRepo {
                repo_id,
                workflow_id,
                new_location,
            } => {
                check_name("host", &new_location.host)?;
                check_abs_path("new path", &new_location.path)?;
                let entry = state.repos.get(&repo_id).ok_or(Conflict::UnknownRepo)?;
                if !entry.confirmed {
                    return Err(Conflict::RepoPending.into());
                }
                if let Some(moving) = &entry.moving {
                    if moving.workflow_id == workflow_id && moving.new_location == new_location {
                        return Ok(vec![]);
                    }
                    return Err(Conflict::MoveInProgress.into());
                }
                if state.retired_workflows.contains(&workflow_id) {
                    return Err(Conflict::WorkflowReuse(workflow_id).into());
                }
                Ok(vec![RegistryEvent::RepoMoveAccepted {
                    repo_id,
                    workflow_id,
                    old_location: entry.location.clone(),
                    new_location,
                }])
            }
            RegistryCommand::CommitMoveRepo {
                repo_id,
                workflow_id,
                repo_event_id,
            } => {
                let entry = state.repos.get(&repo_id).ok_or(Conflict::UnknownRepo)?;
                if state.retired_workflows.contains(&workflow_id) {
                    return Ok(vec![]);
                }
                match &entry.moving {
                    Some(moving) if moving.workflow_id == workflow_id => {
                        Ok(vec![RegistryEvent::RepoMoved {
                            repo_id,
                            workflow_id,
                            location: moving.new_location.clone(),
                            repo_event_id,
                        }])
                    }
                    _ => Err(Conflict::Workflow.into()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
