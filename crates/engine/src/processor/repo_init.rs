// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo-init processor
//!
//! Creates the repos accepted by each confirmed registry, confirms them
//! back, and begins the repo moves a registry has accepted.

use super::{cancelled, drain, load_failed, settle, Processor, Shutdown, Subscription};
use crate::aggregates::Aggregates;
use crate::config::{InitStrategy, ProcessorConfig};
use crate::error::ProcessorError;
use async_trait::async_trait;
use fso_core::{
    Creator, EntityId, EventId, FleetEvent, Location, RegistryCommand, RegistryEvent, RepoCommand,
    Watch, WorkflowId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Work a registry still expects from its repos
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoInitAction {
    InitRepo {
        registry: String,
        repo_id: EntityId,
        global_path: String,
        location: Location,
        creator: Creator,
    },
    BeginMove {
        registry: String,
        repo_id: EntityId,
        workflow_id: WorkflowId,
        new_location: Location,
    },
}

/// Facts replayed from one registry journal
#[derive(Default)]
struct RegistryFacts {
    tail: EventId,
    repos: BTreeMap<EntityId, (String, Location, Creator)>,
    moves: BTreeMap<EntityId, (WorkflowId, Location)>,
}

impl RegistryFacts {
    fn observe(&mut self, event: &RegistryEvent) {
        match event {
            RegistryEvent::RepoAccepted {
                repo_id,
                global_path,
                location,
                creator,
            } => {
                self.repos
                    .insert(*repo_id, (global_path.clone(), location.clone(), creator.clone()));
            }
            RegistryEvent::RepoAdded { repo_id, .. } => {
                self.repos.remove(repo_id);
            }
            RegistryEvent::RepoMoveAccepted {
                repo_id,
                workflow_id,
                new_location,
                ..
            } => {
                self.moves
                    .insert(*repo_id, (*workflow_id, new_location.clone()));
            }
            RegistryEvent::RepoMoved { repo_id, .. } => {
                self.moves.remove(repo_id);
            }
            RegistryEvent::Initialized { .. }
            | RegistryEvent::RootAdded { .. }
            | RegistryEvent::RootRemoved { .. } => {}
        }
    }
}

enum Pending {
    State,
    Events {
        main_tail: EventId,
        registries: BTreeSet<String>,
        facts: BTreeMap<String, RegistryFacts>,
    },
}

impl Pending {
    fn new(strategy: InitStrategy) -> Self {
        match strategy {
            InitStrategy::State => Pending::State,
            InitStrategy::Events => Pending::Events {
                main_tail: EventId::EPOCH,
                registries: BTreeSet::new(),
                facts: BTreeMap::new(),
            },
        }
    }
}

pub struct RepoInit {
    aggs: Arc<Aggregates>,
    config: ProcessorConfig,
}

impl RepoInit {
    pub fn new(aggs: Arc<Aggregates>, config: ProcessorConfig) -> Self {
        Self { aggs, config }
    }

    /// Outstanding actions ordered by registry name, then repo creation
    /// before moves, then repo id
    fn pending(&self, pending: &mut Pending) -> Result<Vec<RepoInitAction>, ProcessorError> {
        let mut actions = Vec::new();
        match pending {
            Pending::State => {
                let main_id = self.aggs.main_id;
                let main = self
                    .aggs
                    .main
                    .load(main_id)
                    .map_err(load_failed("main", main_id))?;
                for entry in main.state.confirmed_registries() {
                    let registry_id = self.aggs.registry_id(&entry.name);
                    let registry = self
                        .aggs
                        .registry
                        .load(registry_id)
                        .map_err(load_failed("registry", registry_id))?;
                    actions.extend(registry.state.pending_repos().map(|repo| {
                        RepoInitAction::InitRepo {
                            registry: entry.name.clone(),
                            repo_id: repo.id,
                            global_path: repo.global_path.clone(),
                            location: repo.location.clone(),
                            creator: repo.creator.clone(),
                        }
                    }));
                    actions.extend(registry.state.pending_moves().map(|(repo, moving)| {
                        RepoInitAction::BeginMove {
                            registry: entry.name.clone(),
                            repo_id: repo.id,
                            workflow_id: moving.workflow_id,
                            new_location: moving.new_location.clone(),
                        }
                    }));
                }
            }
            Pending::Events {
                main_tail,
                registries,
                facts,
            } => {
                let journals = self.aggs.journals();
                for event in journals.main.find(self.aggs.main_id, *main_tail)? {
                    if let FleetEvent::RegistryConfirmed { name } = &event.payload {
                        registries.insert(name.clone());
                    }
                    *main_tail = event.id;
                }
                for name in registries.iter() {
                    let registry_id = self.aggs.registry_id(name);
                    let known = facts.entry(name.clone()).or_default();
                    for event in journals.registry.find(registry_id, known.tail)? {
                        known.observe(&event.payload);
                        known.tail = event.id;
                    }
                    actions.extend(known.repos.iter().map(|(repo_id, (path, loc, creator))| {
                        RepoInitAction::InitRepo {
                            registry: name.clone(),
                            repo_id: *repo_id,
                            global_path: path.clone(),
                            location: loc.clone(),
                            creator: creator.clone(),
                        }
                    }));
                    actions.extend(known.moves.iter().map(|(repo_id, (workflow_id, loc))| {
                        RepoInitAction::BeginMove {
                            registry: name.clone(),
                            repo_id: *repo_id,
                            workflow_id: *workflow_id,
                            new_location: loc.clone(),
                        }
                    }));
                }
            }
        }
        Ok(actions)
    }

    fn apply(&self, action: &RepoInitAction) -> Result<(), ProcessorError> {
        match action {
            RepoInitAction::InitRepo {
                registry,
                repo_id,
                global_path,
                location,
                creator,
            } => {
                let created = settle(
                    "repo",
                    *repo_id,
                    self.aggs.repo.tell(
                        *repo_id,
                        RepoCommand::Init {
                            registry: registry.clone(),
                            global_path: global_path.clone(),
                            file: location.clone(),
                            creator: creator.clone(),
                        },
                    ),
                )?;
                let Some(repo_event_id) = created else {
                    return Ok(());
                };
                let registry_id = self.aggs.registry_id(registry);
                settle(
                    "registry",
                    registry_id,
                    self.aggs.registry.tell(
                        registry_id,
                        RegistryCommand::ConfirmRepo {
                            repo_id: *repo_id,
                            repo_event_id,
                        },
                    ),
                )?;
                tracing::info!(%registry, %repo_id, global_path, "repo created");
            }
            RepoInitAction::BeginMove {
                repo_id,
                workflow_id,
                new_location,
                ..
            } => {
                let repo = self
                    .aggs
                    .repo
                    .load(*repo_id)
                    .map_err(load_failed("repo", *repo_id))?;
                let begun = repo
                    .state
                    .move_repo
                    .as_ref()
                    .is_some_and(|m| m.workflow_id == *workflow_id);
                if begun || repo.state.is_retired(workflow_id) {
                    return Ok(());
                }
                settle(
                    "repo",
                    *repo_id,
                    self.aggs.repo.tell(
                        *repo_id,
                        RepoCommand::BeginMoveRepo {
                            workflow_id: *workflow_id,
                            new_file: new_location.clone(),
                        },
                    ),
                )?;
            }
        }
        Ok(())
    }

    fn sync(&self, pending: &mut Pending) -> Result<(), ProcessorError> {
        let start = Instant::now();
        let actions = self.pending(pending)?;
        for action in &actions {
            self.apply(action)?;
        }
        if !actions.is_empty() {
            tracing::debug!(
                actions = actions.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "repo-init sync"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Processor for RepoInit {
    fn name(&self) -> &'static str {
        "repo-init"
    }

    async fn run_once(&self, shutdown: &mut Shutdown) -> Result<(), ProcessorError> {
        let journals = self.aggs.journals();
        let (main_tx, mut main_rx) = mpsc::channel(self.config.notify_capacity);
        let (registry_tx, mut registry_rx) = mpsc::channel(self.config.notify_capacity);
        let _main = Subscription::new(&journals.main, main_tx, Watch::Id(self.aggs.main_id));
        let _registry = Subscription::new(&journals.registry, registry_tx, Watch::All);
        let mut pending = Pending::new(self.config.init_strategy);
        let mut ticker = tokio::time::interval(self.config.rescan_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancelled(shutdown) => return Ok(()),
                Some(_) = main_rx.recv() => {
                    drain(&mut main_rx);
                    self.sync(&mut pending)?;
                }
                Some(_) = registry_rx.recv() => {
                    drain(&mut registry_rx);
                    self.sync(&mut pending)?;
                }
                _ = ticker.tick() => self.sync(&mut pending)?,
            }
        }
    }
}

#[cfg(test)]
#[path = "repo_init_tests.rs"]
mod tests;
