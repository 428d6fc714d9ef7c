// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication processor
//!
//! Follows all four journals and carries the effect of each event into the
//! aggregates that depend on it: a move started on a repo initializes its
//! workflow, a committed workflow is committed on the repo, and a moved
//! repo is reported to its registry before the workflow exits.
//!
//! Each followed entity has a tail, the last event whose effect has been
//! carried over. A tail only advances after the effect succeeded, so a
//! failed pass resumes from the first event not yet replicated.
//! Entities are discovered top-down: the fleet root names registries,
//! registries name repos, repos name workflows. Newly discovered entities
//! are replayed from their first event with every effect checked against
//! the target state first; notifications for already followed entities
//! apply effects directly and rely on command idempotence.

use super::{cancelled, load_failed, settle, sleep_or_cancel, Processor, Shutdown, Subscription};
use crate::aggregates::Aggregates;
use crate::config::ProcessorConfig;
use crate::error::ProcessorError;
use async_trait::async_trait;
use fso_core::{
    EntityId, Event, EventId, EventName, FleetEvent, MoveRepoCommand, MoveRepoInit,
    MoveShadowCommand, MoveShadowInit, RegistryCommand, RegistryEvent, RepoCommand, RepoEvent,
    Watch, WorkflowEvent,
};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum JournalKind {
    Main,
    Registry,
    Repo,
    Workflow,
}

impl JournalKind {
    fn as_str(&self) -> &'static str {
        match self {
            JournalKind::Main => "main",
            JournalKind::Registry => "registry",
            JournalKind::Repo => "repo",
            JournalKind::Workflow => "workflow",
        }
    }
}

impl fmt::Display for JournalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether effects are checked against the target before they are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Catching up on an entity seen for the first time
    Init,
    /// Following an entity whose history has been replicated
    Update,
}

/// Last replicated event per followed entity of one journal
#[derive(Debug, Default)]
struct Tails(BTreeMap<EntityId, EventId>);

impl Tails {
    /// Start following `id`; returns false if it is already followed
    fn register(&mut self, id: EntityId) -> bool {
        if self.0.contains_key(&id) {
            return false;
        }
        self.0.insert(id, EventId::EPOCH);
        true
    }

    fn get(&self, id: &EntityId) -> Option<EventId> {
        self.0.get(id).copied()
    }

    fn advance(&mut self, id: EntityId, vid: EventId) {
        self.0.insert(id, vid);
    }

    fn remove(&mut self, id: &EntityId) {
        self.0.remove(id);
    }

    fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.keys().copied()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Replication state of one pass
struct Replica<'a> {
    aggs: &'a Aggregates,
    main: Tails,
    registries: Tails,
    repos: Tails,
    workflows: Tails,
    /// Newly discovered entities still to be replayed
    discovered: VecDeque<(JournalKind, EntityId)>,
}

impl<'a> Replica<'a> {
    fn new(aggs: &'a Aggregates) -> Self {
        Self {
            aggs,
            main: Tails::default(),
            registries: Tails::default(),
            repos: Tails::default(),
            workflows: Tails::default(),
            discovered: VecDeque::new(),
        }
    }

    fn tails(&self, kind: JournalKind) -> &Tails {
        match kind {
            JournalKind::Main => &self.main,
            JournalKind::Registry => &self.registries,
            JournalKind::Repo => &self.repos,
            JournalKind::Workflow => &self.workflows,
        }
    }

    fn tails_mut(&mut self, kind: JournalKind) -> &mut Tails {
        match kind {
            JournalKind::Main => &mut self.main,
            JournalKind::Registry => &mut self.registries,
            JournalKind::Repo => &mut self.repos,
            JournalKind::Workflow => &mut self.workflows,
        }
    }

    fn known(&self) -> usize {
        self.main.len() + self.registries.len() + self.repos.len() + self.workflows.len()
    }

    fn known_ids(&self) -> Vec<(JournalKind, EntityId)> {
        [
            JournalKind::Main,
            JournalKind::Registry,
            JournalKind::Repo,
            JournalKind::Workflow,
        ]
        .into_iter()
        .flat_map(|kind| self.tails(kind).ids().map(move |id| (kind, id)))
        .collect()
    }

    fn discover(&mut self, kind: JournalKind, id: EntityId) {
        if self.tails_mut(kind).register(id) {
            tracing::debug!(journal = %kind, %id, "following");
            self.discovered.push_back((kind, id));
        }
    }

    /// Replay every newly discovered entity
    fn catch_up(&mut self) -> Result<(), ProcessorError> {
        while let Some((kind, id)) = self.discovered.pop_front() {
            self.poll(kind, id, Mode::Init)?;
        }
        Ok(())
    }

    /// Handle a change notification
    fn notify(&mut self, kind: JournalKind, id: EntityId) -> Result<(), ProcessorError> {
        if self.tails(kind).get(&id).is_none() {
            tracing::trace!(journal = %kind, %id, "ignoring unfollowed entity");
            return Ok(());
        }
        self.poll(kind, id, Mode::Update)?;
        self.catch_up()
    }

    fn poll(&mut self, kind: JournalKind, id: EntityId, mode: Mode) -> Result<(), ProcessorError> {
        let tail = self.tails(kind).get(&id).unwrap_or(EventId::EPOCH);
        let aggs = self.aggs;
        let journals = aggs.journals();
        match kind {
            JournalKind::Main => {
                for event in journals.main.find(id, tail)? {
                    self.on_main(&event);
                    self.main.advance(id, event.id);
                }
            }
            JournalKind::Registry => {
                for event in journals.registry.find(id, tail)? {
                    self.on_registry(&event);
                    self.registries.advance(id, event.id);
                }
            }
            JournalKind::Repo => {
                for event in journals.repo.find(id, tail)? {
                    self.on_repo(id, &event, mode)?;
                    self.repos.advance(id, event.id);
                }
            }
            JournalKind::Workflow => {
                for event in journals.workflow.find(id, tail)? {
                    self.on_workflow(id, &event, mode)?;
                    self.workflows.advance(id, event.id);
                    if matches!(
                        event.payload,
                        WorkflowEvent::MoveRepoExited | WorkflowEvent::MoveShadowExited
                    ) {
                        // Exited workflows have no further events
                        tracing::debug!(%id, "workflow exited, unfollowing");
                        self.workflows.remove(&id);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn on_main(&mut self, event: &Event<FleetEvent>) {
        match &event.payload {
            FleetEvent::RegistryConfirmed { name } => {
                let registry_id = self.aggs.registry_id(name);
                self.discover(JournalKind::Registry, registry_id);
            }
            FleetEvent::Initialized { .. }
            | FleetEvent::RegistryAccepted { .. }
            | FleetEvent::UnixDomainCreated { .. } => {}
        }
    }

    fn on_registry(&mut self, event: &Event<RegistryEvent>) {
        match &event.payload {
            RegistryEvent::RepoAdded { repo_id, .. } => {
                self.discover(JournalKind::Repo, *repo_id);
            }
            // Repo-init begins accepted moves on the repo
            RegistryEvent::RepoMoveAccepted { .. }
            | RegistryEvent::Initialized { .. }
            | RegistryEvent::RootAdded { .. }
            | RegistryEvent::RootRemoved { .. }
            | RegistryEvent::RepoAccepted { .. }
            | RegistryEvent::RepoMoved { .. } => {}
        }
    }

    fn on_repo(
        &mut self,
        repo_id: EntityId,
        event: &Event<RepoEvent>,
        mode: Mode,
    ) -> Result<(), ProcessorError> {
        let aggs = self.aggs;
        match &event.payload {
            RepoEvent::MoveRepoStarted {
                workflow_id,
                old_file,
                new_file,
            } => {
                tracing::debug!(%repo_id, event = event.payload.name(), "replicating");
                let skip = mode == Mode::Init
                    && aggs
                        .move_repo
                        .load(*workflow_id)
                        .map_err(load_failed("move_repo", *workflow_id))?
                        .state
                        .init
                        .is_some();
                if !skip {
                    let init = MoveRepoInit {
                        repo_id,
                        repo_event_id: event.id,
                        old_file: old_file.clone(),
                        new_file: new_file.clone(),
                    };
                    settle(
                        "move_repo",
                        *workflow_id,
                        aggs.move_repo
                            .tell(*workflow_id, MoveRepoCommand::Init(init)),
                    )?;
                }
                self.discover(JournalKind::Workflow, *workflow_id);
            }
            RepoEvent::MoveShadowStarted {
                workflow_id,
                old_shadow_path,
                new_shadow_path,
            } => {
                tracing::debug!(%repo_id, event = event.payload.name(), "replicating");
                let skip = mode == Mode::Init
                    && aggs
                        .move_shadow
                        .load(*workflow_id)
                        .map_err(load_failed("move_shadow", *workflow_id))?
                        .state
                        .init
                        .is_some();
                if !skip {
                    let init = MoveShadowInit {
                        repo_id,
                        repo_event_id: event.id,
                        old_shadow_path: old_shadow_path.clone(),
                        new_shadow_path: new_shadow_path.clone(),
                    };
                    settle(
                        "move_shadow",
                        *workflow_id,
                        aggs.move_shadow
                            .tell(*workflow_id, MoveShadowCommand::Init(init)),
                    )?;
                }
                self.discover(JournalKind::Workflow, *workflow_id);
            }
            RepoEvent::RepoMoved { workflow_id, .. } => {
                tracing::debug!(%repo_id, event = event.payload.name(), "replicating");
                let repo = aggs
                    .repo
                    .load(repo_id)
                    .map_err(load_failed("repo", repo_id))?;
                let registry_id = aggs.registry_id(&repo.state.registry);
                let reported = mode == Mode::Init
                    && aggs
                        .registry
                        .load(registry_id)
                        .map_err(load_failed("registry", registry_id))?
                        .state
                        .retired_workflows
                        .contains(workflow_id);
                if !reported {
                    settle(
                        "registry",
                        registry_id,
                        aggs.registry.tell(
                            registry_id,
                            RegistryCommand::CommitMoveRepo {
                                repo_id,
                                workflow_id: *workflow_id,
                                repo_event_id: event.id,
                            },
                        ),
                    )?;
                }
                let exited = mode == Mode::Init
                    && aggs
                        .move_repo
                        .load(*workflow_id)
                        .map_err(load_failed("move_repo", *workflow_id))?
                        .state
                        .is_terminated;
                if !exited {
                    settle(
                        "move_repo",
                        *workflow_id,
                        aggs.move_repo.tell(*workflow_id, MoveRepoCommand::Exit),
                    )?;
                }
            }
            RepoEvent::ShadowMoved { workflow_id, .. } => {
                tracing::debug!(%repo_id, event = event.payload.name(), "replicating");
                let exited = mode == Mode::Init
                    && aggs
                        .move_shadow
                        .load(*workflow_id)
                        .map_err(load_failed("move_shadow", *workflow_id))?
                        .state
                        .is_terminated;
                if !exited {
                    settle(
                        "move_shadow",
                        *workflow_id,
                        aggs.move_shadow.tell(*workflow_id, MoveShadowCommand::Exit),
                    )?;
                }
            }
            RepoEvent::Initialized { .. }
            | RepoEvent::ShadowConfirmed { .. }
            | RepoEvent::ShadowBackupUrlSet { .. }
            | RepoEvent::TierStarted { .. }
            | RepoEvent::TierCompleted { .. }
            | RepoEvent::TierFailed { .. }
            | RepoEvent::ErrorSet { .. }
            | RepoEvent::ErrorCleared => {}
        }
        Ok(())
    }

    fn on_workflow(
        &mut self,
        workflow_id: EntityId,
        event: &Event<WorkflowEvent>,
        mode: Mode,
    ) -> Result<(), ProcessorError> {
        let aggs = self.aggs;
        let (repo_id, cmd) = match &event.payload {
            WorkflowEvent::MoveRepoCommitted {
                repo_id,
                new_shadow_path,
            } => (
                *repo_id,
                RepoCommand::CommitMoveRepo {
                    workflow_id,
                    new_shadow_path: new_shadow_path.clone(),
                    workflow_event_id: event.id,
                },
            ),
            WorkflowEvent::MoveShadowCommitted { repo_id } => (
                *repo_id,
                RepoCommand::CommitMoveShadow {
                    workflow_id,
                    workflow_event_id: event.id,
                },
            ),
            WorkflowEvent::MoveRepoInitialized { .. }
            | WorkflowEvent::MoveRepoStadReleased
            | WorkflowEvent::MoveRepoAppAccepted
            | WorkflowEvent::MoveRepoExited
            | WorkflowEvent::MoveShadowInitialized { .. }
            | WorkflowEvent::MoveShadowStadDisabled
            | WorkflowEvent::MoveShadowExited => return Ok(()),
        };
        tracing::debug!(%workflow_id, event = event.payload.name(), "replicating");
        let committed = mode == Mode::Init
            && aggs
                .repo
                .load(repo_id)
                .map_err(load_failed("repo", repo_id))?
                .state
                .is_retired(&workflow_id);
        if !committed {
            settle("repo", repo_id, aggs.repo.tell(repo_id, cmd))?;
        }
        Ok(())
    }
}

/// Notification senders, one per journal
#[derive(Clone)]
struct Senders {
    main: mpsc::Sender<EntityId>,
    registry: mpsc::Sender<EntityId>,
    repo: mpsc::Sender<EntityId>,
    workflow: mpsc::Sender<EntityId>,
}

impl Senders {
    fn get(&self, kind: JournalKind) -> &mpsc::Sender<EntityId> {
        match kind {
            JournalKind::Main => &self.main,
            JournalKind::Registry => &self.registry,
            JournalKind::Repo => &self.repo,
            JournalKind::Workflow => &self.workflow,
        }
    }
}

struct Receivers {
    main: mpsc::Receiver<EntityId>,
    registry: mpsc::Receiver<EntityId>,
    repo: mpsc::Receiver<EntityId>,
    workflow: mpsc::Receiver<EntityId>,
}

/// Re-inject every followed id as if it had been updated.
///
/// Heals notifications dropped by full queues. Returns the number of ids
/// sent.
async fn rescan(
    ids: Vec<(JournalKind, EntityId)>,
    senders: Senders,
    item_delay: Duration,
    mut shutdown: Shutdown,
) -> usize {
    let mut sent = 0;
    for (kind, id) in ids {
        if !sleep_or_cancel(&mut shutdown, item_delay).await {
            break;
        }
        if senders.get(kind).send(id).await.is_err() {
            break;
        }
        sent += 1;
    }
    sent
}

pub struct Replicate {
    aggs: Arc<Aggregates>,
    config: ProcessorConfig,
}

impl Replicate {
    pub fn new(aggs: Arc<Aggregates>, config: ProcessorConfig) -> Self {
        Self { aggs, config }
    }

    async fn follow(
        &self,
        shutdown: &mut Shutdown,
        replica: &mut Replica<'_>,
        receivers: &mut Receivers,
        senders: &Senders,
        rescans: &mut JoinSet<usize>,
    ) -> Result<(), ProcessorError> {
        let period = self.config.rescan_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancelled(shutdown) => return Ok(()),
                Some(id) = receivers.main.recv() => replica.notify(JournalKind::Main, id)?,
                Some(id) = receivers.registry.recv() => replica.notify(JournalKind::Registry, id)?,
                Some(id) = receivers.repo.recv() => replica.notify(JournalKind::Repo, id)?,
                Some(id) = receivers.workflow.recv() => replica.notify(JournalKind::Workflow, id)?,
                _ = ticker.tick() => {
                    if rescans.is_empty() {
                        let ids = replica.known_ids();
                        tracing::debug!(ids = ids.len(), "rescan started");
                        rescans.spawn(rescan(
                            ids,
                            senders.clone(),
                            self.config.rescan_item_delay,
                            shutdown.clone(),
                        ));
                    }
                }
                Some(joined) = rescans.join_next() => match joined {
                    Ok(sent) => tracing::debug!(ids = sent, "rescan finished"),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => tracing::warn!(error = %e, "rescan task failed"),
                },
            }
        }
    }
}

#[async_trait]
impl Processor for Replicate {
    fn name(&self) -> &'static str {
        "replicate"
    }

    async fn run_once(&self, shutdown: &mut Shutdown) -> Result<(), ProcessorError> {
        let journals = self.aggs.journals();
        let capacity = self.config.notify_capacity;
        let (main_tx, main_rx) = mpsc::channel(capacity);
        let (registry_tx, registry_rx) = mpsc::channel(capacity);
        let (repo_tx, repo_rx) = mpsc::channel(capacity);
        let (workflow_tx, workflow_rx) = mpsc::channel(capacity);

        // Subscribe before the first read
        let _main = Subscription::new(&journals.main, main_tx.clone(), Watch::Id(self.aggs.main_id));
        let _registry = Subscription::new(&journals.registry, registry_tx.clone(), Watch::All);
        let _repo = Subscription::new(&journals.repo, repo_tx.clone(), Watch::All);
        let _workflow = Subscription::new(&journals.workflow, workflow_tx.clone(), Watch::All);
        let senders = Senders {
            main: main_tx,
            registry: registry_tx,
            repo: repo_tx,
            workflow: workflow_tx,
        };
        let mut receivers = Receivers {
            main: main_rx,
            registry: registry_rx,
            repo: repo_rx,
            workflow: workflow_rx,
        };

        let start = Instant::now();
        let mut replica = Replica::new(&self.aggs);
        replica.discover(JournalKind::Main, self.aggs.main_id);
        replica.catch_up()?;
        tracing::info!(
            followed = replica.known(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "replication caught up"
        );

        let mut rescans = JoinSet::new();
        let result = self
            .follow(shutdown, &mut replica, &mut receivers, &senders, &mut rescans)
            .await;
        rescans.shutdown().await;
        result
    }
}

#[cfg(test)]
#[path = "replicate_tests.rs"]
mod tests;
