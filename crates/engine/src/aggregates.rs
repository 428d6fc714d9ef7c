// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five aggregate engines over the four journals

use crate::engine::Engine;
use fso_core::{
    EntityId, EventIdGen, Fleet, FleetEvent, Journal, MoveRepo, MoveShadow, Namer, Registry,
    RegistryEvent, Repo, RepoEvent, WorkflowEvent,
};
use std::sync::Arc;

pub type MainJournal = dyn Journal<FleetEvent>;
pub type RegistryJournal = dyn Journal<RegistryEvent>;
pub type RepoJournal = dyn Journal<RepoEvent>;
pub type WorkflowJournal = dyn Journal<WorkflowEvent>;

pub type MainEngine = Engine<Fleet, MainJournal>;
pub type RegistryEngine = Engine<Registry, RegistryJournal>;
pub type RepoEngine = Engine<Repo, RepoJournal>;
pub type MoveRepoEngine = Engine<MoveRepo, WorkflowJournal>;
pub type MoveShadowEngine = Engine<MoveShadow, WorkflowJournal>;

/// The four journals
#[derive(Clone)]
pub struct Journals {
    pub main: Arc<MainJournal>,
    pub registry: Arc<RegistryJournal>,
    pub repo: Arc<RepoJournal>,
    pub workflow: Arc<WorkflowJournal>,
}

/// Engines for every aggregate kind, sharing one id generator
pub struct Aggregates {
    pub namer: Namer,
    pub main_name: String,
    pub main_id: EntityId,
    pub main: MainEngine,
    pub registry: RegistryEngine,
    pub repo: RepoEngine,
    pub move_repo: MoveRepoEngine,
    pub move_shadow: MoveShadowEngine,
    journals: Journals,
}

impl Aggregates {
    pub fn new(
        journals: Journals,
        namer: Namer,
        main_name: impl Into<String>,
        ids: Arc<dyn EventIdGen>,
    ) -> Self {
        let main_name = main_name.into();
        let main_id = namer.main_id(&main_name);
        Self {
            main: Engine::new(
                Fleet::new(namer),
                Arc::clone(&journals.main),
                Arc::clone(&ids),
            ),
            registry: Engine::new(
                Registry::new(namer),
                Arc::clone(&journals.registry),
                Arc::clone(&ids),
            ),
            repo: Engine::new(Repo, Arc::clone(&journals.repo), Arc::clone(&ids)),
            move_repo: Engine::new(MoveRepo, Arc::clone(&journals.workflow), Arc::clone(&ids)),
            move_shadow: Engine::new(MoveShadow, Arc::clone(&journals.workflow), ids),
            namer,
            main_name,
            main_id,
            journals,
        }
    }

    pub fn journals(&self) -> &Journals {
        &self.journals
    }

    pub fn registry_id(&self, name: &str) -> EntityId {
        self.namer.registry_id(name)
    }
}
