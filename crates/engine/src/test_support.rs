// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fixtures shared by engine tests

use crate::aggregates::{Aggregates, Journals};
use crate::control::Control;
use crate::processor::{run_forever, Processor};
use fso_core::{Creator, EntityId, Namer, SequentialIdGen};
use fso_storage::MemJournal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub(crate) const MAIN: &str = "main";
pub(crate) const REGISTRY: &str = "fooReg";

pub(crate) fn mem_journals() -> Journals {
    Journals {
        main: Arc::new(MemJournal::new()),
        registry: Arc::new(MemJournal::new()),
        repo: Arc::new(MemJournal::new()),
        workflow: Arc::new(MemJournal::new()),
    }
}

pub(crate) fn aggregates_over(journals: Journals) -> Arc<Aggregates> {
    Arc::new(Aggregates::new(
        journals,
        Namer::default(),
        MAIN,
        Arc::new(SequentialIdGen::new()),
    ))
}

pub(crate) fn mem_aggregates() -> Arc<Aggregates> {
    aggregates_over(mem_journals())
}

pub(crate) fn creator() -> Creator {
    Creator::new("A. U. Thor", "author@example.com")
}

/// Main initialized, `fooReg` created by hand with root `/foo` on host `files`
pub(crate) fn seeded_control() -> Control {
    let control = Control::new(mem_aggregates());
    control.init_main().unwrap();
    control.init_registry(REGISTRY).unwrap();
    let aggs = control.aggregates();
    let registry_id = aggs.registry_id(REGISTRY);
    aggs.registry
        .tell(
            registry_id,
            fso_core::RegistryCommand::Init {
                name: REGISTRY.to_string(),
            },
        )
        .unwrap();
    aggs.main
        .tell(
            aggs.main_id,
            fso_core::FleetCommand::ConfirmRegistry {
                name: REGISTRY.to_string(),
            },
        )
        .unwrap();
    control.add_root(REGISTRY, "/foo", "files", "/data/foo").unwrap();
    control
}

/// Create `global_path` in `fooReg` without running repo-init
pub(crate) fn create_repo(control: &Control, global_path: &str) -> EntityId {
    let aggs = control.aggregates();
    let repo_id = control.init_repo(REGISTRY, global_path, creator()).unwrap();
    let registry = control.registry(REGISTRY).unwrap();
    let entry = registry.state.repos.get(&repo_id).unwrap().clone();
    let vid = aggs
        .repo
        .tell(
            repo_id,
            fso_core::RepoCommand::Init {
                registry: REGISTRY.to_string(),
                global_path: global_path.to_string(),
                file: entry.location,
                creator: entry.creator,
            },
        )
        .unwrap();
    aggs.registry
        .tell(
            aggs.registry_id(REGISTRY),
            fso_core::RegistryCommand::ConfirmRepo {
                repo_id,
                repo_event_id: vid,
            },
        )
        .unwrap();
    repo_id
}

/// A processor running in the background until the handle is dropped
pub(crate) struct Running {
    stop: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl Running {
    pub(crate) async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            task.await.unwrap();
        }
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

pub(crate) fn spawn<P: Processor + 'static>(processor: P) -> Running {
    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn(run_forever(
        Arc::new(processor),
        shutdown,
        Duration::from_millis(20),
    ));
    Running {
        stop,
        task: Some(task),
    }
}

/// Poll `check` until it returns true, failing after a few seconds
pub(crate) async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}
