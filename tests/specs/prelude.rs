//! Shared harness: a fleet of aggregates with all processors running

#![allow(dead_code)]

use fso_core::{
    Creator, EntityId, EventId, FleetEvent, Journal, Location, Namer, RegistryEvent, RepoEvent,
    SequentialIdGen, WorkflowEvent, WorkflowId,
};
use fso_engine::{
    run_forever, Aggregates, Control, Journals, Processor, ProcessorConfig, RegistryInit,
    Replicate, RepoInit,
};
use fso_storage::{FileJournal, MemJournal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

pub use similar_asserts::assert_eq;

pub const REGISTRY: &str = "fooReg";

pub fn wf(n: u128) -> WorkflowId {
    EntityId(uuid::Uuid::from_u128(n))
}

pub fn creator() -> Creator {
    Creator::new("A. U. Thor", "author@example.com")
}

pub fn loc(host: &str, path: &str) -> Location {
    Location::new(host, path)
}

pub fn mem_journals() -> Journals {
    Journals {
        main: Arc::new(MemJournal::<FleetEvent>::new()),
        registry: Arc::new(MemJournal::<RegistryEvent>::new()),
        repo: Arc::new(MemJournal::<RepoEvent>::new()),
        workflow: Arc::new(MemJournal::<WorkflowEvent>::new()),
    }
}

pub fn file_journals(dir: &Path) -> Journals {
    fn open<P>(dir: &Path, name: &str) -> Arc<dyn Journal<P>>
    where
        P: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        Arc::new(FileJournal::<P>::open(dir.join(name)).unwrap())
    }
    Journals {
        main: open(dir, "main"),
        registry: open(dir, "registry"),
        repo: open(dir, "repo"),
        workflow: open(dir, "workflow"),
    }
}

/// Fresh aggregates over `journals` with the main entity initialized and
/// no processors running
pub fn control_over(journals: Journals) -> Control {
    let aggs = Arc::new(Aggregates::new(
        journals,
        Namer::default(),
        "main",
        Arc::new(SequentialIdGen::new()),
    ));
    let control = Control::new(aggs);
    control.init_main().unwrap();
    control
}

/// Aggregates over `journals` with the three processors running
pub struct Cluster {
    pub control: Control,
    stop: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl Cluster {
    pub fn start(journals: Journals, config: ProcessorConfig) -> Self {
        let control = control_over(journals);
        let aggs = Arc::clone(control.aggregates());

        let (stop, shutdown) = watch::channel(false);
        let mut tasks = JoinSet::new();
        let processors: Vec<Arc<dyn Processor>> = vec![
            Arc::new(RegistryInit::new(Arc::clone(&aggs), config.clone())),
            Arc::new(RepoInit::new(Arc::clone(&aggs), config.clone())),
            Arc::new(Replicate::new(Arc::clone(&aggs), config.clone())),
        ];
        for processor in processors {
            tasks.spawn(run_forever(processor, shutdown.clone(), config.retry_delay));
        }
        Self {
            control,
            stop,
            tasks,
        }
    }

    pub fn in_memory() -> Self {
        Self::start(mem_journals(), ProcessorConfig::for_testing())
    }

    pub fn journals(&self) -> Journals {
        self.control.aggregates().journals().clone()
    }

    pub async fn stop(mut self) {
        self.stop.send(true).unwrap();
        while let Some(joined) = self.tasks.join_next().await {
            joined.unwrap();
        }
    }

    /// Registry `fooReg` with root `/foo` on host `files`
    pub async fn with_registry(self) -> Self {
        self.control.init_registry(REGISTRY).unwrap();
        let control = &self.control;
        eventually("registry created", || {
            control.registry(REGISTRY).unwrap().exists()
        })
        .await;
        control
            .add_root(REGISTRY, "/foo", "files", "/data/foo")
            .unwrap();
        self
    }

    /// Create `global_path` in `fooReg`, confirm its shadow and wait until
    /// the registry has confirmed it
    pub async fn repo(&self, global_path: &str) -> EntityId {
        let control = &self.control;
        let repo_id = control
            .init_repo(REGISTRY, global_path, creator())
            .unwrap();
        eventually("repo confirmed", || {
            control
                .registry(REGISTRY)
                .unwrap()
                .state
                .repos
                .get(&repo_id)
                .is_some_and(|r| r.confirmed)
        })
        .await;
        control
            .confirm_shadow(repo_id, &format!("/shadow{}", global_path))
            .unwrap();
        repo_id
    }
}

/// Number of events in the log of `workflow_id`
pub fn workflow_events(journals: &Journals, workflow_id: WorkflowId) -> usize {
    journals
        .workflow
        .find(workflow_id, EventId::EPOCH)
        .unwrap()
        .len()
}

/// Poll `check` until it returns true, failing after a few seconds
pub async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}
