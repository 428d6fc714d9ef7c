// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, shutdown

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use fso_core::{
    FleetEvent, Journal, JournalError, Namer, RegistryEvent, RepoEvent, TimeOrderedIdGen,
    WorkflowEvent,
};
use fso_engine::{
    run_forever, Aggregates, Control, Journals, Processor, ProcessorConfig, RegistryInit,
    Replicate, RepoInit, TellError,
};
use fso_storage::{FileJournal, TracedJournal};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to acquire lock {0}: daemon already running?")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("failed to initialize main: {0}")]
    Init(#[from] TellError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running daemon
pub struct Daemon {
    pub config: Config,
    pub control: Control,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    stop: watch::Sender<bool>,
    processors: JoinSet<()>,
    pub start_time: Instant,
}

impl Daemon {
    /// Stop all processors and wait for them to finish
    pub async fn shutdown(mut self) {
        info!("shutting down daemon");
        let _ = self.stop.send(true);
        while let Some(joined) = self.processors.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "processor task failed");
            }
        }
        info!(
            uptime_s = self.start_time.elapsed().as_secs(),
            "daemon shutdown complete"
        );
    }
}

/// Acquire the data directory, open journals and start processors
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let start = Instant::now();
    std::fs::create_dir_all(&config.data_dir)?;

    // Lock first so that two daemons never share journals
    let lock_path = config.lock_path();
    let mut lock_file = File::create(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|e| LifecycleError::LockFailed(lock_path.clone(), e))?;
    writeln!(lock_file, "{}", std::process::id())?;

    let journals = Journals {
        main: open_journal::<FleetEvent>(config, "main")?,
        registry: open_journal::<RegistryEvent>(config, "registry")?,
        repo: open_journal::<RepoEvent>(config, "repo")?,
        workflow: open_journal::<WorkflowEvent>(config, "workflow")?,
    };
    let aggs = Arc::new(Aggregates::new(
        journals,
        Namer::new(config.namespace),
        config.main_name.clone(),
        Arc::new(TimeOrderedIdGen),
    ));
    let control = Control::new(Arc::clone(&aggs));
    control.init_main()?;

    let (stop, shutdown) = watch::channel(false);
    let mut processors = JoinSet::new();
    let settings = &config.processors;
    spawn(
        &mut processors,
        RegistryInit::new(Arc::clone(&aggs), settings.clone()),
        &shutdown,
        settings,
    );
    spawn(
        &mut processors,
        RepoInit::new(Arc::clone(&aggs), settings.clone()),
        &shutdown,
        settings,
    );
    spawn(
        &mut processors,
        Replicate::new(Arc::clone(&aggs), settings.clone()),
        &shutdown,
        settings,
    );

    info!(
        data_dir = %config.data_dir.display(),
        main = %config.main_name,
        main_id = %aggs.main_id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "daemon started"
    );

    Ok(Daemon {
        config: config.clone(),
        control,
        lock_file,
        stop,
        processors,
        start_time: Instant::now(),
    })
}

fn open_journal<P>(config: &Config, name: &'static str) -> Result<Arc<dyn Journal<P>>, LifecycleError>
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let journal = FileJournal::<P>::open(config.journal_dir(name))?;
    Ok(Arc::new(TracedJournal::new(name, journal)))
}

fn spawn<P: Processor + 'static>(
    set: &mut JoinSet<()>,
    processor: P,
    shutdown: &watch::Receiver<bool>,
    settings: &ProcessorConfig,
) {
    set.spawn(run_forever(
        Arc::new(processor),
        shutdown.clone(),
        settings.retry_delay,
    ));
}

/// Install the global subscriber.
///
/// Logs go to `log_file` when configured, stderr otherwise. The returned
/// guard flushes buffered lines on drop.
pub fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir)?;
            let name = path.file_name().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("log file {} has no file name", path.display()),
                )
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(config.log_file.is_none()))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
