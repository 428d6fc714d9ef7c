// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry-init processor
//!
//! Creates every registry accepted by the fleet root and confirms it back.

use super::{cancelled, drain, load_failed, settle, Processor, Shutdown, Subscription};
use crate::aggregates::Aggregates;
use crate::config::{InitStrategy, ProcessorConfig};
use crate::error::ProcessorError;
use async_trait::async_trait;
use fso_core::{EventId, FleetCommand, FleetEvent, RegistryCommand, Watch};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// A registry the fleet root still expects to be created
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegistryInitAction {
    pub name: String,
}

/// What a pass has learned from the fleet root so far
enum Pending {
    State,
    Events {
        tail: EventId,
        names: BTreeSet<String>,
    },
}

impl Pending {
    fn new(strategy: InitStrategy) -> Self {
        match strategy {
            InitStrategy::State => Pending::State,
            InitStrategy::Events => Pending::Events {
                tail: EventId::EPOCH,
                names: BTreeSet::new(),
            },
        }
    }
}

pub struct RegistryInit {
    aggs: Arc<Aggregates>,
    config: ProcessorConfig,
}

impl RegistryInit {
    pub fn new(aggs: Arc<Aggregates>, config: ProcessorConfig) -> Self {
        Self { aggs, config }
    }

    /// Registries accepted but not yet confirmed, in name order
    fn pending(&self, pending: &mut Pending) -> Result<Vec<RegistryInitAction>, ProcessorError> {
        let main_id = self.aggs.main_id;
        let names = match pending {
            Pending::State => {
                let main = self
                    .aggs
                    .main
                    .load(main_id)
                    .map_err(load_failed("main", main_id))?;
                main.state
                    .pending_registries()
                    .map(|r| r.name.clone())
                    .collect::<Vec<_>>()
            }
            Pending::Events { tail, names } => {
                for event in self.aggs.journals().main.find(main_id, *tail)? {
                    match &event.payload {
                        FleetEvent::RegistryAccepted { name } => {
                            names.insert(name.clone());
                        }
                        FleetEvent::RegistryConfirmed { name } => {
                            names.remove(name);
                        }
                        FleetEvent::Initialized { .. } | FleetEvent::UnixDomainCreated { .. } => {}
                    }
                    *tail = event.id;
                }
                names.iter().cloned().collect()
            }
        };
        Ok(names
            .into_iter()
            .map(|name| RegistryInitAction { name })
            .collect())
    }

    fn apply(&self, action: &RegistryInitAction) -> Result<(), ProcessorError> {
        let registry_id = self.aggs.registry_id(&action.name);
        let created = settle(
            "registry",
            registry_id,
            self.aggs.registry.tell(
                registry_id,
                RegistryCommand::Init {
                    name: action.name.clone(),
                },
            ),
        )?;
        if created.is_none() {
            return Ok(());
        }
        settle(
            "main",
            self.aggs.main_id,
            self.aggs.main.tell(
                self.aggs.main_id,
                FleetCommand::ConfirmRegistry {
                    name: action.name.clone(),
                },
            ),
        )?;
        tracing::info!(registry = %action.name, %registry_id, "registry created");
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
                "registry-init sync"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Processor for RegistryInit {
    fn name(&self) -> &'static str {
        "registry-init"
    }

    async fn run_once(&self, shutdown: &mut Shutdown) -> Result<(), ProcessorError> {
        let (tx, mut rx) = mpsc::channel(self.config.notify_capacity);
        let _subscription =
            Subscription::new(&self.aggs.journals().main, tx, Watch::Id(self.aggs.main_id));
        let mut pending = Pending::new(self.config.init_strategy);
        let mut ticker = tokio::time::interval(self.config.rescan_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancelled(shutdown) => return Ok(()),
                Some(_) = rx.recv() => {
                    drain(&mut rx);
                    self.sync(&mut pending)?;
                }
                _ = ticker.tick() => self.sync(&mut pending)?,
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_init_tests.rs"]
mod tests;
