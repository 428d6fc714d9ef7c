// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet root aggregate
//!
//! The singleton "main" aggregate tracks which registries exist and which
//! unix domains are known. A registry is first accepted here, then created
//! by the registry-init processor, which confirms it back.

use crate::behavior::{AdvanceError, Behavior};
use crate::error::{Conflict, DomainError};
use crate::event::EventName;
use crate::id::EntityId;
use crate::limits::check_name;
use crate::naming::Namer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A registry as seen by the fleet root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub confirmed: bool,
}

/// Fleet root state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetState {
    pub id: EntityId,
    pub name: Option<String>,
    pub registries: Arc<BTreeMap<String, RegistryEntry>>,
    pub unix_domains: Arc<BTreeMap<String, EntityId>>,
}

impl FleetState {
    pub fn is_initialized(&self) -> bool {
        self.name.is_some()
    }

    /// Registries accepted but not yet confirmed
    pub fn pending_registries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.registries.values().filter(|r| !r.confirmed)
    }

    /// Registries whose aggregate has been created
    pub fn confirmed_registries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.registries.values().filter(|r| r.confirmed)
    }
}

/// Commands accepted by the fleet root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetCommand {
    Init { name: String },
    InitRegistry { name: String },
    ConfirmRegistry { name: String },
    CreateUnixDomain { name: String },
}

/// Events of the fleet root journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetEvent {
    Initialized { name: String },
    RegistryAccepted { name: String },
    RegistryConfirmed { name: String },
    UnixDomainCreated { domain_id: EntityId, name: String },
}

impl EventName for FleetEvent {
    fn name(&self) -> &'static str {
        match self {
            FleetEvent::Initialized { .. } => "main:initialized",
            FleetEvent::RegistryAccepted { .. } => "main:registry_accepted",
            FleetEvent::RegistryConfirmed { .. } => "main:registry_confirmed",
            FleetEvent::UnixDomainCreated { .. } => "main:unix_domain_created",
        }
    }
}

/// Behavior of the fleet root
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    namer: Namer,
}

impl Fleet {
    pub fn new(namer: Namer) -> Self {
        Self { namer }
    }
}

impl Behavior for Fleet {
    type State = FleetState;
    type Payload = FleetEvent;
    type Command = FleetCommand;

    const KIND: &'static str = "main";

    fn new_state(&self, id: EntityId) -> FleetState {
        FleetState {
            id,
            name: None,
            registries: Arc::new(BTreeMap::new()),
            unix_domains: Arc::new(BTreeMap::new()),
        }
    }

    fn advance(&self, state: &FleetState, event: &FleetEvent) -> Result<FleetState, AdvanceError> {
        let invalid = |reason: &str| AdvanceError::new(Self::KIND, event.name(), reason);
        let mut next = state.clone();
        match event {
            FleetEvent::Initialized { name } => {
                if state.is_initialized() {
                    return Err(invalid("already initialized"));
                }
                next.name = Some(name.clone());
            }
            FleetEvent::RegistryAccepted { name } => {
                Arc::make_mut(&mut next.registries).insert(
                    name.clone(),
                    RegistryEntry {
                        name: name.clone(),
                        confirmed: false,
                    },
                );
            }
            FleetEvent::RegistryConfirmed { name } => {
                let entry = Arc::make_mut(&mut next.registries)
                    .get_mut(name)
                    .ok_or_else(|| invalid("unknown registry"))?;
                entry.confirmed = true;
            }
            FleetEvent::UnixDomainCreated { domain_id, name } => {
                Arc::make_mut(&mut next.unix_domains).insert(name.clone(), *domain_id);
            }
        }
        Ok(next)
    }

    fn tell(&self, state: &FleetState, cmd: FleetCommand) -> Result<Vec<FleetEvent>, DomainError> {
        match cmd {
            FleetCommand::Init { name } => {
                check_name("main name", &name)?;
                match &state.name {
                    None => Ok(vec![FleetEvent::Initialized { name }]),
                    Some(existing) if *existing == name => Ok(vec![]),
                    Some(existing) => Err(Conflict::Init(format!("main is named `{}`", existing)).into()),
                }
            }
            FleetCommand::InitRegistry { name } => {
                check_name("registry name", &name)?;
                if !state.is_initialized() {
                    return Err(DomainError::Uninitialized);
                }
                if state.registries.contains_key(&name) {
                    return Ok(vec![]);
                }
                Ok(vec![FleetEvent::RegistryAccepted { name }])
            }
            FleetCommand::ConfirmRegistry { name } => {
                if !state.is_initialized() {
                    return Err(DomainError::Uninitialized);
                }
                match state.registries.get(&name) {
                    None => Err(Conflict::UnknownRegistry(name).into()),
                    Some(entry) if entry.confirmed => Ok(vec![]),
                    Some(_) => Ok(vec![FleetEvent::RegistryConfirmed { name }]),
                }
            }
            FleetCommand::CreateUnixDomain { name } => {
                check_name("unix domain name", &name)?;
                if !state.is_initialized() {
                    return Err(DomainError::Uninitialized);
                }
                if state.unix_domains.contains_key(&name) {
                    return Ok(vec![]);
                }
                let domain_id = self.namer.unix_domain_id(&name);
                Ok(vec![FleetEvent::UnixDomainCreated { domain_id, name }])
            }
        }
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
