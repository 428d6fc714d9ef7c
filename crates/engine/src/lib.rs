// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fso-engine: aggregate engine, command surface and processors

mod aggregates;
mod config;
mod control;
mod engine;
mod error;
pub mod processor;

#[cfg(test)]
mod test_support;

pub use aggregates::{
    Aggregates, Journals, MainEngine, MainJournal, MoveRepoEngine, MoveShadowEngine,
    RegistryEngine, RegistryJournal, RepoEngine, RepoJournal, WorkflowJournal,
};
pub use config::{InitStrategy, ProcessorConfig};
pub use control::Control;
pub use engine::Engine;
pub use error::{ProcessorError, TellError};
pub use processor::{run_forever, Processor, RegistryInit, Replicate, RepoInit, Shutdown};
