// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fso-daemon: process plumbing for the control plane
//!
//! Configuration loading, the data-directory lock, journal wiring,
//! processor supervision and logging.

pub mod config;
pub mod lifecycle;

pub use config::{Config, ConfigError};
pub use lifecycle::{setup_logging, startup, Daemon, LifecycleError};
