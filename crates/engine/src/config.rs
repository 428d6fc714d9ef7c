// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How init processors learn what their parent still expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    /// Read the parent's folded state
    #[default]
    State,
    /// Replay the parent's events after the last processed one
    Events,
}

/// Settings shared by the init and replication processors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Pause before a failed pass is retried
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Interval between full rescans
    #[serde(with = "humantime_serde")]
    pub rescan_interval: Duration,
    /// Pause between two ids during a rescan
    #[serde(with = "humantime_serde")]
    pub rescan_item_delay: Duration,
    /// Capacity of each notification queue
    pub notify_capacity: usize,
    pub init_strategy: InitStrategy,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(20),
            rescan_interval: Duration::from_secs(600),
            rescan_item_delay: Duration::from_millis(100),
            notify_capacity: 1000,
            init_strategy: InitStrategy::State,
        }
    }
}

impl ProcessorConfig {
    /// Short delays for tests
    pub fn for_testing() -> Self {
        Self {
            retry_delay: Duration::from_millis(20),
            rescan_interval: Duration::from_millis(200),
            rescan_item_delay: Duration::from_millis(1),
            notify_capacity: 16,
            init_strategy: InitStrategy::State,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.retry_delay, Duration::from_secs(20));
        assert_eq!(config.rescan_interval, Duration::from_secs(600));
        assert_eq!(config.notify_capacity, 1000);
        assert_eq!(config.init_strategy, InitStrategy::State);
    }

    #[test]
    fn for_testing_is_fast() {
        let config = ProcessorConfig::for_testing();
        assert!(config.retry_delay < Duration::from_secs(1));
        assert!(config.rescan_interval < Duration::from_secs(1));
    }
}
