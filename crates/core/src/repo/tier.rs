// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage tier state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the content of a repo currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTier {
    #[default]
    Online,
    Freezing,
    Frozen,
    FreezeFailed,
    Unfreezing,
    UnfreezeFailed,
    Archiving,
    Archived,
    ArchiveFailed,
    Unarchiving,
    UnarchiveFailed,
}

impl StorageTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Online => "online",
            StorageTier::Freezing => "freezing",
            StorageTier::Frozen => "frozen",
            StorageTier::FreezeFailed => "freeze-failed",
            StorageTier::Unfreezing => "unfreezing",
            StorageTier::UnfreezeFailed => "unfreeze-failed",
            StorageTier::Archiving => "archiving",
            StorageTier::Archived => "archived",
            StorageTier::ArchiveFailed => "archive-failed",
            StorageTier::Unarchiving => "unarchiving",
            StorageTier::UnarchiveFailed => "unarchive-failed",
        }
    }

    /// Whether a tier operation is running
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            StorageTier::Freezing
                | StorageTier::Unfreezing
                | StorageTier::Archiving
                | StorageTier::Unarchiving
        )
    }

    /// Whether the last tier operation failed
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            StorageTier::FreezeFailed
                | StorageTier::UnfreezeFailed
                | StorageTier::ArchiveFailed
                | StorageTier::UnarchiveFailed
        )
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier operation, driven through begin, then commit or abort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOp {
    Freeze,
    Unfreeze,
    Archive,
    Unarchive,
}

impl TierOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierOp::Freeze => "freeze",
            TierOp::Unfreeze => "unfreeze",
            TierOp::Archive => "archive",
            TierOp::Unarchive => "unarchive",
        }
    }

    /// Tiers from which the operation may begin.
    ///
    /// The failed tier is listed so that the operation can be retried once
    /// the error has been cleared.
    pub fn sources(&self) -> [StorageTier; 2] {
        match self {
            TierOp::Freeze => [StorageTier::Online, StorageTier::FreezeFailed],
            TierOp::Unfreeze => [StorageTier::Frozen, StorageTier::UnfreezeFailed],
            TierOp::Archive => [StorageTier::Frozen, StorageTier::ArchiveFailed],
            TierOp::Unarchive => [StorageTier::Archived, StorageTier::UnarchiveFailed],
        }
    }

    pub fn in_progress(&self) -> StorageTier {
        match self {
            TierOp::Freeze => StorageTier::Freezing,
            TierOp::Unfreeze => StorageTier::Unfreezing,
            TierOp::Archive => StorageTier::Archiving,
            TierOp::Unarchive => StorageTier::Unarchiving,
        }
    }

    pub fn done(&self) -> StorageTier {
        match self {
            TierOp::Freeze => StorageTier::Frozen,
            TierOp::Unfreeze => StorageTier::Online,
            TierOp::Archive => StorageTier::Archived,
            TierOp::Unarchive => StorageTier::Frozen,
        }
    }

    pub fn failed(&self) -> StorageTier {
        match self {
            TierOp::Freeze => StorageTier::FreezeFailed,
            TierOp::Unfreeze => StorageTier::UnfreezeFailed,
            TierOp::Archive => StorageTier::ArchiveFailed,
            TierOp::Unarchive => StorageTier::UnarchiveFailed,
        }
    }

    pub fn can_begin_from(&self, tier: StorageTier) -> bool {
        self.sources().contains(&tier)
    }

    /// Whether `tier` is where this operation is or ended up
    pub fn is_reflected_in(&self, tier: StorageTier) -> bool {
        tier == self.in_progress() || tier == self.done() || tier == self.failed()
    }
}

impl fmt::Display for TierOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
