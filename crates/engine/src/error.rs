// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine and processors

use fso_core::{DomainError, EntityId, FoldError, JournalError, Vid};
use thiserror::Error;

/// Errors returned by `Engine::tell_id_vid` and friends
#[derive(Debug, Error)]
pub enum TellError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("stale version of {id}: expected {expected}, actual {actual}")]
    Concurrency {
        id: EntityId,
        expected: Vid,
        actual: Vid,
    },
    #[error("journal error: {0}")]
    Journal(JournalError),
    #[error(transparent)]
    Advance(#[from] FoldError),
}

impl TellError {
    /// The command was rejected by the aggregate
    pub fn is_domain(&self) -> bool {
        matches!(self, TellError::Domain(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, TellError::Domain(e) if e.is_conflict())
    }

    /// Whether re-reading and retrying may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TellError::Concurrency { .. } | TellError::Journal(_))
    }
}

impl From<JournalError> for TellError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::Conflict {
                id,
                expected,
                actual,
            } => TellError::Concurrency {
                id,
                expected,
                actual,
            },
            other => TellError::Journal(other),
        }
    }
}

/// Errors that stop one processor pass; the processor retries after a delay
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("{kind} {id}: {source}")]
    Tell {
        kind: &'static str,
        id: EntityId,
        #[source]
        source: TellError,
    },
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}
