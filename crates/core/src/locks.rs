// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-id mutual exclusion
//!
//! Work on one id is serialized; different ids proceed in parallel. An
//! entry lives only while some caller holds or waits for it.

use crate::id::EntityId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct IdLocks {
    locks: Mutex<HashMap<EntityId, Arc<Mutex<()>>>>,
}

impl IdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<EntityId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` while holding the lock of `id`
    pub fn with<T>(&self, id: EntityId, f: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(self.table().entry(id).or_default());
        let out = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        // Clones are only taken under the table lock, so a count of two
        // (table and ours) means nobody else is waiting
        let mut table = self.table();
        if Arc::strong_count(&lock) == 2 {
            table.remove(&id);
        }
        // Release ours before the table so the next finisher counts right
        drop(lock);
        drop(table);
        out
    }

    /// Number of ids currently locked or waited on
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
