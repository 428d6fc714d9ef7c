// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed journal
//!
//! Layout: one `<entity-id>.jsonl` file per entity under the journal
//! directory, one `JournalEntry` per append.
//!
//! ## Durability
//!
//! - Every append is one line followed by `fsync()` before returning
//! - Checksums detect corrupted records
//! - A line cut short by a crash during append can only be the last line
//!   of a file. Any last line without its newline is dropped and the file
//!   truncated when the journal is reopened, even if the line parses.
//!
//! Appends and reads of one entity are serialized; different entities do
//! not contend beyond a short update of the tail table.

use crate::entry::JournalEntry;
use crate::notify::Notifier;
use fso_core::journal::check_chain;
use fso_core::{
    EntityId, Event, EventId, ExpectedVid, IdLocks, Journal, JournalError, NotifySender,
    SubscriberId, Watch,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const EXTENSION: &str = "jsonl";

/// Journal persisted as JSONL files
pub struct FileJournal<P> {
    dir: PathBuf,
    /// Tail of every non-empty log. Never held during file I/O.
    tails: Mutex<HashMap<EntityId, EventId>>,
    locks: IdLocks,
    notifier: Notifier,
    _payload: PhantomData<fn() -> P>,
}

impl<P: Serialize + DeserializeOwned> FileJournal<P> {
    /// Open or create a journal in `dir`, validating every log
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut tails = HashMap::new();
        for dirent in fs::read_dir(&dir)? {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<EntityId>().ok())
            else {
                tracing::warn!(path = %path.display(), "ignoring unexpected file in journal");
                continue;
            };
            let tail = recover::<P>(&path, id)?;
            if !tail.is_epoch() {
                tails.insert(id, tail);
            }
        }
        tracing::debug!(dir = %dir.display(), logs = tails.len(), "journal opened");

        Ok(Self {
            dir,
            tails: Mutex::new(tails),
            locks: IdLocks::new(),
            notifier: Notifier::new(),
            _payload: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: EntityId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }

    fn tails(&self) -> MutexGuard<'_, HashMap<EntityId, EventId>> {
        self.tails.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current_tail(&self, id: EntityId) -> EventId {
        self.tails().get(&id).copied().unwrap_or(EventId::EPOCH)
    }

    fn write_line(&self, id: EntityId, line: &str) -> Result<(), JournalError> {
        let path = self.path(id);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len_before = file.metadata()?.len();
        let written = file
            .write_all(line.as_bytes())
            .and_then(|()| file.sync_all());
        if let Err(e) = written {
            // Leave no partial record behind for the next append to follow
            if let Err(trunc) = file.set_len(len_before) {
                tracing::error!(%id, error = %trunc, "failed to roll back partial append");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Check and write one batch; returns the tail and whether anything
    /// was written. Caller holds the lock of `id`.
    fn append_locked(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        events: Vec<Event<P>>,
    ) -> Result<(EventId, bool), JournalError> {
        let actual = self.current_tail(id);
        if !expected.admits(actual) {
            return Err(JournalError::Conflict {
                id,
                expected: match expected {
                    ExpectedVid::Exact(vid) => vid,
                    ExpectedVid::Any => actual,
                },
                actual,
            });
        }
        if events.is_empty() {
            return Ok((actual, false));
        }
        let tail = check_chain(id, actual, &events)?;

        let mut line = JournalEntry::new(events)?.to_line()?;
        line.push('\n');
        self.write_line(id, &line)?;
        self.tails().insert(id, tail);
        Ok((tail, true))
    }
}

/// Validate the log at `path` and return its tail.
///
/// Truncates an unterminated trailing line.
fn recover<P: Serialize + DeserializeOwned>(
    path: &Path,
    id: EntityId,
) -> Result<EventId, JournalError> {
    let content = fs::read_to_string(path)?;
    let mut tail = EventId::EPOCH;
    let mut valid_len = 0usize;

    for chunk in content.split_inclusive('\n') {
        if !chunk.ends_with('\n') {
            tracing::warn!(
                %id,
                offset = valid_len,
                dropped_bytes = chunk.len(),
                "truncating incomplete trailing record"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
            break;
        }
        let line = chunk.trim_end_matches('\n');
        if line.is_empty() {
            valid_len += chunk.len();
            continue;
        }
        let entry = JournalEntry::<P>::from_line(line).map_err(|e| JournalError::Corrupt {
            id,
            reason: format!("unreadable record at byte {}: {}", valid_len, e),
        })?;
        if !entry.verify() {
            return Err(JournalError::Corrupt {
                id,
                reason: format!("checksum mismatch at byte {}", valid_len),
            });
        }
        tail = check_chain(id, tail, &entry.events)?;
        valid_len += chunk.len();
    }
    Ok(tail)
}

fn read_events<P: Serialize + DeserializeOwned>(
    path: &Path,
    id: EntityId,
    after: EventId,
) -> Result<Vec<Event<P>>, JournalError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut events = Vec::new();
    for line in content.lines().filter(|l| !l.is_empty()) {
        let entry = JournalEntry::<P>::from_line(line).map_err(|e| JournalError::Corrupt {
            id,
            reason: e.to_string(),
        })?;
        if !entry.verify() {
            return Err(JournalError::Corrupt {
                id,
                reason: "checksum mismatch".to_string(),
            });
        }
        events.extend(entry.events.into_iter().filter(|e| e.id > after));
    }
    Ok(events)
}

impl<P> Journal<P> for FileJournal<P>
where
    P: Serialize + DeserializeOwned + Send + Sync,
{
    fn append(
        &self,
        id: EntityId,
        expected: ExpectedVid,
        events: Vec<Event<P>>,
    ) -> Result<EventId, JournalError> {
        let (tail, written) = self
            .locks
            .with(id, || self.append_locked(id, expected, events))?;
        if written {
            self.notifier.publish(id);
        }
        Ok(tail)
    }

    fn find(&self, id: EntityId, after: EventId) -> Result<Vec<Event<P>>, JournalError> {
        if self.current_tail(id) <= after {
            return Ok(Vec::new());
        }
        self.locks
            .with(id, || read_events(&self.path(id), id, after))
    }

    fn tail(&self, id: EntityId) -> Result<EventId, JournalError> {
        Ok(self.current_tail(id))
    }

    fn subscribe(&self, tx: NotifySender, watch: Watch) -> SubscriberId {
        self.notifier.subscribe(tx, watch)
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.notifier.unsubscribe(subscriber);
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
