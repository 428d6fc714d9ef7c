// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal file record with checksum verification
//!
//! Each line of a journal file is one `JournalEntry`: every event of one
//! append plus a CRC32 of their serialized form. A batch is therefore
//! either entirely in the file or not at all.

use fso_core::{Event, JournalError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One line of a journal file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry<P> {
    pub events: Vec<Event<P>>,
    /// CRC32 of the serialized events
    pub checksum: u32,
}

impl<P: Serialize + DeserializeOwned> JournalEntry<P> {
    pub fn new(events: Vec<Event<P>>) -> Result<Self, JournalError> {
        let checksum = Self::calculate_checksum(&events)?;
        Ok(Self { events, checksum })
    }

    fn calculate_checksum(events: &[Event<P>]) -> Result<u32, JournalError> {
        let json = serde_json::to_string(events)?;
        Ok(crc32fast::hash(json.as_bytes()))
    }

    /// Whether the checksum matches the events
    pub fn verify(&self) -> bool {
        Self::calculate_checksum(&self.events).is_ok_and(|c| c == self.checksum)
    }

    /// Serialize to a single line without the trailing newline
    pub fn to_line(&self) -> Result<String, JournalError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_line(line: &str) -> Result<Self, JournalError> {
        Ok(serde_json::from_str(line)?)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
