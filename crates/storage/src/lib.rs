// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fso-storage: journal implementations
//!
//! - `MemJournal`: in-process journal for tests and embedding
//! - `FileJournal`: one checksummed JSONL file per entity, fsync'd on append
//! - `TracedJournal`: wrapper adding spans and timings to any journal

mod entry;
mod file;
mod mem;
mod notify;
mod traced;

pub use entry::JournalEntry;
pub use file::FileJournal;
pub use mem::MemJournal;
pub use notify::Notifier;
pub use traced::TracedJournal;
