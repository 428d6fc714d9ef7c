// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fso_core::{EntityId, EventId, Location, RepoEvent};
use uuid::Uuid;

fn eid(n: u128) -> EventId {
    EventId(Uuid::from_u128(n))
}

fn sample_batch() -> Vec<Event<RepoEvent>> {
    vec![
        Event::new(
            eid(7),
            EventId::EPOCH,
            RepoEvent::MoveRepoStarted {
                workflow_id: EntityId(Uuid::from_u128(3)),
                old_file: Location::new("files", "/data/foo/1"),
                new_file: Location::new("files2", "/data/foo/1"),
            },
        ),
        Event::new(
            eid(8),
            eid(7),
            RepoEvent::ErrorSet {
                message: "disk full".to_string(),
            },
        ),
    ]
}

#[test]
fn entry_creation_computes_checksum() {
    let entry = JournalEntry::new(sample_batch()).unwrap();
    assert!(entry.verify());
}

#[test]
fn entry_line_round_trip_verifies() {
    let entry = JournalEntry::new(sample_batch()).unwrap();
    let line = entry.to_line().unwrap();
    assert!(!line.contains('\n'));

    let parsed: JournalEntry<RepoEvent> = JournalEntry::from_line(&line).unwrap();
    assert_eq!(parsed, entry);
    assert!(parsed.verify());
}

#[test]
fn tampered_event_fails_verification() {
    let mut entry = JournalEntry::new(sample_batch()).unwrap();
    if let RepoEvent::MoveRepoStarted { ref mut new_file, .. } = entry.events[0].payload {
        new_file.host = "elsewhere".to_string();
    }
    assert!(!entry.verify());
}

#[test]
fn checksum_covers_every_event_of_the_batch() {
    let mut entry = JournalEntry::new(sample_batch()).unwrap();
    entry.events.pop();
    assert!(!entry.verify());
}

#[test]
fn wrong_checksum_fails_verification() {
    let mut entry = JournalEntry::new(sample_batch()).unwrap();
    entry.checksum ^= 1;
    assert!(!entry.verify());
}

#[test]
fn truncated_line_does_not_parse() {
    let line = JournalEntry::new(sample_batch()).unwrap().to_line().unwrap();
    let truncated = &line[..line.len() / 2];
    assert!(JournalEntry::<RepoEvent>::from_line(truncated).is_err());
}
