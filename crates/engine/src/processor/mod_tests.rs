// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fso_core::{Conflict, DomainError, Event, ExpectedVid};
use fso_storage::MemJournal;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Fails a fixed number of passes, then waits for shutdown
struct Flaky {
    failures: usize,
    passes: AtomicUsize,
}

#[async_trait]
impl Processor for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn run_once(&self, shutdown: &mut Shutdown) -> Result<(), ProcessorError> {
        let pass = self.passes.fetch_add(1, Ordering::SeqCst);
        if pass < self.failures {
            return Err(ProcessorError::Journal(fso_core::JournalError::Corrupt {
                id: EntityId::random(),
                reason: "test".to_string(),
            }));
        }
        cancelled(shutdown).await;
        Ok(())
    }
}

#[tokio::test]
async fn run_forever_retries_failed_passes() {
    let processor = Arc::new(Flaky {
        failures: 3,
        passes: AtomicUsize::new(0),
    });
    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn(run_forever(
        Arc::clone(&processor),
        shutdown,
        Duration::from_millis(5),
    ));

    crate::test_support::eventually("fourth pass", || {
        processor.passes.load(Ordering::SeqCst) >= 4
    })
    .await;
    stop.send(true).unwrap();
    task.await.unwrap();
    assert_eq!(processor.passes.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn run_forever_does_not_start_when_cancelled() {
    let processor = Arc::new(Flaky {
        failures: 0,
        passes: AtomicUsize::new(0),
    });
    let (stop, shutdown) = watch::channel(true);
    run_forever(Arc::clone(&processor), shutdown, Duration::from_secs(60)).await;
    drop(stop);
    assert_eq!(processor.passes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sleep_is_cut_short_by_cancellation() {
    let (stop, mut shutdown) = watch::channel(false);
    let sleeper = tokio::spawn(async move {
        sleep_or_cancel(&mut shutdown, Duration::from_secs(60)).await
    });
    stop.send(true).unwrap();
    assert!(!sleeper.await.unwrap());
}

#[tokio::test]
async fn sleep_completes_without_cancellation() {
    let (_stop, mut shutdown) = watch::channel(false);
    assert!(sleep_or_cancel(&mut shutdown, Duration::from_millis(1)).await);
}

#[tokio::test]
async fn dropped_sender_counts_as_cancellation() {
    let (stop, mut shutdown) = watch::channel(false);
    drop(stop);
    cancelled(&mut shutdown).await;
}

#[tokio::test]
async fn subscription_unsubscribes_on_drop() {
    let journal: Arc<dyn Journal<u32>> = Arc::new(MemJournal::new());
    let id = EntityId::random();
    let (tx, mut rx) = mpsc::channel(4);
    let subscription = Subscription::new(&journal, tx, Watch::All);

    let first = EventId(Uuid::from_u128(1));
    journal
        .append(id, ExpectedVid::Any, vec![Event::new(first, EventId::EPOCH, 1)])
        .unwrap();
    assert_eq!(rx.recv().await, Some(id));

    drop(subscription);
    assert_eq!(rx.recv().await, None);
}

#[test]
fn settle_skips_rejections() {
    let id = EntityId::random();
    let rejected = settle(
        "repo",
        id,
        Err(TellError::Domain(DomainError::Conflict(Conflict::Workflow))),
    )
    .unwrap();
    assert_eq!(rejected, None);

    let vid = EventId(Uuid::from_u128(9));
    assert_eq!(settle("repo", id, Ok(vid)).unwrap(), Some(vid));
}

#[test]
fn settle_fails_on_infrastructure_errors() {
    let id = EntityId::random();
    let err = settle(
        "repo",
        id,
        Err(TellError::Concurrency {
            id,
            expected: EventId::EPOCH,
            actual: EventId(Uuid::from_u128(1)),
        }),
    )
    .unwrap_err();
    assert!(matches!(err, ProcessorError::Tell { kind: "repo", .. }));
}

#[test]
fn drain_empties_queue() {
    let (tx, mut rx) = mpsc::channel(4);
    tx.try_send(EntityId::random()).unwrap();
    tx.try_send(EntityId::random()).unwrap();
    drain(&mut rx);
    assert!(rx.try_recv().is_err());
}
