//! Storage tier transitions and their interaction with moves

use crate::prelude::*;
use crate::prelude::assert_eq;
use fso_core::{Conflict, DomainError, StorageTier, TierOp};
use fso_engine::TellError;

#[tokio::test]
async fn freeze_and_unfreeze_round_trip() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;
    let tier = |c: &fso_engine::Control| c.repo(repo_id).unwrap().state.storage_tier;

    control.begin_tier(repo_id, TierOp::Freeze, wf(1)).unwrap();
    assert_eq!(tier(control), StorageTier::Freezing);

    // Moves wait for the tier operation
    let err = control
        .begin_move_repo(repo_id, wf(9), loc("files2", "/data2/foo/bar"))
        .unwrap_err();
    assert!(err.is_conflict(), "{}", err);

    control
        .commit_tier(repo_id, TierOp::Freeze, wf(1), None)
        .unwrap();
    assert_eq!(tier(control), StorageTier::Frozen);

    let err = control
        .begin_move_repo(repo_id, wf(9), loc("files2", "/data2/foo/bar"))
        .unwrap_err();
    assert!(matches!(
        err,
        TellError::Domain(DomainError::Conflict(Conflict::StorageTier {
            tier: StorageTier::Frozen,
            ..
        }))
    ));

    control.begin_tier(repo_id, TierOp::Unfreeze, wf(2)).unwrap();
    control
        .commit_tier(repo_id, TierOp::Unfreeze, wf(2), None)
        .unwrap();
    assert_eq!(tier(control), StorageTier::Online);

    cluster.stop().await;
}

#[tokio::test]
async fn archive_records_the_archive_url() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control.begin_tier(repo_id, TierOp::Archive, wf(1)).unwrap();
    let err = control
        .commit_tier(repo_id, TierOp::Archive, wf(1), None)
        .unwrap_err();
    assert!(matches!(err, TellError::Domain(DomainError::Validation(_))));

    control
        .commit_tier(repo_id, TierOp::Archive, wf(1), Some("s3://archive/bar.tar"))
        .unwrap();
    let repo = control.repo(repo_id).unwrap().state;
    assert_eq!(repo.storage_tier, StorageTier::Archived);
    assert_eq!(repo.archive_url.as_deref(), Some("s3://archive/bar.tar"));

    cluster.stop().await;
}

#[tokio::test]
async fn failed_tier_operation_blocks_moves_until_cleared() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control.begin_tier(repo_id, TierOp::Freeze, wf(1)).unwrap();
    control
        .abort_tier(repo_id, TierOp::Freeze, wf(1), 3, "tape offline")
        .unwrap();

    let repo = control.repo(repo_id).unwrap().state;
    assert_eq!(repo.storage_tier, StorageTier::FreezeFailed);
    assert_eq!(repo.error_message, "freeze failed: status 3: tape offline");

    let err = control
        .begin_move_shadow(repo_id, wf(2), "/shadow2/foo/bar")
        .unwrap_err();
    assert!(matches!(
        err,
        TellError::Domain(DomainError::Conflict(Conflict::RepoError))
    ));

    let err = control
        .clear_repo_error(repo_id, "some other error")
        .unwrap_err();
    assert!(matches!(
        err,
        TellError::Domain(DomainError::Conflict(Conflict::ErrorMismatch))
    ));
    control
        .clear_repo_error(repo_id, "freeze failed: status 3: tape offline")
        .unwrap();

    control
        .begin_move_shadow(repo_id, wf(2), "/shadow2/foo/bar")
        .unwrap();
    eventually("move-shadow workflow started", || {
        control.move_shadow(wf(2)).unwrap().state.init.is_some()
    })
    .await;

    cluster.stop().await;
}
