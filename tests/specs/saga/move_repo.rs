//! Moving a repo to a new file location

use crate::prelude::*;
use crate::prelude::assert_eq;
use fso_core::{Conflict, DomainError};
use fso_engine::TellError;

const SHADOW: &str = "/shadow2/foo/bar";

fn target() -> fso_core::Location {
    loc("files2", "/data2/foo/bar")
}

#[tokio::test]
async fn move_repo_updates_repo_and_registry() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control.begin_move_repo(repo_id, wf(1), target()).unwrap();
    eventually("move-repo workflow started", || {
        control.move_repo(wf(1)).unwrap().state.init.is_some()
    })
    .await;

    let started = control.move_repo(wf(1)).unwrap().state;
    let init = started.init.unwrap();
    assert_eq!(init.repo_id, repo_id);
    assert_eq!(init.old_file, loc("files", "/data/foo/bar"));
    assert_eq!(init.new_file, target());

    // Either order
    control.post_move_repo_app_accepted(wf(1)).unwrap();
    control.post_move_repo_stad_released(wf(1)).unwrap();
    control.commit_move_repo(wf(1), SHADOW).unwrap();
    eventually("move-repo workflow exited", || {
        control.move_repo(wf(1)).unwrap().state.is_terminated
    })
    .await;

    let repo = control.repo(repo_id).unwrap().state;
    assert_eq!(repo.file, Some(target()));
    assert_eq!(repo.shadow_path.as_deref(), Some(SHADOW));
    assert_eq!(repo.move_repo, None);
    assert!(repo.is_retired(&wf(1)));

    let registry = control.registry(REGISTRY).unwrap().state;
    let entry = &registry.repos[&repo_id];
    assert_eq!(entry.location, target());
    assert_eq!(entry.moving, None);
    assert!(registry.retired_workflows.contains(&wf(1)));

    cluster.stop().await;
}

#[tokio::test]
async fn commit_waits_for_both_confirmations() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control.begin_move_repo(repo_id, wf(1), target()).unwrap();
    eventually("move-repo workflow started", || {
        control.move_repo(wf(1)).unwrap().state.init.is_some()
    })
    .await;
    control.post_move_repo_stad_released(wf(1)).unwrap();

    let err = control.commit_move_repo(wf(1), SHADOW).unwrap_err();
    assert!(matches!(
        err,
        TellError::Domain(DomainError::Conflict(Conflict::NotYetReleased))
    ));
    assert_eq!(
        control.repo(repo_id).unwrap().state.file,
        Some(loc("files", "/data/foo/bar"))
    );

    cluster.stop().await;
}

#[tokio::test]
async fn second_move_is_rejected_while_one_is_active() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control.begin_move_repo(repo_id, wf(1), target()).unwrap();
    eventually("move begun on the repo", || {
        control.repo(repo_id).unwrap().state.move_repo.is_some()
    })
    .await;

    let err = control
        .begin_move_repo(repo_id, wf(2), loc("files3", "/data3/foo/bar"))
        .unwrap_err();
    assert!(err.is_conflict(), "{}", err);
    let err = control
        .begin_move_shadow(repo_id, wf(3), "/shadow3/foo/bar")
        .unwrap_err();
    assert!(err.is_conflict(), "{}", err);

    cluster.stop().await;
}

#[tokio::test]
async fn finished_workflow_id_cannot_be_reused() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control.begin_move_repo(repo_id, wf(1), target()).unwrap();
    eventually("move-repo workflow started", || {
        control.move_repo(wf(1)).unwrap().state.init.is_some()
    })
    .await;
    control.post_move_repo_stad_released(wf(1)).unwrap();
    control.post_move_repo_app_accepted(wf(1)).unwrap();
    control.commit_move_repo(wf(1), SHADOW).unwrap();
    eventually("move-repo workflow exited", || {
        control.move_repo(wf(1)).unwrap().state.is_terminated
    })
    .await;

    let err = control
        .begin_move_repo(repo_id, wf(1), loc("files", "/data/foo/bar"))
        .unwrap_err();
    assert!(matches!(
        err,
        TellError::Domain(DomainError::Conflict(Conflict::WorkflowReuse(_)))
    ));

    // A fresh id moves it back
    control
        .begin_move_repo(repo_id, wf(2), loc("files", "/data/foo/bar"))
        .unwrap();
    eventually("second move begun", || {
        control.repo(repo_id).unwrap().state.move_repo.is_some()
    })
    .await;

    cluster.stop().await;
}
