//! Moving the shadow copy of a repo

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn move_shadow_updates_shadow_path() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control
        .begin_move_shadow(repo_id, wf(1), "/shadow2/foo/bar")
        .unwrap();
    eventually("move-shadow workflow started", || {
        control.move_shadow(wf(1)).unwrap().state.init.is_some()
    })
    .await;

    let init = control.move_shadow(wf(1)).unwrap().state.init.unwrap();
    assert_eq!(init.repo_id, repo_id);
    assert_eq!(init.old_shadow_path, "/shadow/foo/bar");
    assert_eq!(init.new_shadow_path, "/shadow2/foo/bar");

    control.post_move_shadow_stad_disabled(wf(1)).unwrap();
    control.commit_move_shadow(wf(1)).unwrap();
    eventually("move-shadow workflow exited", || {
        control.move_shadow(wf(1)).unwrap().state.is_terminated
    })
    .await;

    let repo = control.repo(repo_id).unwrap().state;
    assert_eq!(repo.shadow_path.as_deref(), Some("/shadow2/foo/bar"));
    assert_eq!(repo.move_shadow, None);
    assert_eq!(repo.file, Some(loc("files", "/data/foo/bar")));
    assert_eq!(workflow_events(&cluster.journals(), wf(1)), 4);

    cluster.stop().await;
}

#[tokio::test]
async fn move_shadow_requires_a_shadow() {
    let cluster = Cluster::in_memory().with_registry().await;
    let control = &cluster.control;
    let repo_id = control
        .init_repo(REGISTRY, "/foo/bare", creator())
        .unwrap();
    eventually("repo created", || control.repo(repo_id).unwrap().exists()).await;

    let err = control
        .begin_move_shadow(repo_id, wf(1), "/shadow2/foo/bare")
        .unwrap_err();
    assert!(err.is_conflict(), "{}", err);
    assert!(!control.move_shadow(wf(1)).unwrap().exists());

    cluster.stop().await;
}

#[tokio::test]
async fn move_shadow_is_allowed_on_frozen_repos() {
    let cluster = Cluster::in_memory().with_registry().await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;

    control
        .begin_tier(repo_id, fso_core::TierOp::Freeze, wf(10))
        .unwrap();
    control
        .commit_tier(repo_id, fso_core::TierOp::Freeze, wf(10), None)
        .unwrap();

    control
        .begin_move_shadow(repo_id, wf(1), "/shadow2/foo/bar")
        .unwrap();
    eventually("move-shadow workflow started", || {
        control.move_shadow(wf(1)).unwrap().state.init.is_some()
    })
    .await;

    cluster.stop().await;
}
