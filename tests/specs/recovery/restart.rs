//! Processors resume sagas left unfinished by a previous run

use crate::prelude::*;
use crate::prelude::assert_eq;
use fso_engine::ProcessorConfig;

#[tokio::test]
async fn saga_finishes_after_restart() {
    let journals = mem_journals();
    let cluster = Cluster::start(journals.clone(), ProcessorConfig::for_testing())
        .with_registry()
        .await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;
    control
        .begin_move_repo(repo_id, wf(1), loc("files2", "/data2/foo/bar"))
        .unwrap();
    eventually("move-repo workflow started", || {
        control.move_repo(wf(1)).unwrap().state.init.is_some()
    })
    .await;
    cluster.stop().await;

    // Progress reported while no processor runs
    let offline = control_over(journals.clone());
    offline.post_move_repo_stad_released(wf(1)).unwrap();
    offline.post_move_repo_app_accepted(wf(1)).unwrap();
    offline.commit_move_repo(wf(1), "/shadow2/foo/bar").unwrap();
    assert!(offline.repo(repo_id).unwrap().state.move_repo.is_some());

    let cluster = Cluster::start(journals.clone(), ProcessorConfig::for_testing());
    let control = &cluster.control;
    eventually("move-repo workflow exited", || {
        control.move_repo(wf(1)).unwrap().state.is_terminated
    })
    .await;

    let repo = control.repo(repo_id).unwrap().state;
    assert_eq!(repo.file, Some(loc("files2", "/data2/foo/bar")));
    let registry = control.registry(REGISTRY).unwrap().state;
    assert_eq!(registry.repos[&repo_id].location, loc("files2", "/data2/foo/bar"));
    // init, released, accepted, committed, exited
    assert_eq!(workflow_events(&journals, wf(1)), 5);

    cluster.stop().await;
}

#[tokio::test]
async fn restart_of_a_settled_fleet_appends_nothing() {
    let journals = mem_journals();
    let cluster = Cluster::start(journals.clone(), ProcessorConfig::for_testing())
        .with_registry()
        .await;
    let repo_id = cluster.repo("/foo/bar").await;
    let control = &cluster.control;
    control
        .begin_move_shadow(repo_id, wf(1), "/shadow2/foo/bar")
        .unwrap();
    eventually("move-shadow workflow started", || {
        control.move_shadow(wf(1)).unwrap().state.init.is_some()
    })
    .await;
    control.post_move_shadow_stad_disabled(wf(1)).unwrap();
    control.commit_move_shadow(wf(1)).unwrap();
    eventually("move-shadow workflow exited", || {
        control.move_shadow(wf(1)).unwrap().state.is_terminated
    })
    .await;
    let main_id = control.aggregates().main_id;
    cluster.stop().await;

    let before = (
        journals.main.tail(main_id).unwrap(),
        journals.repo.tail(repo_id).unwrap(),
        journals.workflow.tail(wf(1)).unwrap(),
    );

    let cluster = Cluster::start(journals.clone(), ProcessorConfig::for_testing());
    // Give every processor a few passes
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    cluster.stop().await;

    let after = (
        journals.main.tail(main_id).unwrap(),
        journals.repo.tail(repo_id).unwrap(),
        journals.workflow.tail(wf(1)).unwrap(),
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn file_journals_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let cluster = Cluster::start(file_journals(dir.path()), ProcessorConfig::for_testing())
        .with_registry()
        .await;
    let repo_id = cluster.repo("/foo/bar").await;
    cluster
        .control
        .begin_move_shadow(repo_id, wf(1), "/shadow2/foo/bar")
        .unwrap();
    let control = &cluster.control;
    eventually("move-shadow workflow started", || {
        control.move_shadow(wf(1)).unwrap().state.init.is_some()
    })
    .await;
    cluster.stop().await;

    let cluster = Cluster::start(file_journals(dir.path()), ProcessorConfig::for_testing());
    let control = &cluster.control;
    let registry = control.registry(REGISTRY).unwrap().state;
    assert!(registry.repos[&repo_id].confirmed);
    assert_eq!(
        control.repo(repo_id).unwrap().state.shadow_path.as_deref(),
        Some("/shadow/foo/bar")
    );

    control.post_move_shadow_stad_disabled(wf(1)).unwrap();
    control.commit_move_shadow(wf(1)).unwrap();
    eventually("move-shadow workflow exited", || {
        control.move_shadow(wf(1)).unwrap().state.is_terminated
    })
    .await;
    assert_eq!(
        control.repo(repo_id).unwrap().state.shadow_path.as_deref(),
        Some("/shadow2/foo/bar")
    );

    cluster.stop().await;
}
