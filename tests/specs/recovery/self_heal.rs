//! Dropped notifications are recovered by the periodic rescan

use crate::prelude::*;
use fso_engine::ProcessorConfig;
use std::time::Duration;

#[tokio::test]
async fn concurrent_moves_complete_with_tiny_queues() {
    let config = ProcessorConfig {
        notify_capacity: 1,
        rescan_interval: Duration::from_millis(50),
        ..ProcessorConfig::for_testing()
    };
    let cluster = Cluster::start(mem_journals(), config).with_registry().await;
    let control = &cluster.control;

    let paths: Vec<String> = (0..8).map(|i| format!("/foo/r{}", i)).collect();
    let mut repos = Vec::new();
    for path in &paths {
        repos.push(cluster.repo(path).await);
    }

    for (n, repo_id) in repos.iter().enumerate() {
        let workflow_id = wf(100 + n as u128);
        control
            .begin_move_shadow(*repo_id, workflow_id, &format!("/moved{}", paths[n]))
            .unwrap();
    }
    for n in 0..repos.len() {
        let workflow_id = wf(100 + n as u128);
        eventually("move-shadow workflow started", || {
            control.move_shadow(workflow_id).unwrap().state.init.is_some()
        })
        .await;
        control.post_move_shadow_stad_disabled(workflow_id).unwrap();
        control.commit_move_shadow(workflow_id).unwrap();
    }

    eventually("every move-shadow finished", || {
        repos.iter().enumerate().all(|(n, repo_id)| {
            let repo = control.repo(*repo_id).unwrap().state;
            repo.move_shadow.is_none()
                && repo.shadow_path.as_deref() == Some(format!("/moved{}", paths[n]).as_str())
        })
    })
    .await;

    cluster.stop().await;
}

#[tokio::test]
async fn registry_created_while_processors_were_down_is_initialized() {
    let journals = mem_journals();
    let offline = control_over(journals.clone());
    offline.init_registry(REGISTRY).unwrap();
    offline.init_registry("barReg").unwrap();

    let cluster = Cluster::start(journals, ProcessorConfig::for_testing());
    let control = &cluster.control;
    eventually("registries confirmed", || {
        let main = control.main().unwrap().state;
        let done = main.pending_registries().next().is_none();
        done
    })
    .await;
    assert!(control.registry(REGISTRY).unwrap().exists());
    assert!(control.registry("barReg").unwrap().exists());

    cluster.stop().await;
}
