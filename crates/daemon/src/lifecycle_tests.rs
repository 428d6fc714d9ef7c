// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fso_core::Creator;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    Config {
        data_dir: dir.path().join("data"),
        processors: ProcessorConfig::for_testing(),
        ..Config::default()
    }
}

#[tokio::test]
async fn startup_creates_layout_and_main() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let daemon = startup(&config).await.unwrap();

    assert!(config.lock_path().exists());
    for name in ["main", "registry", "repo", "workflow"] {
        assert!(config.journal_dir(name).is_dir(), "{} journal missing", name);
    }
    let main = daemon.control.main().unwrap();
    assert_eq!(main.state.name.as_deref(), Some("main"));
    daemon.shutdown().await;
}

#[tokio::test]
async fn second_daemon_is_locked_out() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let daemon = startup(&config).await.unwrap();

    let err = match startup(&config).await {
        Ok(_) => panic!("second daemon started"),
        Err(e) => e,
    };
    assert!(matches!(err, LifecycleError::LockFailed(..)));
    daemon.shutdown().await;
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let daemon = startup(&config).await.unwrap();
    daemon.control.init_registry("fooReg").unwrap();
    let before = daemon.control.main().unwrap();
    daemon.shutdown().await;

    let daemon = startup(&config).await.unwrap();
    let after = daemon.control.main().unwrap();
    assert_eq!(after.state.registries.len(), 1);
    assert!(after.vid >= before.vid);
    daemon.shutdown().await;
}

#[tokio::test]
async fn processors_run_inside_daemon() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let daemon = startup(&config).await.unwrap();
    let control = daemon.control.clone();

    control.init_registry("fooReg").unwrap();
    wait_until(|| control.registry("fooReg").unwrap().exists()).await;
    control.add_root("fooReg", "/foo", "files", "/data/foo").unwrap();
    let repo_id = control
        .init_repo("fooReg", "/foo/1", Creator::new("A. U. Thor", "author@example.com"))
        .unwrap();
    wait_until(|| control.repo(repo_id).unwrap().exists()).await;

    daemon.shutdown().await;
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
