// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;

#[test]
fn check_prints_effective_config() {
    let output = Command::cargo_bin("fsod")
        .unwrap()
        .args(["--check", "--data-dir", "/srv/fso", "--main-name", "fleet"])
        .env_remove("FSOD_CONFIG")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("data_dir = \"/srv/fso\""));
    assert!(text.contains("main_name = \"fleet\""));
    assert!(text.contains("[processors]"));
}

#[test]
fn check_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsod.toml");
    fs::write(&path, "main_name = \"fromfile\"\n[processors]\ninit_strategy = \"events\"\n").unwrap();

    let output = Command::cargo_bin("fsod")
        .unwrap()
        .arg("--check")
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("main_name = \"fromfile\""));
    assert!(text.contains("init_strategy = \"events\""));
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsod.toml");
    fs::write(&path, "no_such_setting = 1\n").unwrap();

    Command::cargo_bin("fsod")
        .unwrap()
        .arg("--check")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure();
}
