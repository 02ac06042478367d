//! End-to-end tests for the `tree` and `features` commands.

mod common;

use common::prelude::*;

#[test]
fn test_tree_shows_features_and_tasks() {
    let fixture = TestFixture::new().with_workspace(workspaces::SCIENTIFIC);

    fixture
        .command()
        .args(["tree", "default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default (solve group: main)"))
        .stdout(predicate::str::contains("openblas"))
        .stdout(predicate::str::contains("wheel"));
}

#[test]
fn test_tree_shows_unknown_features() {
    let fixture = TestFixture::new().with_workspace(workspaces::SCIENTIFIC);

    fixture
        .command()
        .args(["tree", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fortran (unknown feature)"))
        .stdout(predicate::str::contains("gpu-windows"));
}

#[test]
fn test_features_summary() {
    let fixture = TestFixture::new().with_workspace(workspaces::SCIENTIFIC);

    fixture
        .command()
        .arg("features")
        .assert()
        .success()
        .stdout(predicate::str::contains("build [*]\n  4 dependencies; tasks: build, wheel\n"))
        .stdout(predicate::str::contains("cuda [linux-64]\n  1 dependencies; requires cuda\n"))
        .stdout(predicate::str::contains("windows [win-64]\n"));
}

#[test]
fn test_features_json_dump() {
    let fixture = TestFixture::new().with_workspace(workspaces::MINIMAL);

    let output = fixture
        .command()
        .args(["features", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["name"], "build");
    assert_eq!(value[0]["tasks"]["build"]["cmd"], "make");
}
