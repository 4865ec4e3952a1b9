//! Integration tests for the `zenac` CLI.
//!
//! These tests spawn the compiled binary and assert on stdout/stderr and exit codes.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn fixture(name: &str) -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

#[test]
fn fails_when_file_missing() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zenac"));
    cmd.arg("check").arg("this-file-does-not-exist.zena");
    cmd.assert().failure().stderr(predicate::str::contains("path not found"));
}

#[test]
fn check_succeeds_on_a_well_typed_module() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zenac"));
    cmd.arg("check").arg(fixture("hello.zena"));
    cmd.assert().success().stdout(predicate::str::contains("Checked:"));
}

#[test]
fn check_fails_on_an_unresolved_identifier() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zenac"));
    cmd.arg("check").arg(fixture("broken.zena"));
    cmd.assert().failure().stderr(predicate::str::contains("undeclared_name"));
}

#[test]
fn build_emits_a_wasm_binary() {
    let temp = assert_fs::TempDir::new().unwrap();
    let out_path = temp.path().join("hello.wasm");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zenac"));
    cmd.arg("build").arg(fixture("hello.zena")).arg("-o").arg(&out_path);
    cmd.assert().success().stdout(predicate::str::contains("WASM generated at:"));

    assert!(out_path.exists());
    let bytes = std::fs::read(&out_path).unwrap();
    assert_eq!(&bytes[0..4], b"\0asm");
}

#[test]
fn shows_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zenac"));
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
