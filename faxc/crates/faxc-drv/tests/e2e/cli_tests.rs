//! CLI Interface E2E Tests
//!
//! These tests verify the CLI interface of the compiler driver binary,
//! testing help output, version, compile options, and verbose mode.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("e2e")
        .join("fixtures")
}

fn faxc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_faxc"))
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(faxc_bin());
    cmd.arg("--help");

    cmd.assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(faxc_bin());
    cmd.arg("--version");

    cmd.assert().success().stdout(predicate::str::contains("faxc"));
}

/// Object emission is the furthest stage the driver actually writes a
/// linked-artifact-shaped file for (the linker is a stub), so CLI smoke
/// tests check `-c` output rather than a final executable.
#[test]
fn test_cli_compile_to_object() {
    let temp_dir = TempDir::new().expect("temp dir");
    let output_path = temp_dir.path().join("hello_world.o");
    let input_path = fixtures_dir().join("hello_world.cpp");

    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("-c").arg("-o").arg(&output_path);

    cmd.assert().success();
    assert!(output_path.exists(), "object file should exist");
}

#[test]
fn test_cli_compile_custom_output_path() {
    let temp_dir = TempDir::new().expect("temp dir");
    let custom_output = temp_dir.path().join("custom_bin").join("arithmetic.o");
    let input_path = fixtures_dir().join("arithmetic.cpp");

    std::fs::create_dir_all(custom_output.parent().unwrap()).expect("create output dir");

    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("-c").arg("-o").arg(&custom_output);

    cmd.assert().success();
    assert!(custom_output.exists(), "object file should exist at custom path");
}

#[test]
fn test_cli_verbose() {
    let temp_dir = TempDir::new().expect("temp dir");
    let output_path = temp_dir.path().join("verbose.o");
    let input_path = fixtures_dir().join("hello_world.cpp");

    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("-c").arg("-o").arg(&output_path).arg("--verbose");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Lexing").and(predicate::str::contains("Parsing")));
}

#[test]
fn test_cli_missing_file_fails() {
    let mut cmd = Command::new(faxc_bin());
    cmd.arg("/nonexistent/path/to/file.cpp");

    cmd.assert().failure().stderr(predicate::str::contains("error"));
}

#[test]
fn test_cli_unknown_flag_fails() {
    let input_path = fixtures_dir().join("hello_world.cpp");
    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("--not-a-real-flag");

    cmd.assert().failure().stderr(predicate::str::contains("error"));
}
