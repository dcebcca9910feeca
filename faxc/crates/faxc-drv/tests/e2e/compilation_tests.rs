//! Compilation Pipeline E2E Tests
//!
//! These tests verify the full compilation pipeline from C++ source to a
//! relocatable object file (`-c`), since the linker the driver shells out
//! to is currently a stub and never produces a real linked executable.

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

fn assert_compiles_to_object(fixture: &str) {
    let temp_dir = TempDir::new().expect("temp dir");
    let output_path = temp_dir.path().join(format!("{fixture}.o"));
    let input_path = fixtures_dir().join(format!("{fixture}.cpp"));

    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("-c").arg("-o").arg(&output_path);

    cmd.assert().success();
    assert!(output_path.exists(), "{fixture}: object file should exist");
    let bytes = std::fs::read(&output_path).expect("read object file");
    assert!(!bytes.is_empty(), "{fixture}: object file should not be empty");
}

#[test]
fn test_hello_world_compilation() {
    assert_compiles_to_object("hello_world");
}

#[test]
fn test_arithmetic_operations() {
    assert_compiles_to_object("arithmetic");
}

#[test]
fn test_control_flow() {
    assert_compiles_to_object("control_flow");
}

#[test]
fn test_functions_compilation() {
    assert_compiles_to_object("functions");
}

#[test]
fn test_variables_compilation() {
    assert_compiles_to_object("variables");
}

#[test]
fn test_loops_compilation() {
    assert_compiles_to_object("loops");
}

#[test]
fn test_invalid_syntax() {
    let temp_dir = TempDir::new().expect("temp dir");
    let output_path = temp_dir.path().join("invalid_syntax.o");
    let input_path = fixtures_dir().join("invalid_syntax.cpp");

    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("-c").arg("-o").arg(&output_path);

    cmd.assert().failure().stderr(predicate::str::contains("error"));
    assert!(!output_path.exists(), "object file should not exist for invalid syntax");
}

#[test]
fn test_file_not_found_error() {
    let mut cmd = Command::new(faxc_bin());
    cmd.arg("/nonexistent/path/to/file.cpp");

    cmd.assert().failure().stderr(predicate::str::contains("error"));
}
