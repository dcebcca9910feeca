//! Snapshot testing for the compiler driver CLI.
//!
//! These tests capture and compare compiler output snapshots to detect
//! unintended changes in compiler behavior.

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("e2e")
        .join("fixtures")
}

fn snapshots_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("e2e")
        .join("snapshots")
}

fn faxc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_faxc"))
}

fn save_snapshot(name: &str, content: &str) {
    let snapshot_path = snapshots_dir().join(format!("{}.snap", name));
    fs::create_dir_all(snapshots_dir()).expect("create snapshots directory");
    fs::write(snapshot_path, content).expect("write snapshot");
}

fn assert_snapshot(name: &str, actual: &str) {
    let snapshot_path = snapshots_dir().join(format!("{}.snap", name));

    if let Ok(expected) = fs::read_to_string(&snapshot_path) {
        if actual.trim() != expected.trim() {
            if std::env::var("CI").is_ok() {
                panic!("Snapshot mismatch for '{}'. Expected:\n{}\n\nActual:\n{}", name, expected, actual);
            }
            eprintln!("Warning: snapshot '{}' mismatch, updating", name);
            save_snapshot(name, actual);
        }
    } else {
        eprintln!("Info: creating new snapshot '{}'", name);
        save_snapshot(name, actual);
    }
}

#[test]
fn test_cli_help_snapshot() {
    let mut cmd = Command::new(faxc_bin());
    cmd.arg("--help");

    let output = cmd.output().expect("run faxc --help");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_snapshot("cli_help", &stdout);
    assert!(output.status.success(), "help command should succeed");
}

#[test]
fn test_invalid_syntax_error_snapshot() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output_path = temp_dir.path().join("invalid_syntax.o");
    let input_path = fixtures_dir().join("invalid_syntax.cpp");

    let mut cmd = Command::new(faxc_bin());
    cmd.arg(&input_path).arg("-c").arg("-o").arg(&output_path);

    let output = cmd.output().expect("run faxc");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_snapshot("invalid_syntax_error", &stderr);
    assert!(!output.status.success(), "compilation should fail");
}
