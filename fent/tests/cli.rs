//! End-to-end CLI tests: run the compiled `fent` binary against real
//! scripts written to a temp directory and assert on its output,
//! exit code, and stderr (grounded on faxc-drv's `tests/e2e/cli_tests.rs`).

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fent_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fent"))
}

fn write_script(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).expect("failed to write fixture script");
    path
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(fent_bin());
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage").or(predicate::str::contains("fen")));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(fent_bin());
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fent").or(predicate::str::contains("0.")));
}

#[test]
fn test_cli_run_file_prints_output() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(&dir, "hello.fen", "print \"hello fen\";\n");

    let mut cmd = Command::new(fent_bin());
    cmd.arg(&script);

    cmd.assert().success().stdout(predicate::str::contains("hello fen"));
}

#[test]
fn test_cli_run_file_arithmetic() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(&dir, "math.fen", "print 1 + 2 * 3;\n");

    let mut cmd = Command::new(fent_bin());
    cmd.arg(&script);

    cmd.assert().success().stdout(predicate::str::contains("7"));
}

#[test]
fn test_cli_compile_error_exit_code() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(&dir, "bad.fen", "var;\n");

    let mut cmd = Command::new(fent_bin());
    cmd.arg(&script);

    cmd.assert().failure().code(65);
}

#[test]
fn test_cli_runtime_error_exit_code() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(&dir, "crash.fen", "print 1 + \"x\";\n");

    let mut cmd = Command::new(fent_bin());
    cmd.arg(&script);

    cmd.assert().failure().code(70);
}

#[test]
fn test_cli_missing_file_reports_io_error() {
    let mut cmd = Command::new(fent_bin());
    cmd.arg("/no/such/script.fen");

    cmd.assert().failure().code(74);
}

#[test]
fn test_cli_unknown_flag_exit_code() {
    let mut cmd = Command::new(fent_bin());
    cmd.arg("--not-a-real-flag");

    cmd.assert().failure().code(64);
}

#[test]
fn test_cli_dump_bytecode_writes_to_stderr() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(&dir, "dump.fen", "print 1;\n");

    let mut cmd = Command::new(fent_bin());
    cmd.arg("--dump-bytecode").arg(&script);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1"))
        .stderr(predicate::str::contains("OP_CONSTANT"));
}

#[test]
fn test_cli_stress_gc_does_not_change_output() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(
        &dir,
        "stress.fen",
        "class Tree {}\nvar t = Tree();\nprint \"ok\" + \"!\";\n",
    );

    let mut cmd = Command::new(fent_bin());
    cmd.arg("--stress-gc").arg(&script);

    cmd.assert().success().stdout(predicate::str::contains("ok!"));
}

#[test]
fn test_cli_closures_and_classes() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = write_script(
        &dir,
        "counter.fen",
        r#"
        fun makeCounter() {
            var count = 0;
            fun increment() {
                count = count + 1;
                return count;
            }
            return increment;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        "#,
    );

    let mut cmd = Command::new(fent_bin());
    cmd.arg(&script);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1").and(predicate::str::contains("2")));
}
