//! Integration tests for the scriptbind CLI.
//!
//! These run the built binary and check what it prints.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/scripts")
}

/// The binary with a predictable environment.
fn scriptbind_cmd() -> Command {
    let mut cmd = Command::cargo_bin("scriptbind").unwrap();
    cmd.env_remove("SCRIPTBIND_PATH")
        .env_remove("SCRIPTBIND_MAX_DEPTH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    scriptbind_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("eval"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn run_prints_value_and_binding() {
    scriptbind_cmd()
        .arg("run")
        .arg("best_of_both_worlds")
        .arg("-I")
        .arg(scripts_dir())
        .args(["--arg", "Hello", "--arg", "World"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=> Hello World"))
        .stdout(predicate::str::contains("args = [Hello, World]"))
        .stdout(predicate::str::contains("myArgs = [Hello, World]"))
        .stdout(predicate::str::contains("result = Hello World"));
}

#[test]
fn run_uses_env_search_path() {
    scriptbind_cmd()
        .env("SCRIPTBIND_PATH", scripts_dir())
        .args(["run", "delegate", "--arg", "a", "--arg", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("delegated = true"))
        .stdout(predicate::str::contains("result = a b"));
}

#[test]
fn run_missing_script_reports_resolution_error() {
    let empty = TempDir::new().unwrap();
    scriptbind_cmd()
        .arg("run")
        .arg("nowhere")
        .arg("-I")
        .arg(empty.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: resolution error"))
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn run_without_args_sees_empty_list() {
    scriptbind_cmd()
        .arg("run")
        .arg("best_of_both_worlds")
        .arg("-I")
        .arg(scripts_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("index 0 out of range"));
}

#[test]
fn eval_inline_with_typed_seeds() {
    scriptbind_cmd()
        .args(["eval", "-e", "total = n * 2 + len(xs)", "--set", "n=20", "--set", "xs=[1, 2]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=> 42"))
        .stdout(predicate::str::contains("n = 20"))
        .stdout(predicate::str::contains("xs = [1, 2]"));
}

#[test]
fn eval_file_with_string_seed() {
    scriptbind_cmd()
        .arg("eval")
        .arg(scripts_dir().join("lib/shout.sb"))
        .args(["--set", "result=quiet please"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=> QUIET PLEASE"));
}

#[test]
fn eval_can_run_named_scripts() {
    scriptbind_cmd()
        .args(["eval", "-e", "run('best_of_both_worlds')\nupper(result)"])
        .arg("-I")
        .arg(scripts_dir())
        .args(["--arg", "x", "--arg", "y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=> X Y"));
}

#[test]
fn invalid_seed_name_is_rejected() {
    scriptbind_cmd()
        .args(["eval", "-e", "1", "--set", "9lives=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid variable name"));
}

#[test]
fn script_failure_exits_nonzero() {
    scriptbind_cmd()
        .arg("eval")
        .arg(scripts_dir().join("partial_then_fail.sb"))
        .args(["--arg", "only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("runtime error: gave up after started"));
}

#[test]
fn check_reports_statement_count() {
    scriptbind_cmd()
        .arg("check")
        .arg(scripts_dir().join("best_of_both_worlds.sb"))
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (3 statements)"));
}

#[test]
fn check_reports_syntax_errors() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.sb");
    fs::write(&bad, "x = (1 +\n").unwrap();
    scriptbind_cmd()
        .arg("check")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn bad_max_depth_env_is_a_config_error() {
    scriptbind_cmd()
        .env("SCRIPTBIND_MAX_DEPTH", "lots")
        .args(["eval", "-e", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SCRIPTBIND_MAX_DEPTH"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn max_depth_env_limits_recursion() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("again.sb"), "run('again')").unwrap();
    scriptbind_cmd()
        .env("SCRIPTBIND_MAX_DEPTH", "5")
        .arg("run")
        .arg("again")
        .arg("-I")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("maximum nesting depth 5 exceeded"));
}
