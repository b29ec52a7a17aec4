//! End-to-end tests for the bscript binary

use assert_cmd::Command;
use predicates::prelude::*;

fn bscript() -> Command {
    Command::cargo_bin("bscript").unwrap()
}

#[test]
fn inline_script_surfaces_ordinary_lines() {
    bscript()
        .args(["-c", "setProperty who=world\nhello ${who}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn print_output_and_surfaced_lines_share_stdout() {
    bscript()
        .args(["-c", "print first\\n\nsecond"])
        .assert()
        .success()
        .stdout(predicate::str::contains("first"))
        .stdout(predicate::str::contains("second"));
}

#[test]
fn script_file_runs() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("run.bs");
    std::fs::write(&path, "# comment\ndo something\n").unwrap();
    bscript()
        .arg(path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("do something"));
}

#[test]
fn classify_mode_labels_lines() {
    bscript()
        .args(["--classify", "-c", "foreach\nstep\nend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foreach"))
        .stdout(predicate::str::contains("ordinary"))
        .stdout(predicate::str::contains("end"));
}

#[test]
fn missing_script_file_fails_with_diagnostic() {
    bscript()
        .arg("/no/such/script.bs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn undefined_macro_reference_fails() {
    bscript()
        .args(["-c", "use ${nope}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined reference"));
}

#[test]
fn no_arguments_is_a_usage_error() {
    bscript()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no script given"));
}

#[test]
fn help_and_version() {
    bscript()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("USAGE"));
    bscript()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bscript"));
}
