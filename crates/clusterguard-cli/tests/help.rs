use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn clusterguard_cmd() -> Command {
    Command::cargo_bin("clusterguard").expect("clusterguard binary not found")
}

#[test]
fn help_works() {
    clusterguard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("policies"))
        .stdout(predicate::str::contains("annotations"));
}

#[test]
fn check_help_lists_input_flag() {
    clusterguard_cmd()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--input"))
        .stdout(predicate::str::contains("--report-out"));
}

#[test]
fn check_requires_input() {
    clusterguard_cmd()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}
