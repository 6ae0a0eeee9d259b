use std::process::Command;

fn xtask(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_xtask"))
        .args(args)
        .output()
        .expect("run xtask")
}

#[test]
fn help_lists_commands() {
    let output = xtask(&["help"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xtask commands"));
    assert!(stderr.contains("conform"));
}

#[test]
fn print_schema_ids_lists_report_and_config() {
    let output = xtask(&["print-schema-ids"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("clusterguard.report.v1"));
    assert!(stdout.contains("clusterguard.config.v1"));
}

#[test]
fn golden_reports_conform() {
    let output = xtask(&["conform"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn unknown_command_fails() {
    assert!(!xtask(&["nope"]).status.success());
}
