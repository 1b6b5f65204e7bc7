use assert_cmd::Command;

#[test]
fn help_succeeds() {
    Command::cargo_bin("tbreak")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn version_succeeds() {
    Command::cargo_bin("tbreak")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

#[test]
fn refuses_to_run_without_a_tty() {
    // Test harness stdin is never a tty, so the binary must bail out
    // with a usage error instead of taking over the (nonexistent) screen.
    Command::cargo_bin("tbreak")
        .unwrap()
        .arg("--once")
        .assert()
        .failure();
}

#[test]
fn rejects_unknown_flags() {
    Command::cargo_bin("tbreak")
        .unwrap()
        .arg("--definitely-not-a-flag")
        .assert()
        .failure();
}
