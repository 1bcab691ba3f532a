use std::fs;

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::Sandbox;

#[test]
fn test_config_path() {
    let sandbox = Sandbox::new();
    let expected = sandbox.config_home().join("battinfo").join("config.toml");
    sandbox
        .command(&["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", expected.display())));
}

#[test]
fn test_config_reset_writes_defaults() {
    let sandbox = Sandbox::new();
    sandbox
        .command(&["config", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config reset to defaults"));

    let written =
        fs::read_to_string(sandbox.config_home().join("battinfo").join("config.toml")).unwrap();
    assert!(written.contains("info_expire_secs = 5"));
    assert!(written.contains("[daemon]"));
}

#[test]
fn test_config_file_sets_info_expire() {
    let sandbox = Sandbox::new();
    let dir = sandbox.config_home().join("battinfo");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "info_expire_secs = 30\n").unwrap();

    sandbox
        .with_fixture("charging", &["counters"])
        .assert()
        .success()
        .stdout(predicate::str::contains("battery.info_expire: 30\n"));
}

#[test]
fn test_malformed_config_uses_defaults() {
    let sandbox = Sandbox::new();
    let dir = sandbox.config_home().join("battinfo");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "info_expire_secs = \"soon\"\n").unwrap();

    sandbox
        .with_fixture("charging", &["counters"])
        .assert()
        .success()
        .stdout(predicate::str::contains("battery.info_expire: 5\n"));
}
