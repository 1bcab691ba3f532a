use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

use crate::util::Sandbox;

fn json_output(output: std::process::Output) -> Value {
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_units() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("two_batteries", &["units"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_info_all_units_json() {
    let sandbox = Sandbox::new();
    let info = json_output(
        sandbox
            .with_fixture("two_batteries", &["info", "--json"])
            .output()
            .unwrap(),
    );

    assert_eq!(info["cap"], 45);
    assert_eq!(info["min"], 243);
    assert_eq!(info["rate"], 2000);
    assert_eq!(info["state"], 1);
}

#[test]
fn test_info_single_unit_json() {
    let sandbox = Sandbox::new();
    let info = json_output(
        sandbox
            .with_fixture("two_batteries", &["info", "-u", "1", "--json"])
            .output()
            .unwrap(),
    );

    assert_eq!(info["cap"], 80);
    assert_eq!(info["min"], 240);
    assert_eq!(info["rate"], 2000);
}

#[test]
fn test_default_command_prints_info() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("two_batteries", &[])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Battery (all units): Discharging"))
        .stdout(predicate::str::contains("Capacity:  45%"));
}

#[test]
fn test_charging_has_no_remaining_time() {
    let sandbox = Sandbox::new();
    let info = json_output(
        sandbox
            .with_fixture("charging", &["info", "--json"])
            .output()
            .unwrap(),
    );

    assert_eq!(info["cap"], 80);
    assert_eq!(info["min"], -1);
    assert_eq!(info["state"], 2);
}

#[test]
fn test_absent_and_invalid_units_are_skipped() {
    let sandbox = Sandbox::new();
    let info = json_output(
        sandbox
            .with_fixture("mixed", &["info", "--json"])
            .output()
            .unwrap(),
    );

    assert_eq!(info["cap"], 60);
    assert_eq!(info["min"], 180);
    assert_eq!(info["rate"], 1000);

    let invalid = json_output(
        sandbox
            .with_fixture("mixed", &["info", "-u", "2", "--json"])
            .output()
            .unwrap(),
    );
    assert_eq!(invalid["state"], 7);
    assert_eq!(invalid["cap"], -1);
    assert_eq!(invalid["min"], -1);
    assert_eq!(invalid["rate"], 500);
}

#[test]
fn test_no_batteries_reads_not_present() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("empty", &["info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not Present"));

    sandbox
        .with_fixture("empty", &["units"])
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_raw_status_without_batteries_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("empty", &["raw-status", "-u", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no battery devices"));
}

#[test]
fn test_unknown_unit_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("two_batteries", &["info", "-u", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such battery"));
}

#[test]
fn test_vanished_device_fails_the_query() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("vanished", &["info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BAT1 disappeared"));
}

#[test]
fn test_raw_status() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("two_batteries", &["raw-status", "-u", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("BAT1\n"))
        .stdout(predicate::str::contains("rate:  2000"))
        .stdout(predicate::str::contains("valid: yes"));
}

#[test]
fn test_raw_info_json() {
    let sandbox = Sandbox::new();
    let info = json_output(
        sandbox
            .with_fixture("two_batteries", &["raw-info", "-u", "1", "--json"])
            .output()
            .unwrap(),
    );

    assert_eq!(info["device"], "BAT1");
    assert_eq!(info["lfcap"], 10000);
    assert_eq!(info["dcap"], 11000);
    assert_eq!(info["model"], "5B10W13930");
    assert_eq!(info["chemistry"], "Li-ion");
    assert_eq!(info["valid"], true);
}

#[test]
fn test_counters() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("two_batteries", &["counters"])
        .assert()
        .success()
        .stdout(predicate::str::contains("battery.life: 45\n"))
        .stdout(predicate::str::contains("battery.time: 243\n"))
        .stdout(predicate::str::contains("battery.units: 2\n"))
        .stdout(predicate::str::contains("battery.info_expire: 5\n"));
}

#[test]
fn test_single_counter_by_name() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("two_batteries", &["counters", "life"])
        .assert()
        .success()
        .stdout("45\n");

    sandbox
        .with_fixture("two_batteries", &["sysctl", "battery.units"])
        .assert()
        .success()
        .stdout("2\n");

    sandbox
        .with_fixture("two_batteries", &["counters", "voltage"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument"));
}

#[test]
fn test_pipe_emits_requested_samples() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .with_fixture("two_batteries", &["pipe", "-s", "2", "-i", "10", "-c"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let doc: Value = serde_json::from_str(line).unwrap();
        assert_eq!(doc["battery"]["life"], 45);
    }
}

#[test]
fn test_debug_reports_validity() {
    let sandbox = Sandbox::new();
    sandbox
        .with_fixture("mixed", &["debug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active: memory"))
        .stdout(predicate::str::contains("[2] BAT2"))
        .stdout(predicate::str::contains("invalid"));
}

#[test]
fn test_missing_fixture_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .command(&["units", "--fixture"])
        .arg(sandbox.path().join("missing.toml"))
        .assert()
        .failure();
}
