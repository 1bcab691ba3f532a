use std::process::{Child, Stdio};
use std::thread;
use std::time::Duration;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

use crate::util::Sandbox;

struct ForegroundDaemon {
    child: Child,
}

impl ForegroundDaemon {
    fn start(sandbox: &Sandbox, fixture: &str) -> Self {
        let child = sandbox
            .with_fixture(fixture, &["daemon", "start", "--foreground", "--log-level", "off"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let socket = sandbox.runtime_dir().join("battinfo").join("battinfo.sock");
        for _ in 0..100 {
            if socket.exists() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        assert!(socket.exists(), "daemon did not create {:?}", socket);

        Self { child }
    }
}

impl Drop for ForegroundDaemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn test_remote_queries_through_daemon() {
    let sandbox = Sandbox::new();
    let mut daemon = ForegroundDaemon::start(&sandbox, "two_batteries");

    sandbox
        .command(&["--remote", "units"])
        .assert()
        .success()
        .stdout("2\n");

    let output = sandbox
        .command(&["--remote", "info", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let info: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["cap"], 45);
    assert_eq!(info["min"], 243);

    sandbox
        .command(&["--remote", "raw-info", "-u", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NoSuchDevice"));

    sandbox
        .command(&["daemon", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running:      yes"))
        .stdout(predicate::str::contains("Source:       memory"));

    sandbox
        .command(&["daemon", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daemon stopped."));

    assert!(daemon.child.wait().unwrap().success());
}

#[test]
fn test_remote_without_daemon_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .command(&["--remote", "units"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot reach the daemon"));

    sandbox
        .command(&["daemon", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running:      no"));
}
