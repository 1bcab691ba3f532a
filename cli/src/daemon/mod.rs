mod cache;
mod client;
mod server;

pub use client::DaemonClient;
pub use server::run_daemon;

use std::fs;
use std::path::PathBuf;

use crate::config::runtime_dir;

const SOCKET_NAME: &str = "battinfo.sock";
const PID_FILE_NAME: &str = "battinfo.pid";

pub fn socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_NAME)
}

pub fn pid_file_path() -> PathBuf {
    runtime_dir().join(PID_FILE_NAME)
}

pub fn is_daemon_running() -> bool {
    DaemonClient::connect().is_ok()
}

/// PID recorded by a backgrounded daemon, if that process is still alive.
pub fn daemon_pid() -> Option<i32> {
    let pid: i32 = fs::read_to_string(pid_file_path())
        .ok()?
        .trim()
        .parse()
        .ok()?;
    process_alive(pid).then_some(pid)
}

fn process_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission checks,
    // no signal is delivered.
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_alive() {
        assert!(process_alive(std::process::id() as i32));
        assert!(!process_alive(0));
        assert!(!process_alive(-1));
    }

    #[test]
    fn test_paths_share_runtime_dir() {
        assert_eq!(socket_path().parent(), pid_file_path().parent());
        assert!(socket_path().ends_with("battinfo/battinfo.sock"));
    }
}
