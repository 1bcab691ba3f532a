use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub const BATTINFO_EXE_PATH: &str = env!("CARGO_BIN_EXE_battinfo");

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.toml", name))
}

/// Isolated config and runtime directories for one test.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config_home(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.dir.path().join("runtime")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(BATTINFO_EXE_PATH);
        cmd.env("XDG_CONFIG_HOME", self.config_home())
            .env("XDG_RUNTIME_DIR", self.runtime_dir())
            .env_remove("RUST_LOG")
            .args(args);
        cmd
    }

    /// Command reading batteries from the named fixture.
    pub fn with_fixture(&self, name: &str, args: &[&str]) -> Command {
        let mut cmd = self.command(args);
        cmd.arg("--fixture").arg(fixture(name));
        cmd
    }
}
