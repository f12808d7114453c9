#![allow(dead_code)]
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    _dir: TempDir,
    pub cfg: PathBuf,
    pub state: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = dir.path().join("config");
        let state = dir.path().join("state");
        std::fs::create_dir_all(&cfg).expect("cfg dir");
        Self { _dir: dir, cfg, state }
    }

    /// Binary wired to the offline demo catalog.
    pub fn bin(&self) -> Command {
        let mut cmd = self.raw();
        cmd.arg("--source").arg("demo");
        cmd
    }

    /// Binary with isolated config/state dirs and no source override.
    pub fn raw(&self) -> Command {
        let mut cmd = Command::cargo_bin("gallerist").unwrap();
        cmd.env("XDG_CONFIG_HOME", &self.cfg);
        cmd.env("XDG_STATE_HOME", &self.state);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn write_settings(&self, body: &str) -> PathBuf {
        let path = self.cfg.join("settings.toml");
        std::fs::write(&path, body).unwrap();
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
