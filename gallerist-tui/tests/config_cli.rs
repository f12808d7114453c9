mod common;
use common::TestEnv;
use predicates::prelude::*;

#[test]
fn defaults_are_printed_without_a_file() {
    let t = TestEnv::new();
    t.raw()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url = \"https://api.artic.edu/api/v1\""))
        .stdout(predicate::str::contains("retries = 1"));
}

#[test]
fn settings_file_and_flag_override() {
    let t = TestEnv::new();
    let path = t.write_settings("[api]\nretries = 4\n\n[tui]\ntick_ms = 50\n");
    t.raw()
        .arg("--config")
        .arg(&path)
        .args(["--api-url", "http://localhost:8080/v1", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retries = 4"))
        .stdout(predicate::str::contains("tick_ms = 50"))
        .stdout(predicate::str::contains("http://localhost:8080/v1"));
}

#[test]
fn settings_are_found_in_xdg_config_dir() {
    let t = TestEnv::new();
    std::fs::create_dir_all(t.cfg.join("gallerist")).unwrap();
    std::fs::write(t.cfg.join("gallerist").join("settings.toml"), "[api]\nbackoff_ms = 777\n").unwrap();
    t.raw()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("backoff_ms = 777"));
}

#[test]
fn help_lists_subcommands() {
    let t = TestEnv::new();
    t.raw()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("select-first"))
        .stdout(predicate::str::contains("page"));
}
