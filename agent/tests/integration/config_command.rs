//! Integration tests for `pma check-config` and config loading.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VALID: &str = r#"
host_id: "6f2b3c1e-0000-4000-8000-000000000001"
rps_address: "rps.example:443"
device_manager:
  url: "https://dm.example:443"
  access_token_path: /etc/pma/access_token
  tls:
    ca_cert: /etc/pma/ca.crt
    client_cert: /etc/pma/client.crt
    client_key: /etc/pma/client.key
"#;

fn pma() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pma"));
    cmd.env_remove("PMA_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write_config(body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, body).expect("write config");
    (dir, path)
}

#[test]
fn test_check_config_valid_prints_summary() {
    let (_dir, path) = write_config(VALID);
    pma()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("wss://rps.example:443/activate"))
        .stdout(predicate::str::contains("mutual"));
}

#[test]
fn test_check_config_reads_path_from_env() {
    let (_dir, path) = write_config(VALID);
    pma()
        .env("PMA_CONFIG", &path)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("6f2b3c1e-0000-4000-8000-000000000001"));
}

#[test]
fn test_check_config_rejects_rps_address_with_scheme() {
    let (_dir, path) = write_config(&VALID.replace("rps.example:443", "wss://rps.example"));
    pma()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid rps_address"));
}

#[test]
fn test_check_config_rejects_heartbeat_shorter_than_activation() {
    let (_dir, path) = write_config(&format!("heartbeat_interval_secs: 10\n{VALID}"));
    pma()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tool.activation_timeout_secs"))
        .stderr(predicate::str::contains("heartbeat_interval_secs (10s)"));
}

#[test]
fn test_check_config_rejects_plaintext_with_tls() {
    let (_dir, path) = write_config(&VALID.replace("https://", "http://"));
    pma()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tls.enabled"));
}

#[test]
fn test_check_config_rejects_malformed_yaml() {
    let (_dir, path) = write_config("host_id: [unterminated\n");
    pma()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot parse"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    pma()
        .args(["--config", "/nonexistent/pma/config.yaml", "check-config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/pma/config.yaml"));
}

#[test]
fn test_check_config_never_prints_secrets_content() {
    let dir = TempDir::new().expect("tempdir");
    let token = dir.path().join("token");
    std::fs::write(&token, "super-secret-jwt").expect("write token");
    let body = VALID.replace("/etc/pma/access_token", &token.display().to_string());
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, body).expect("write config");

    pma()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret-jwt").not());
}

#[test]
fn test_amtinfo_with_missing_tool_fails() {
    let (_dir, path) =
        write_config(&format!("{VALID}tool:\n  binary: /nonexistent/rpc\n"));
    pma()
        .arg("--config")
        .arg(&path)
        .args(["amtinfo", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("running amtinfo"));
}
