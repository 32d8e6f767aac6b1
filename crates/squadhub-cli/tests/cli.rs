//! Binary-level tests for the `squadhub` command.

use assert_cmd::Command;
use predicates::prelude::*;

fn squadhub() -> Command {
    let mut cmd = Command::cargo_bin("squadhub").unwrap();
    cmd.env_remove("SQUADHUB_URL")
        .env_remove("SQUADHUB_TOKEN")
        .env_remove("SQUADHUB_REQUEST_TIMEOUT_MS")
        .env("RUST_LOG", "off");
    cmd
}

fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn help_lists_commands() {
    squadhub()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn unreachable_gateway_exits_with_unavailable_code() {
    squadhub()
        .args(["--url", &refused_url(), "health"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("gateway transport error"));
}

#[test]
fn unsupported_scheme_exits_with_config_code() {
    squadhub()
        .args(["--url", "ftp://example.com", "health"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn invalid_call_params_exit_before_sending() {
    squadhub()
        .args(["--url", &refused_url(), "call", "health", "--params", "[1]"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("params must be a JSON object"));
}
