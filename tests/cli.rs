//! Process-level tests against the compiled binary.

use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_lifelog-mcp");

/// Run the binary in an empty directory so no local config file is picked up.
fn run(args: &[&str], env: &[(&str, &str)]) -> Output {
    let work_dir = TempDir::new().unwrap();
    let mut cmd = Command::new(BIN);
    cmd.args(args)
        .current_dir(work_dir.path())
        .env_remove("LIMITLESS_API_KEY")
        .env_remove("LIMITLESS_API_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .stdin(Stdio::null());
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("binary should run")
}

#[test]
fn test_missing_api_key_exits_nonzero() {
    let output = run(&["server"], &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("LIMITLESS_API_KEY"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_mode_prints_usage() {
    let output = run(&[], &[("LIMITLESS_API_KEY", "k")]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_invalid_mode_prints_usage() {
    let output = run(&["daemon"], &[("LIMITLESS_API_KEY", "k")]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_server_mode_exits_cleanly_on_closed_stdin() {
    let output = run(&["server"], &[("LIMITLESS_API_KEY", "k")]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_client_mode_spawns_server_and_prints_result() {
    let api = MockServer::start();
    let mock = api.mock(|when, then| {
        when.method(GET)
            .path("/v1/lifelogs")
            .header("x-api-key", "k")
            .query_param("direction", "desc");
        then.status(200)
            .json_body(json!({ "data": { "lifelogs": [{ "id": "log-1" }] } }));
    });

    let output = run(
        &["client"],
        &[("LIMITLESS_API_KEY", "k"), ("LIMITLESS_API_URL", &api.base_url())],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("getLifelogs"));
    assert!(stdout.contains("log-1"));
    mock.assert();
}

#[test]
fn test_interactive_mode_exits_on_eof() {
    let output = run(&["interactive"], &[("LIMITLESS_API_KEY", "k")]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Goodbye."));
}
