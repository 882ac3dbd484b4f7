//! End-to-end tests for the `grommet` binary.

use std::process::{Command, Output};

use grommet::json::decode;
use tempfile::TempDir;

fn run_grommet(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grommet"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute grommet binary")
}

#[test]
fn capabilities_prints_the_default_advertisement() {
    let output = run_grommet(&["capabilities"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let capabilities = decode(stdout.trim());
    assert_eq!(capabilities["window"]["workDoneProgress"].as_bool(), Some(true));
    assert_eq!(
        capabilities["general"]["positionEncodings"][0].as_str(),
        Some("utf-16")
    );
}

#[test]
fn capabilities_honours_the_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("grommet.yaml");
    std::fs::write(
        &config,
        "capabilities:\n  window: {}\n  experimental:\n    colorDecorators: true\n",
    )
    .unwrap();

    let output = run_grommet(&["capabilities", "--config", config.to_str().unwrap()]);
    assert!(output.status.success());

    let capabilities = decode(String::from_utf8(output.stdout).unwrap().trim());
    assert!(capabilities["window"].is_null());
    assert_eq!(
        capabilities["experimental"]["colorDecorators"].as_bool(),
        Some(true)
    );
}

#[test]
fn bad_config_file_fails_with_its_path() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("missing.yaml");

    let output = run_grommet(&["capabilities", "--config", config.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("missing.yaml"));
}

#[test]
fn missing_server_fails_to_start() {
    let output = run_grommet(&["probe", "--timeout-ms", "500", "/nonexistent/grommet-test-server"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to start"));
}

#[cfg(unix)]
#[test]
fn scripted_server_report_lists_capabilities() {
    const SCRIPT: &str = r#"#!/bin/sh
init='{"jsonrpc": "2.0", "id": 1, "result": {"capabilities": {"hoverProvider": true, "renameProvider": false}, "serverInfo": {"name": "script-ls", "version": "0.2"}}}'
printf 'Content-Length: %d\r\n\r\n%s' "${#init}" "$init"
sleep 1
done='{"jsonrpc": "2.0", "id": 2, "result": null}'
printf 'Content-Length: %d\r\n\r\n%s' "${#done}" "$done"
cat > /dev/null
"#;
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("server.sh");
    std::fs::write(&script, SCRIPT).unwrap();

    let output = run_grommet(&["probe", "--timeout-ms", "10000", "sh", script.to_str().unwrap()]);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success(), "probe failed: {stdout}");
    assert!(stdout.contains("Server:  script-ls"));
    assert!(stdout.contains("Version: 0.2"));
    assert!(stdout.contains("+ hoverProvider"));
    assert!(stdout.contains("- renameProvider"));
}
