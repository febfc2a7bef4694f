#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn unique_temp_path(tag: &str) -> PathBuf {
    PathBuf::from(format!(
        "/tmp/sidechan-{tag}-{}-{}.log",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

/// Run the CLI with `input` written to stdin in a single write.
fn run_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sidechan"))
        .args(["--log-level", "error"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("sidechan should start");

    {
        let mut stdin = child.stdin.take().expect("stdin should be piped");
        stdin.write_all(input).expect("stdin write should succeed");
    }

    child.wait_with_output().expect("sidechan should exit")
}

#[test]
fn demux_forwards_crash_text_and_fails() {
    let output = run_with_stdin(
        &["demux", "--quiet-window", "20ms"],
        b"TypeError: undefined is not a function\n",
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "TypeError: undefined is not a function\n"
    );
}

#[test]
fn demux_log_then_end_succeeds_silently() {
    let output = run_with_stdin(
        &["demux"],
        b"{\"type\":\"log\",\"payload\":{\"entry\":\"warming up\"}}\n{\"type\":\"end\",\"payload\":{}}\n",
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn demux_missing_module_writes_error_text() {
    let output = run_with_stdin(
        &["demux"],
        b"{\"type\":\"error\",\"payload\":{\"error\":\"Cannot find module 'left-pad'\",\"code\":\"MODULE_NOT_FOUND\"}}\n",
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Cannot find module 'left-pad'"
    );
}

#[test]
fn demux_startup_failure_keeps_structured_lines_only() {
    let output = run_with_stdin(
        &["demux", "--quiet-window", "20ms"],
        b"\nmodule.js:333\n    throw err;\n{\"type\":\"error\",\"payload\":{\"error\":\"boot failed\"}}\n",
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "boot failed");
}

#[test]
fn demux_reads_capture_file() {
    let path = unique_temp_path("demux");
    std::fs::write(&path, "{\"type\":\"end\",\"payload\":{}}\n").expect("capture should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_sidechan"))
        .args(["--log-level", "error", "demux"])
        .arg(&path)
        .output()
        .expect("demux should run");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn demux_missing_file_returns_66() {
    let output = Command::new(env!("CARGO_BIN_EXE_sidechan"))
        .args(["--log-level", "error", "demux", "/nonexistent/sidechan/stderr.log"])
        .output()
        .expect("demux should run");

    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn inspect_json_classifies_messages() {
    let output = run_with_stdin(
        &["--format", "json", "inspect"],
        b"{\"type\":\"log\",\"payload\":{\"entry\":1}}\nnot json\n{\"type\":\"writeHead\",\"payload\":{}}\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("inspect emits json lines"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "log");
    assert_eq!(lines[1]["kind"], "unknown");
    assert_eq!(lines[1]["type"], "writeHead");
}

#[test]
fn inspect_wraps_plain_text() {
    let output = run_with_stdin(&["--format", "json", "inspect", "-"], b"segfault\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let message: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("inspect emits one json line");
    assert_eq!(message["kind"], "error");
    assert_eq!(message["error_text"], "segfault\n");
}

#[test]
fn emit_writes_wire_records() {
    let output = Command::new(env!("CARGO_BIN_EXE_sidechan"))
        .args(["emit", "error", "Cannot find module 'x'", "--code", "MODULE_NOT_FOUND"])
        .output()
        .expect("emit should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.ends_with('\n'));
    let record: serde_json::Value =
        serde_json::from_str(stdout.trim_end()).expect("emit writes one json line");
    assert_eq!(record["type"], "error");
    assert_eq!(record["payload"]["code"], "MODULE_NOT_FOUND");
}

#[test]
fn emit_output_round_trips_through_demux() {
    let emitted = Command::new(env!("CARGO_BIN_EXE_sidechan"))
        .args(["emit", "log", "{\"level\":\"info\"}"])
        .output()
        .expect("emit should run");
    assert!(emitted.status.success());

    let output = run_with_stdin(&["demux"], &emitted.stdout);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn version_extended_reports_defaults() {
    let output = Command::new(env!("CARGO_BIN_EXE_sidechan"))
        .args(["version", "--extended"])
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("quiet_window_ms: 200"));
    assert!(stdout.contains("fatal_codes: MODULE_NOT_FOUND"));
}
