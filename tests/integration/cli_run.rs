//! CLI behavior: verdict lines, exit codes, record mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use guestbox_rs::sandbox::{FixtureSpec, FsNodeSpec, FsSpec};
use guestbox_rs::{BytesSpec, TraceSpec};

fn shipped_fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn run_cli(args: &[&str]) -> Output {
    let binary = env!("CARGO_BIN_EXE_guestbox-rs");
    Command::new(binary)
        .args(args)
        .output()
        .expect("run guestbox-rs")
}

fn fixtures_flag(dir: &Path) -> String {
    format!("--fixtures={}", dir.display())
}

#[test]
fn shipped_suite_passes_end_to_end() {
    let flag = fixtures_flag(&shipped_fixtures());
    let output = run_cli(&[&flag, "run"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "suite failed: stdout={stdout} stderr={stderr}"
    );
    assert!(stdout.contains("echo ... ok"), "missing verdict line: {stdout}");
    assert!(stdout.contains("mkdir-nested ... ok"), "missing verdict line: {stdout}");
    assert!(stderr.contains("failed=0"), "unexpected stats: {stderr}");
}

#[test]
fn divergent_fixture_fails_with_a_byte_offset() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let mut spec = FixtureSpec::inline("echo");
    spec.stdin = vec![BytesSpec::Text("ping\n".to_string())];
    spec.expected = Some(TraceSpec {
        chunks: vec![BytesSpec::Text("pong\n".to_string())],
        exit_code: 0,
    });
    spec.save(&tmp.path().join("drift.json")).expect("write fixture");

    let flag = fixtures_flag(tmp.path());
    let output = run_cli(&[&flag, "run"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("drift ... diverged at byte 1"),
        "unexpected verdict: {stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed=1"), "unexpected stats: {stderr}");
}

#[test]
fn record_mode_fills_and_stabilizes_the_expected_trace() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("read.json");
    let mut spec = FixtureSpec::inline("read");
    spec.fs = FsSpec {
        nodes: vec![FsNodeSpec::File {
            path: "/test.txt".to_string(),
            contents: vec![BytesSpec::Text("abc".to_string())],
        }],
    };
    spec.save(&path).expect("write fixture");

    let flag = fixtures_flag(tmp.path());

    // Unrecorded fixtures cannot run.
    let output = run_cli(&[&flag, "run"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(&[&flag, "record"]);
    assert!(
        output.status.success(),
        "record failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let first = fs::read(&path).expect("read recorded fixture");
    let recorded = FixtureSpec::load(&path).expect("reload fixture");
    let expected = recorded.expected.expect("expected trace recorded");
    assert_eq!(expected.flatten().unwrap(), b"abc");
    assert_eq!(expected.exit_code, 0);

    // Recording again must be byte-stable.
    let output = run_cli(&[&flag, "record"]);
    assert!(output.status.success());
    let second = fs::read(&path).expect("read re-recorded fixture");
    assert_eq!(first, second);

    // And the recorded suite passes.
    let output = run_cli(&[&flag, "run"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn unknown_guest_is_a_configuration_error() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let mut spec = FixtureSpec::inline("echo");
    spec.guest = "no-such-guest".to_string();
    spec.expected = Some(TraceSpec {
        chunks: Vec::new(),
        exit_code: 0,
    });
    spec.save(&tmp.path().join("bogus.json")).expect("write fixture");

    let flag = fixtures_flag(tmp.path());
    let output = run_cli(&[&flag, "run"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown guest"), "unexpected error: {stderr}");
}

#[test]
fn usage_errors_exit_two() {
    let output = run_cli(&["--bogus-flag", "run"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn list_names_every_registered_guest() {
    let output = run_cli(&["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["args", "clock", "dir-logged", "echo-head", "mkdir-nested", "read"] {
        assert!(stdout.contains(name), "missing guest {name}: {stdout}");
    }
}

#[test]
fn debug_flag_logs_intercepted_calls_to_stderr() {
    let flag = fixtures_flag(&shipped_fixtures());
    let output = run_cli(&[&flag, "--debug", "run", "clock"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[sys] clock_read"),
        "missing call log: {stderr}"
    );
}
